//! Sequential execution of search plans.

use super::{format_results, limit_words, QueryOutcome, SearchBundle};
use crate::clients::{SearchBackend, SearchHit};
use crate::config::Prompts;
use crate::error::Result;
use crate::llm::{complete_text, ChatModel};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Runs planned queries one by one and condenses the results.
#[derive(Clone)]
pub struct SearchExecutor {
    backend: Arc<dyn SearchBackend>,
    model: Arc<dyn ChatModel>,
    prompts: Arc<Prompts>,
    single_max_results: usize,
    plan_max_results: usize,
    pacing: Duration,
    synthesis_temperature: f32,
    summary_max_words: usize,
}

impl SearchExecutor {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        model: Arc<dyn ChatModel>,
        prompts: Arc<Prompts>,
    ) -> Self {
        Self {
            backend,
            model,
            prompts,
            single_max_results: 5,
            plan_max_results: 3,
            pacing: Duration::from_millis(500),
            synthesis_temperature: 0.3,
            summary_max_words: 500,
        }
    }

    /// Result counts for single-query searches and for each planned query.
    pub fn with_max_results(mut self, single: usize, per_planned_query: usize) -> Self {
        self.single_max_results = single;
        self.plan_max_results = per_planned_query;
        self
    }

    /// Pause inserted between consecutive planned searches.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_synthesis(mut self, temperature: f32, max_words: usize) -> Self {
        self.synthesis_temperature = temperature;
        self.summary_max_words = max_words;
        self
    }

    /// Run a single query.
    #[instrument(skip(self))]
    pub async fn search_single(&self, query: &str) -> Result<Vec<SearchHit>> {
        self.backend.search(query, self.single_max_results).await
    }

    /// Run every planned query in order, then synthesize a summary.
    ///
    /// A failed query is recorded as an error entry and does not stop the
    /// remaining queries. `progress` receives a notice before and after each
    /// search.
    pub async fn execute<F>(&self, plan: &[String], mut progress: F) -> SearchBundle
    where
        F: FnMut(String),
    {
        let total = plan.len();
        let mut results = BTreeMap::new();

        for (i, query) in plan.iter().enumerate() {
            let n = i + 1;
            if i > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }

            progress(format!("Executing search {}/{}: {}", n, total, query));
            match self.backend.search(query, self.plan_max_results).await {
                Ok(hits) => {
                    progress(format!("✓ Completed search {}: Found {} results", n, hits.len()));
                    results.insert(query.clone(), QueryOutcome::Hits(hits));
                }
                Err(e) => {
                    warn!("Search '{}' failed: {}", query, e);
                    progress(format!("✗ Error in search {}: {}", n, e));
                    results.insert(
                        query.clone(),
                        QueryOutcome::Failed {
                            error: e.to_string(),
                        },
                    );
                }
            }
        }

        progress("Synthesizing results from all searches...".to_string());
        let synthesized_summary = self.synthesize(plan, &results).await;
        progress("✓ Search plan completed successfully".to_string());

        info!(
            "Executed {} searches ({} failed)",
            total,
            results.values().filter(|r| r.is_error()).count()
        );

        SearchBundle {
            individual_results: results,
            synthesized_summary,
            search_plan: plan.to_vec(),
            total_searches: total,
        }
    }

    /// Condense per-query results into one summary. Failure yields an
    /// explanatory text instead of an error.
    pub async fn synthesize(&self, plan: &[String], results: &BTreeMap<String, QueryOutcome>) -> String {
        let mut vars = HashMap::new();
        vars.insert("results".to_string(), format_results(plan, results));
        vars.insert("max_words".to_string(), self.summary_max_words.to_string());
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.search.synthesis, &vars);

        match complete_text(self.model.as_ref(), &prompt, self.synthesis_temperature).await {
            Ok(summary) => limit_words(&summary, self.summary_max_words),
            Err(e) => {
                warn!("Synthesis failed: {}", e);
                format!(
                    "Error synthesizing results: {}\n\nRaw results available in individual search results.",
                    e
                )
            }
        }
    }
}
