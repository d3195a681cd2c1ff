//! Query decomposition.

use crate::config::Prompts;
use crate::llm::{complete_text, ChatModel};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Upper bound on planned sub-queries, whatever the configuration asks for.
pub const MAX_PLANNED_QUERIES: usize = 5;

/// Where a plan came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    /// The model returned a JSON array.
    Json,
    /// The model's reply was parsed line by line.
    Text,
    /// The reply was unusable; the original query is searched as is.
    Original,
    /// The model call failed.
    Failed { error: String },
}

/// Ordered sub-queries for one web search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPlan {
    pub queries: Vec<String>,
    pub source: PlanSource,
}

impl SearchPlan {
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Progress notice describing how the plan was made.
    pub fn describe(&self) -> String {
        match &self.source {
            PlanSource::Json => format!("Created search plan with {} queries", self.len()),
            PlanSource::Text => {
                format!("Created search plan with {} queries (text parsed)", self.len())
            }
            PlanSource::Original => "Using original query as single search".to_string(),
            PlanSource::Failed { error } => {
                format!("Planning failed, using original query: {}", error)
            }
        }
    }
}

/// Breaks a query into focused search queries using a language model.
#[derive(Clone)]
pub struct SearchPlanner {
    model: Arc<dyn ChatModel>,
    prompts: Arc<Prompts>,
    temperature: f32,
    max_queries: usize,
    list_marker: Regex,
}

impl SearchPlanner {
    pub fn new(model: Arc<dyn ChatModel>, prompts: Arc<Prompts>) -> Self {
        Self {
            model,
            prompts,
            temperature: 0.0,
            max_queries: MAX_PLANNED_QUERIES,
            list_marker: Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s+").expect("Invalid regex"),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Cap the number of planned queries, between one and [`MAX_PLANNED_QUERIES`].
    pub fn with_max_queries(mut self, max_queries: usize) -> Self {
        if max_queries > MAX_PLANNED_QUERIES {
            warn!(
                "search.max_queries = {} exceeds the limit, using {}",
                max_queries, MAX_PLANNED_QUERIES
            );
        }
        self.max_queries = max_queries.clamp(1, MAX_PLANNED_QUERIES);
        self
    }

    /// Plan searches for a query. Never fails and never returns an empty plan.
    #[instrument(skip(self))]
    pub async fn plan(&self, query: &str) -> SearchPlan {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), query.to_string());
        vars.insert("max_queries".to_string(), self.max_queries.to_string());
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.search.planner, &vars);

        match complete_text(self.model.as_ref(), &prompt, self.temperature).await {
            Ok(reply) => {
                let plan = self.parse(&reply, query);
                debug!("Search plan ({:?}): {:?}", plan.source, plan.queries);
                plan
            }
            Err(e) => {
                warn!("Search planning failed: {}", e);
                SearchPlan {
                    queries: vec![query.to_string()],
                    source: PlanSource::Failed {
                        error: e.to_string(),
                    },
                }
            }
        }
    }

    /// Turn a planner reply into a plan, falling back to the original query.
    pub fn parse(&self, reply: &str, query: &str) -> SearchPlan {
        let content = strip_code_fence(reply.trim());

        let (queries, source) = match serde_json::from_str::<serde_json::Value>(content) {
            Ok(serde_json::Value::Array(items)) => {
                let queries = items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(|s| s.trim().to_string())
                    .collect();
                (queries, PlanSource::Json)
            }
            Ok(_) => (Vec::new(), PlanSource::Original),
            Err(_) => (self.parse_lines(content), PlanSource::Text),
        };

        let queries = self.finish(queries);
        if queries.is_empty() {
            SearchPlan {
                queries: vec![query.to_string()],
                source: PlanSource::Original,
            }
        } else {
            SearchPlan { queries, source }
        }
    }

    fn parse_lines(&self, content: &str) -> Vec<String> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("//"))
            .map(|line| {
                let line = self.list_marker.replace(line, "");
                line.trim_matches(|c: char| matches!(c, '[' | ']' | '"' | '\'' | ',') || c.is_whitespace())
                    .to_string()
            })
            .collect()
    }

    /// Drop blanks and repeats, then cap the plan length.
    fn finish(&self, queries: Vec<String>) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        queries
            .into_iter()
            .filter(|q| !q.is_empty() && seen.insert(q.clone()))
            .take(self.max_queries)
            .collect()
    }
}

/// Remove a surrounding Markdown code fence, if present.
fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    // Skip an info string such as `json`.
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
