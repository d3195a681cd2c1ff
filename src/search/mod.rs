//! Planned web search.
//!
//! A query is first decomposed into focused sub-queries by the
//! [`SearchPlanner`]. A single-query plan is answered with one search call;
//! longer plans are run one after another by the [`SearchExecutor`] and
//! condensed into a single summary.

mod executor;
mod planner;

pub use executor::SearchExecutor;
pub use planner::{PlanSource, SearchPlan, SearchPlanner, MAX_PLANNED_QUERIES};

use crate::clients::SearchHit;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Characters of result content passed on to the synthesis model.
const CONTENT_PREVIEW_CHARS: usize = 500;

/// Result of one planned sub-query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    Hits(Vec<SearchHit>),
    Failed { error: String },
}

impl QueryOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, QueryOutcome::Failed { .. })
    }
}

/// Output of a multi-query search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchBundle {
    pub individual_results: BTreeMap<String, QueryOutcome>,
    pub synthesized_summary: String,
    pub search_plan: Vec<String>,
    pub total_searches: usize,
}

/// Truncate text to at most `max_words` words, marking the cut with an ellipsis.
pub fn limit_words(text: &str, max_words: usize) -> String {
    if max_words == 0 {
        return String::new();
    }

    let mut in_word = false;
    let mut words = 0;
    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            in_word = false;
        } else if !in_word {
            in_word = true;
            words += 1;
            if words > max_words {
                return format!("{}…", text[..idx].trim_end());
            }
        }
    }

    text.to_string()
}

/// Render the results of a plan as plain text for the synthesis prompt.
pub fn format_results(plan: &[String], results: &BTreeMap<String, QueryOutcome>) -> String {
    let mut text = String::new();

    for query in plan {
        let Some(outcome) = results.get(query) else {
            continue;
        };

        text.push_str(&format!("\n\nSearch Query: {}\n", query));
        match outcome {
            QueryOutcome::Hits(hits) => {
                for hit in hits {
                    let preview: String = hit.content.chars().take(CONTENT_PREVIEW_CHARS).collect();
                    text.push_str(&format!(
                        "Title: {}\nContent: {}...\nURL: {}\n\n",
                        hit.title, preview, hit.url
                    ));
                }
            }
            QueryOutcome::Failed { error } => {
                text.push_str(&format!("Error: {}\n", error));
            }
        }
    }

    text
}
