//! Planned web search.

use crate::agent::{parse_arguments, StateUpdate, Tool, ToolContext};
use crate::error::Result;
use crate::llm::ToolSpec;
use crate::search::{QueryOutcome, SearchExecutor, SearchPlanner};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{info, warn};

pub const NAME: &str = "web_search";

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

/// Plans a search, runs it and returns raw hits or a synthesized bundle.
pub struct WebSearchTool {
    planner: SearchPlanner,
    executor: SearchExecutor,
}

impl WebSearchTool {
    pub fn new(planner: SearchPlanner, executor: SearchExecutor) -> Self {
        Self { planner, executor }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: NAME.to_string(),
            description: "Search the web for current information. Handles both simple and complex \
                queries; complex ones (comparisons, time series) are split into several focused \
                searches whose results are summarized."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, ctx: &mut ToolContext<'_>, arguments: serde_json::Value) -> Result<String> {
        let args: SearchArgs = parse_arguments(NAME, arguments)?;
        let query = args.query;

        ctx.reset_steps();
        ctx.observe("Analyzing search query...");

        let plan = self.planner.plan(&query).await;
        ctx.session.search_plan = plan.queries.clone();
        ctx.session.search_results.clear();
        ctx.emitter.emit(StateUpdate::plan(&plan.queries));
        ctx.observe(plan.describe());

        if plan.len() == 1 {
            ctx.observe("Executing single web search...");
            let hits = match self.executor.search_single(&query).await {
                Ok(hits) => hits,
                Err(e) => {
                    warn!("Web search failed: {}", e);
                    ctx.observe(format!("✗ Error searching the web: {}", e));
                    return Err(e);
                }
            };
            ctx.observe("✓ Web search completed");

            let payload = serde_json::to_string(&hits)?;
            ctx.session.search_results =
                BTreeMap::from([(query, QueryOutcome::Hits(hits))]);
            return Ok(payload);
        }

        info!("Executing multi-search plan with {} queries", plan.len());
        ctx.observe(format!(
            "Executing multi-search plan with {} queries...",
            plan.len()
        ));

        let bundle = self
            .executor
            .execute(&plan.queries, |step| ctx.observe(step))
            .await;

        ctx.session.search_results = bundle.individual_results.clone();
        Ok(serde_json::to_string(&bundle)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Confirmation, SessionState, StateEmitter, TurnState};
    use crate::config::Prompts;
    use crate::llm::Completion;
    use crate::search::SearchBundle;
    use crate::testing::{FakeSearch, ScriptedModel};
    use std::sync::Arc;
    use std::time::Duration;

    fn reply(text: &str) -> Completion {
        Completion {
            content: Some(text.to_string()),
            tool_calls: vec![],
        }
    }

    fn tool(model: &Arc<ScriptedModel>, backend: &Arc<FakeSearch>) -> WebSearchTool {
        let prompts = Arc::new(Prompts::default());
        WebSearchTool::new(
            SearchPlanner::new(model.clone(), prompts.clone()),
            SearchExecutor::new(backend.clone(), model.clone(), prompts).with_pacing(Duration::ZERO),
        )
    }

    async fn run(tool: &WebSearchTool, session: &mut SessionState, query: &str) -> Result<String> {
        let mut confirmation = Confirmation::Idle;
        let mut turn = TurnState::default();
        let emitter = StateEmitter::disabled();
        let mut ctx = ToolContext::new(
            "s1",
            session,
            &mut confirmation,
            &mut turn,
            &emitter,
        );
        tool.call(&mut ctx, json!({ "query": query })).await
    }

    #[tokio::test]
    async fn test_single_query_plan_makes_one_call() {
        let model = Arc::new(ScriptedModel::new(vec![reply(r#"["current weather New York"]"#)]));
        let backend = Arc::new(FakeSearch::new());
        let mut session = SessionState::default();

        let output = run(&tool(&model, &backend), &mut session, "weather in New York")
            .await
            .unwrap();

        assert_eq!(backend.queries(), vec!["weather in New York"]);
        assert_eq!(backend.max_results_seen(), vec![5]);
        // Planner only; no synthesis.
        assert_eq!(model.requests().len(), 1);
        assert!(output.starts_with('['));
        assert_eq!(session.search_plan, vec!["current weather New York"]);
        assert!(session.search_results.contains_key("weather in New York"));
    }

    #[tokio::test]
    async fn test_comparison_query_runs_plan_and_synthesizes() {
        let model = Arc::new(ScriptedModel::new(vec![
            reply(r#"["Tesla stock performance 2024", "Ford stock performance 2024", "Tesla vs Ford stock comparison"]"#),
            reply("Tesla rose while Ford was flat."),
        ]));
        let backend = Arc::new(FakeSearch::new());
        let mut session = SessionState::default();

        let output = run(
            &tool(&model, &backend),
            &mut session,
            "compare Tesla and Ford stock performance",
        )
        .await
        .unwrap();

        let bundle: SearchBundle = serde_json::from_str(&output).unwrap();
        assert!(bundle.total_searches >= 2);
        assert_eq!(backend.queries().len(), bundle.total_searches);
        assert_eq!(model.requests().len(), 2);
        for query in &bundle.search_plan {
            assert!(bundle.individual_results.contains_key(query));
        }
        assert!(bundle.synthesized_summary.split_whitespace().count() <= 500);
        assert_eq!(session.search_plan, bundle.search_plan);
        assert_eq!(session.search_results.len(), 3);
    }

    #[tokio::test]
    async fn test_single_search_failure_is_an_error() {
        let model = Arc::new(ScriptedModel::new(vec![reply(r#"["flaky"]"#)]));
        let backend = Arc::new(FakeSearch::new().failing_on("flaky"));
        let mut session = SessionState::default();

        let result = run(&tool(&model, &backend), &mut session, "flaky").await;
        assert!(result.is_err());
        assert!(session.search_results.is_empty());
    }

    #[tokio::test]
    async fn test_failed_search_does_not_keep_previous_results() {
        let model = Arc::new(ScriptedModel::new(vec![
            reply(r#"["rust release notes"]"#),
            reply(r#"["flaky"]"#),
        ]));
        let backend = Arc::new(FakeSearch::new().failing_on("flaky"));
        let tool = tool(&model, &backend);
        let mut session = SessionState::default();

        run(&tool, &mut session, "rust release notes").await.unwrap();
        assert!(session.search_results.contains_key("rust release notes"));

        assert!(run(&tool, &mut session, "flaky").await.is_err());
        assert_eq!(session.search_plan, vec!["flaky"]);
        assert!(session.search_results.is_empty());
    }
}
