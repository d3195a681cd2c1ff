//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::search::QueryOutcome;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, json: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'spor doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let executor = orchestrator.executor()?;

    let spinner = Output::spinner("Analyzing search query...");
    let plan = orchestrator.planner().plan(query).await;
    spinner.set_message(plan.describe());

    if plan.len() == 1 {
        let hits = executor.search_single(query).await;
        spinner.finish_and_clear();
        let hits = hits?;

        if json {
            println!("{}", serde_json::to_string_pretty(&hits)?);
            return Ok(());
        }

        if hits.is_empty() {
            Output::warning("No results found.");
        }
        for hit in &hits {
            Output::search_hit(hit);
        }
        return Ok(());
    }

    let progress = spinner.clone();
    let bundle = executor
        .execute(&plan.queries, |step| progress.set_message(step))
        .await;
    spinner.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&bundle)?);
        return Ok(());
    }

    Output::header("Summary");
    println!("{}", bundle.synthesized_summary);

    for query in &bundle.search_plan {
        Output::header(query);
        match bundle.individual_results.get(query) {
            Some(QueryOutcome::Hits(hits)) => {
                for hit in hits {
                    Output::search_hit(hit);
                }
            }
            Some(QueryOutcome::Failed { error }) => Output::error(error),
            None => {}
        }
    }

    Ok(())
}
