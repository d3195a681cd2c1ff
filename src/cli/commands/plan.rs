//! Plan command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Show how a query would be split into searches.
pub async fn run_plan(query: &str, settings: Settings) -> Result<()> {
    preflight::check(Operation::Chat, &settings)?;

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Planning searches...");
    let plan = orchestrator.planner().plan(query).await;
    spinner.finish_and_clear();

    Output::info(&plan.describe());
    for (i, q) in plan.queries.iter().enumerate() {
        println!("  {}. {}", i + 1, q);
    }

    Ok(())
}
