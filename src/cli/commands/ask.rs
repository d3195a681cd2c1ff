//! Ask command implementation.

use super::chat::converse;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    profile: Option<String>,
    model: Option<String>,
    mut settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Chat, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'spor doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.model.chat_model = model;
    }

    let orchestrator = Orchestrator::new(settings)?;
    let conversation = orchestrator.new_conversation(profile.as_deref())?;

    let conversation = converse(&orchestrator, conversation, question).await?;

    if let Some(weather) = &conversation.session.weather {
        Output::header("Weather");
        Output::kv("Conditions", weather.describe());
        Output::kv("Temperature", &format!("{:.1} °C", weather.temperature));
        Output::kv("Humidity", &format!("{:.0} %", weather.humidity));
    }

    if !conversation.session.search_plan.is_empty() {
        Output::header("Searches");
        for query in &conversation.session.search_plan {
            Output::list_item(query);
        }
    }

    Ok(())
}
