//! Interactive chat command.

use crate::agent::{AgentEvent, Conversation, StateEmitter, StopReason, TurnOutput, TurnRequest};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Run the interactive chat command.
pub async fn run_chat(profile: Option<String>, model: Option<String>, mut settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Chat, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'spor doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.model.chat_model = model;
    }

    let orchestrator = Orchestrator::new(settings)?;
    let mut conversation = orchestrator.new_conversation(profile.as_deref())?;

    println!(
        "\n{}",
        style(format!("Spor Chat with {}", conversation.session.agent_name))
            .bold()
            .cyan()
    );
    println!(
        "{}\n",
        style("Type your questions, or 'exit' to quit. Use 'clear' to reset conversation.").dim()
    );

    loop {
        let input = prompt(&format!("{}", style("You:").green().bold()))?;

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            conversation = orchestrator.new_conversation(profile.as_deref())?;
            Output::info("Conversation history cleared.");
            continue;
        }

        match converse(&orchestrator, conversation.clone(), &input).await {
            Ok(updated) => conversation = updated,
            Err(e) => Output::error(&format!("Error: {}", e)),
        }
    }

    Ok(())
}

/// Send one user message and keep going through any confirmation questions.
///
/// Returns the updated conversation once the assistant has answered.
pub(super) async fn converse(
    orchestrator: &Orchestrator,
    conversation: Conversation,
    input: &str,
) -> Result<Conversation> {
    let profile_icon = orchestrator
        .settings()
        .profiles
        .values()
        .find(|p| p.agent_name == conversation.session.agent_name)
        .map(|p| p.icon.clone())
        .unwrap_or_default();

    let mut output = run_with_spinner(orchestrator, conversation, TurnRequest::user(input)).await?;

    loop {
        for call in &output.tool_calls {
            debug!("{} -> {}", call, call.result);
        }

        match &output.stop {
            StopReason::FinalAnswer => {
                let reply = output.reply().unwrap_or_default();
                Output::reply(&profile_icon, &output.conversation.session.agent_name, reply);
                return Ok(output.conversation);
            }
            StopReason::AwaitingConfirmation => {
                let confirmation = &output.conversation.confirmation;
                Output::confirmation(
                    confirmation.message().unwrap_or_default(),
                    confirmation.context(),
                );
                let answer = prompt(&format!("{}", style("[yes/no]:").yellow().bold()))?;
                output = run_with_spinner(
                    orchestrator,
                    output.conversation,
                    TurnRequest::confirmation(answer),
                )
                .await?;
            }
            StopReason::CallerAction { name } => {
                Output::warning(&format!("The assistant requested '{}', which the CLI cannot perform.", name));
                return Ok(output.conversation);
            }
        }
    }
}

/// Run a turn while showing the latest progress notice in a spinner.
async fn run_with_spinner(
    orchestrator: &Orchestrator,
    conversation: Conversation,
    request: TurnRequest,
) -> Result<TurnOutput> {
    let spinner = Output::spinner("Thinking...");
    let (emitter, mut rx) = StateEmitter::channel();

    let progress = spinner.clone();
    let forward = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let AgentEvent::State(update) = event {
                if let Some(step) = update.observed_steps.as_ref().and_then(|s| s.last()) {
                    progress.set_message(step.clone());
                }
            }
        }
    });

    let result = orchestrator.run_turn(conversation, request, &emitter).await;
    drop(emitter);
    let _ = forward.await;
    spinner.finish_and_clear();

    Ok(result?)
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{} ", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
