//! Human-in-the-loop confirmation.

use crate::agent::{parse_arguments, StateUpdate, Tool, ToolContext};
use crate::error::Result;
use crate::llm::ToolSpec;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

pub const NAME: &str = "ask_user_confirmation";

#[derive(Debug, Deserialize)]
struct ConfirmationArgs {
    message: String,
    #[serde(default)]
    context: Option<String>,
}

/// Asks the user a yes/no question and ends the turn until it is answered.
pub struct ConfirmationTool;

#[async_trait]
impl Tool for ConfirmationTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: NAME.to_string(),
            description: "Ask the user to confirm before doing something irreversible or ambiguous. \
                The conversation pauses until the user answers."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "message": {
                        "type": "string",
                        "description": "The question to show the user"
                    },
                    "context": {
                        "type": "string",
                        "description": "Optional details about what will happen"
                    }
                },
                "required": ["message"]
            }),
        }
    }

    async fn call(&self, ctx: &mut ToolContext<'_>, arguments: serde_json::Value) -> Result<String> {
        let args: ConfirmationArgs = parse_arguments(NAME, arguments)?;
        info!("Requesting user confirmation: {}", args.message);

        ctx.confirmation.request(args.message, args.context);
        ctx.emitter.emit(StateUpdate::confirmation(ctx.confirmation));

        Ok(json!({
            "status": "waiting_for_response",
            "message": ctx.confirmation.message().unwrap_or_default(),
            "context": ctx.confirmation.context().unwrap_or_default(),
        })
        .to_string())
    }
}
