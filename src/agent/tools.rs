//! Tool abstraction and registry for the agent system.

use super::events::{StateEmitter, StateUpdate};
use super::state::{Confirmation, SessionState, TurnState};
use crate::error::{Result, SporError};
use crate::llm::{ToolCall, ToolSpec};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::warn;

/// A capability the model can invoke by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and argument schema offered to the model.
    fn spec(&self) -> ToolSpec;

    /// Run the tool. The returned text becomes the tool result message.
    async fn call(&self, ctx: &mut ToolContext<'_>, arguments: serde_json::Value) -> Result<String>;
}

/// What a tool may see and change while it runs.
pub struct ToolContext<'a> {
    pub call_id: &'a str,
    pub session: &'a mut SessionState,
    pub confirmation: &'a mut Confirmation,
    pub turn: &'a mut TurnState,
    pub emitter: &'a StateEmitter,
    /// Index into the turn's step log where the current operation began.
    step_start: usize,
}

impl<'a> ToolContext<'a> {
    pub fn new(
        call_id: &'a str,
        session: &'a mut SessionState,
        confirmation: &'a mut Confirmation,
        turn: &'a mut TurnState,
        emitter: &'a StateEmitter,
    ) -> Self {
        let step_start = turn.observed_steps.len();
        Self {
            call_id,
            session,
            confirmation,
            turn,
            emitter,
            step_start,
        }
    }

    /// Append a progress notice to the turn log and stream the steps of the
    /// current operation.
    pub fn observe(&mut self, step: impl Into<String>) {
        self.turn.observed_steps.push(step.into());
        self.emitter
            .emit(StateUpdate::steps(&self.turn.observed_steps[self.step_start..]));
    }

    /// Start a fresh streamed step list for a new operation. The turn log
    /// keeps everything observed so far.
    pub fn reset_steps(&mut self) {
        self.step_start = self.turn.observed_steps.len();
    }

    /// Steps observed since the current operation began.
    pub fn current_steps(&self) -> &[String] {
        &self.turn.observed_steps[self.step_start..]
    }
}

/// Decode a tool's typed arguments.
pub fn parse_arguments<T: DeserializeOwned>(tool: &str, arguments: serde_json::Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|e| SporError::InvalidArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

/// Registry mapping tool names to handlers.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.spec().name;
        if let Some(pos) = self.tools.iter().position(|t| t.spec().name == name) {
            warn!("Replacing already registered tool '{}'", name);
            self.tools[pos] = tool;
        } else {
            self.tools.push(tool);
        }
    }

    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Tool>> {
        self.tools
            .iter()
            .find(|t| t.spec().name == name)
            .cloned()
            .ok_or_else(|| SporError::UnknownTool(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.spec().name == name)
    }

    /// Definitions of all registered tools, in registration order.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Resolve and run a model-issued tool call.
    pub async fn invoke(&self, call: &ToolCall, ctx: &mut ToolContext<'_>) -> Result<String> {
        let tool = self.get(&call.name)?;

        let arguments = if call.arguments.trim().is_empty() {
            serde_json::Value::Object(Default::default())
        } else {
            serde_json::from_str(&call.arguments).map_err(|e| SporError::InvalidArguments {
                tool: call.name.clone(),
                reason: e.to_string(),
            })?
        };

        tool.call(ctx, arguments).await
    }
}
