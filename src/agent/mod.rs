//! Tool-using chat agent.
//!
//! A turn alternates between asking the model for the next message and
//! executing the tools it requests, until the model answers in plain text,
//! asks the user for confirmation, or hands an action back to the caller.

mod events;
mod runner;
mod state;
mod tools;

pub use events::{AgentEvent, StateEmitter, StateUpdate};
pub use runner::{
    route, ActionResult, ChatAgent, Route, RoutingPolicy, StopReason, ToolCallRecord, TurnOutput,
    TurnRequest,
};
pub use state::{Confirmation, ConfirmationAnswer, Conversation, SessionState, TurnState};
pub use tools::{parse_arguments, Tool, ToolContext, ToolRegistry};
