//! Spor - a tool-using chat assistant
//!
//! A language model drives a small agent loop and may call tools to answer
//! the user.
//!
//! The name "Spor" comes from the Norwegian word "spør," meaning "ask."
//!
//! # Overview
//!
//! Spor lets you:
//! - Chat with configurable agent profiles
//! - Look up the current weather for any place
//! - Search the web, with complex questions split into several planned queries
//! - Have the assistant ask for confirmation before it acts
//! - Stream agent state to frontends over HTTP
//!
//! # Architecture
//!
//! - `config` - Configuration, profiles and prompt templates
//! - `llm` - Chat model abstraction over the OpenAI API
//! - `clients` - Geocoding, weather and web search clients
//! - `search` - Search planning, execution and synthesis
//! - `tools` - Tools offered to the model
//! - `agent` - Conversation state and the respond/execute loop
//! - `orchestrator` - Assembly of the assistant from configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use spor::agent::{StateEmitter, TurnRequest};
//! use spor::config::Settings;
//! use spor::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let conversation = orchestrator.new_conversation(None)?;
//!     let output = orchestrator
//!         .run_turn(
//!             conversation,
//!             TurnRequest::user("What's the weather in Oslo?"),
//!             &StateEmitter::disabled(),
//!         )
//!         .await?;
//!     println!("{}", output.reply().unwrap_or_default());
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod search;
pub mod tools;

#[cfg(test)]
mod testing;

pub use error::{Result, SporError};
