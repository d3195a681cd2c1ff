//! Pre-flight checks before talking to external services.
//!
//! Validates that required credentials are available before starting
//! operations that would otherwise fail on the first request.

use crate::config::Settings;
use crate::error::{Result, SporError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Chatting requires the OpenAI key.
    Chat,
    /// Web search requires both the OpenAI and the Tavily key.
    Search,
    /// Weather lookups use keyless public APIs.
    Weather,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Chat => {
            check_api_key()?;
        }
        Operation::Search => {
            check_api_key()?;
            check_search_key(settings)?;
        }
        Operation::Weather => {}
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(SporError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(SporError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Check if a Tavily key is configured or exported.
fn check_search_key(settings: &Settings) -> Result<()> {
    match settings.search.resolved_api_key() {
        Some(_) => Ok(()),
        None => Err(SporError::Config(
            "TAVILY_API_KEY not set. Set it with: export TAVILY_API_KEY='tvly-...' or set search.api_key"
                .to_string(),
        )),
    }
}
