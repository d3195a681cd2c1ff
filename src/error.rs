//! Error types for Spor.

use thiserror::Error;

/// Library-level error type for Spor operations.
#[derive(Error, Debug)]
pub enum SporError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Geocoding failed: {0}")]
    Geocoding(String),

    #[error("Unable to find coordinates for {0}!")]
    LocationNotFound(String),

    #[error("Weather lookup failed: {0}")]
    Weather(String),

    #[error("Web search failed: {0}")]
    Search(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Agent error: {0}")]
    Agent(String),
}

/// Result type alias for Spor operations.
pub type Result<T> = std::result::Result<T, SporError>;
