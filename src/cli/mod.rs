//! CLI module for Spor.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Spor - a tool-using chat assistant
///
/// Chats with a language model that can look up the weather, search the web
/// and ask you to confirm before acting.
/// The name "Spor" comes from the Norwegian word for "ask."
#[derive(Parser, Debug)]
#[command(name = "spor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check system requirements and configuration
    Doctor,

    /// Start an interactive chat session
    Chat {
        /// Agent profile to chat with
        #[arg(short, long)]
        profile: Option<String>,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Ask a single question and print the answer
    Ask {
        /// The question to ask
        question: String,

        /// Agent profile to answer with
        #[arg(short, long)]
        profile: Option<String>,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Show the current weather for a place
    Weather {
        /// City or place name
        location: String,
    },

    /// Search the web, planning several queries for complex questions
    Search {
        /// Search query
        query: String,

        /// Print raw JSON instead of formatted results
        #[arg(long)]
        json: bool,
    },

    /// Show the search plan for a query without running it
    Plan {
        /// Search query
        query: String,
    },

    /// List agent profiles
    Profiles,

    /// Start HTTP API server for frontends
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "model.chat_model")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
