//! Configuration module for Spor.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AgentPrompts, Prompts, SearchPrompts};
pub use settings::{
    AgentProfile, AgentSettings, GeneralSettings, ModelSettings, PromptSettings, SearchSettings,
    ServerSettings, Settings, WeatherSettings,
};
