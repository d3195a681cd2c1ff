//! Configuration settings for Spor.

use crate::agent::RoutingPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub model: ModelSettings,
    pub agent: AgentSettings,
    pub weather: WeatherSettings,
    pub search: SearchSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
    /// Named agent personalities, selectable per conversation.
    pub profiles: BTreeMap<String, AgentProfile>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            model: ModelSettings::default(),
            agent: AgentSettings::default(),
            weather: WeatherSettings::default(),
            search: SearchSettings::default(),
            server: ServerSettings::default(),
            prompts: PromptSettings::default(),
            profiles: default_profiles(),
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level used when no -v flag is given (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Model driving the chat loop.
    pub chat_model: String,
    /// Model used to break a query into a search plan.
    pub planner_model: String,
    pub planner_temperature: f32,
    /// Model used to condense multi-query search results.
    pub synthesis_model: String,
    pub synthesis_temperature: f32,
    /// Let the model request several tool calls per response.
    pub parallel_tool_calls: bool,
    /// Request timeout for model calls, in seconds.
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            chat_model: "gpt-4o".to_string(),
            planner_model: "gpt-4o".to_string(),
            planner_temperature: 0.0,
            synthesis_model: "gpt-4o".to_string(),
            synthesis_temperature: 0.3,
            parallel_tool_calls: true,
            timeout_secs: crate::llm::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ModelSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Chat loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Profile used for new conversations.
    pub default_profile: String,
    /// Maximum model calls per turn.
    pub max_iterations: usize,
    /// How tool calls are checked against caller-supplied actions.
    pub routing: RoutingPolicy,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            default_profile: "default".to_string(),
            max_iterations: 15,
            routing: RoutingPolicy::FirstCall,
        }
    }
}

/// Geocoding and weather API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSettings {
    pub geocoding_url: String,
    pub forecast_url: String,
    /// User agent sent to the geocoder (required by Nominatim's usage policy).
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            geocoding_url: "https://nominatim.openstreetmap.org/search".to_string(),
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            user_agent: format!("spor/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
        }
    }
}

impl WeatherSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Web search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub api_url: String,
    /// Tavily API key. Falls back to the TAVILY_API_KEY environment variable.
    pub api_key: Option<String>,
    /// Search depth passed to the API (basic, advanced).
    pub search_depth: String,
    /// Results for a single-query search.
    pub max_results: usize,
    /// Results per query when executing a multi-query plan.
    pub plan_max_results: usize,
    /// Upper bound on planned sub-queries (1 to 5; larger values are capped).
    pub max_queries: usize,
    /// Pause between planned searches, in milliseconds.
    pub pacing_ms: u64,
    /// Word limit for the synthesized summary.
    pub summary_max_words: usize,
    pub timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.tavily.com/search".to_string(),
            api_key: None,
            search_depth: "basic".to_string(),
            max_results: 5,
            plan_max_results: 3,
            max_queries: 5,
            pacing_ms: 500,
            summary_max_words: 500,
            timeout_secs: 30,
        }
    }
}

impl SearchSettings {
    /// Resolve the API key from config or environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("TAVILY_API_KEY").ok().filter(|k| !k.is_empty()))
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

/// An agent personality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub agent_name: String,
    pub system_prompt: String,
    #[serde(default)]
    pub icon: String,
}

fn default_profiles() -> BTreeMap<String, AgentProfile> {
    let profile = |name: &str, prompt: &str, icon: &str| AgentProfile {
        agent_name: name.to_string(),
        system_prompt: prompt.to_string(),
        icon: icon.to_string(),
    };

    BTreeMap::from([
        (
            "default".to_string(),
            profile("Jarvis", "You are a helpful and knowledgeable assistant.", "🤖"),
        ),
        (
            "weather_expert".to_string(),
            profile(
                "WeatherBot",
                "You are a specialized weather analysis AI. Provide detailed weather insights and recommendations.",
                "🌤️",
            ),
        ),
        (
            "spanish_assistant".to_string(),
            profile(
                "Carlos",
                "Eres un asistente útil que habla español. Responde siempre en español.",
                "🇪🇸",
            ),
        ),
        (
            "creative_writer".to_string(),
            profile(
                "Muse",
                "You are a creative writing assistant. Help users with storytelling, poetry, and creative content.",
                "✍️",
            ),
        ),
    ])
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SporError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("spor")
            .join("config.toml")
    }

    /// Look up a profile by key.
    pub fn profile(&self, key: &str) -> crate::error::Result<&AgentProfile> {
        self.profiles.get(key).ok_or_else(|| {
            crate::error::SporError::Config(format!(
                "Unknown profile '{}'. Available: {}",
                key,
                self.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })
    }
}
