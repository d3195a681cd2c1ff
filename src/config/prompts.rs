//! Prompt templates for Spor.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub agent: AgentPrompts,
    pub search: SearchPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for the chat loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    /// Used when a conversation carries no system prompt of its own.
    pub fallback_system: String,
    /// System message sent with every model call.
    /// Variables: {{system_prompt}}, {{agent_name}}, {{now}}.
    pub system: String,
    /// Synthetic user message injected once a confirmation is answered.
    /// Variables: {{response}}, {{message}}, {{context}}.
    pub confirmation_reply: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            fallback_system: "You are a helpful and knowledgeable assistant.".to_string(),
            system: r#"{{system_prompt}}

Never start your response by saying a question or idea or observation was good, great, fascinating, profound, excellent, or any other positive adjective. Skip the flattery and respond directly.
When an action is irreversible or the user's intent is ambiguous, use 'ask_user_confirmation' and wait for the answer.
Current date and time is {{now}}"#
                .to_string(),
            confirmation_reply: r#"I answered "{{response}}" to your confirmation request: "{{message}}"{{context}}"#
                .to_string(),
        }
    }
}

/// Prompts for web search planning and synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchPrompts {
    /// Variables: {{query}}, {{max_queries}}.
    pub planner: String,
    /// Variables: {{results}}, {{max_words}}.
    pub synthesis: String,
}

impl Default for SearchPrompts {
    fn default() -> Self {
        Self {
            planner: r#"You are a web search planning assistant. Given a user query, break it down into specific, focused search queries that will help gather all the necessary information.

Rules:
1. Identify if the query requires multiple searches (e.g., time-series data, comparisons, different aspects)
2. Create specific, focused search queries that will return relevant results
3. For stock/financial queries, include specific years or timeframes
4. For all-time-high requests, create separate searches for each year
5. Maximum {{max_queries}} search queries
6. Return ONLY a JSON array of search query strings, nothing else

Examples:
Query: "Stock development for last 3 years on BMW I want to have the ATH for each year"
Response: ["BMW stock price 2022 all time high", "BMW stock price 2023 all time high", "BMW stock price 2024 all time high", "BMW stock performance last 3 years"]

Query: "Compare Tesla and Ford stock performance"
Response: ["Tesla stock performance 2024", "Ford stock performance 2024", "Tesla vs Ford stock comparison"]

Query: "Current weather in New York"
Response: ["current weather New York"]

User Query: {{query}}"#
                .to_string(),
            synthesis: r#"You are a research synthesis assistant. Analyze the following search results from multiple queries and create a comprehensive, well-organized summary.

Instructions:
1. Identify the main topics and themes across all searches
2. Organize information logically (chronologically for time-series data, by category for comparisons)
3. Highlight key findings, numbers, and dates
4. Note any conflicting information or gaps
5. Provide a clear, actionable summary
6. Keep it concise but comprehensive (max {{max_words}} words)

Search Results:
{{results}}

Provide a well-structured synthesis:"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let agent_path = custom_path.join("agent.toml");
            if agent_path.exists() {
                let content = std::fs::read_to_string(&agent_path)?;
                prompts.agent = toml::from_str(&content)?;
            }

            let search_path = custom_path.join("search.toml");
            if search_path.exists() {
                let content = std::fs::read_to_string(&search_path)?;
                prompts.search = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
