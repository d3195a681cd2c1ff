//! Doctor command - verify configuration and service reachability.

use crate::cli::Output;
use crate::config::{Prompts, Settings};
use console::style;
use std::path::Path;
use std::time::Duration;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Spor Doctor");
    println!();
    println!("Checking configuration and services...\n");

    let mut checks = Vec::new();

    println!("{}", style("API Configuration").bold());
    let api_checks = vec![
        check_openai_api_key(std::env::var("OPENAI_API_KEY").ok()),
        check_tavily_api_key(settings.search.resolved_api_key()),
    ];
    for check in &api_checks {
        check.print();
    }
    checks.extend(api_checks);

    println!();

    println!("{}", style("Services").bold());
    let service_checks = vec![
        check_endpoint("Nominatim", &settings.weather.geocoding_url).await,
        check_endpoint("Open-Meteo", &settings.weather.forecast_url).await,
    ];
    for check in &service_checks {
        check.print();
    }
    checks.extend(service_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_checks = vec![
        check_config_file(config_path),
        check_default_profile(settings),
        check_prompts(settings),
    ];
    for check in &config_checks {
        check.print();
    }
    checks.extend(config_checks);

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Spor.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Spor is ready to use.");
    }

    Ok(())
}

fn check_openai_api_key(key: Option<String>) -> CheckResult {
    match key {
        Some(key) if key.starts_with("sk-") && key.len() > 20 => CheckResult::ok(
            "OPENAI_API_KEY",
            &format!("configured ({})", mask(&key)),
        ),
        Some(key) if key.is_empty() => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Some(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        None => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

fn check_tavily_api_key(key: Option<String>) -> CheckResult {
    match key {
        Some(key) => CheckResult::ok("TAVILY_API_KEY", &format!("configured ({})", mask(&key))),
        None => CheckResult::warning(
            "TAVILY_API_KEY",
            "not set, web search is disabled",
            "Set with: export TAVILY_API_KEY='tvly-...' or spor config set search.api_key ...",
        ),
    }
}

async fn check_endpoint(name: &str, url: &str) -> CheckResult {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
    {
        Ok(client) => client,
        Err(e) => return CheckResult::error(name, &format!("error: {}", e), "Check TLS setup"),
    };

    match client.head(url).send().await {
        Ok(response) => CheckResult::ok(name, &format!("reachable ({})", response.status())),
        Err(e) => CheckResult::warning(
            name,
            &format!("unreachable: {}", e),
            "Check your network connection or the configured URL",
        ),
    }
}

fn check_config_file(path: &Path) -> CheckResult {
    if path.exists() {
        CheckResult::ok("Config file", &format!("{}", path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: spor config edit",
        )
    }
}

fn check_default_profile(settings: &Settings) -> CheckResult {
    match settings.profile(&settings.agent.default_profile) {
        Ok(profile) => CheckResult::ok(
            "Default profile",
            &format!("{} ({})", settings.agent.default_profile, profile.agent_name),
        ),
        Err(e) => CheckResult::error(
            "Default profile",
            &e.to_string(),
            "Set agent.default_profile to one of the configured profiles",
        ),
    }
}

fn check_prompts(settings: &Settings) -> CheckResult {
    let Some(dir) = settings.prompts.custom_dir.as_deref() else {
        return CheckResult::ok("Prompts", "built-in");
    };

    match Prompts::load(Some(dir), None) {
        Ok(_) => CheckResult::ok("Prompts", &format!("custom ({})", dir)),
        Err(e) => CheckResult::error(
            "Prompts",
            &format!("failed to load {}: {}", dir, e),
            "Fix the TOML files in prompts.custom_dir",
        ),
    }
}

/// Show only the first and last characters of a secret.
fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 11 {
        return "***".to_string();
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_api_key_checks() {
        assert_eq!(check_openai_api_key(None).status, CheckStatus::Error);
        assert_eq!(
            check_openai_api_key(Some("sk-abcdefghijklmnopqrstuvwxyz".to_string())).status,
            CheckStatus::Ok
        );
        assert_eq!(
            check_openai_api_key(Some("whatever".to_string())).status,
            CheckStatus::Warning
        );
        assert_eq!(check_tavily_api_key(None).status, CheckStatus::Warning);
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("sk-1234567890abcdef"), "sk-1234...cdef");
        assert_eq!(mask("short"), "***");
    }

    #[test]
    fn test_unknown_default_profile_is_an_error() {
        let mut settings = Settings::default();
        settings.agent.default_profile = "pirate".to_string();
        assert_eq!(check_default_profile(&settings).status, CheckStatus::Error);
        assert_eq!(check_default_profile(&Settings::default()).status, CheckStatus::Ok);
    }
}
