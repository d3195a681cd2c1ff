//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings, path: Option<PathBuf>) -> Result<()> {
    let config_path = path.unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            let updated = set_value(&settings, key, value)?;
            updated.save_to(&config_path)?;
            Output::success(&format!("Set {} = {}", key, value));
        }

        ConfigAction::Edit => {
            // Create default config if it doesn't exist
            if !config_path.exists() {
                settings.save_to(&config_path)?;
                Output::info(&format!("Created default config at {:?}", config_path));
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

            Output::info(&format!("Opening config in {}...", editor));

            let status = std::process::Command::new(&editor)
                .arg(&config_path)
                .status();

            match status {
                Ok(s) if s.success() => {
                    Output::success("Config saved.");
                }
                Ok(_) => {
                    Output::warning("Editor exited with non-zero status.");
                }
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {:?}", config_path));
                }
            }
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Return a copy of `settings` with the dotted `key` set to `value`.
///
/// The value is read as a TOML literal when possible (`8080`, `true`,
/// `"text"`), otherwise as a plain string.
fn set_value(settings: &Settings, key: &str, value: &str) -> Result<Settings> {
    let mut root = toml::Value::try_from(settings).context("Failed to serialize config")?;

    let parsed = toml::from_str::<toml::Table>(&format!("v = {}", value))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(value.to_string()));

    let mut parts = key.split('.').peekable();
    let mut node = &mut root;
    while let Some(part) = parts.next() {
        let table = match node.as_table_mut() {
            Some(table) => table,
            None => bail!("'{}' is not a config section", key),
        };
        if parts.peek().is_none() {
            table.insert(part.to_string(), parsed);
            break;
        }
        node = table
            .get_mut(part)
            .with_context(|| format!("Unknown config section in '{}'", key))?;
    }

    let updated: Settings = root
        .try_into()
        .with_context(|| format!("Invalid value for '{}': {}", key, value))?;

    // Unknown keys are dropped on deserialization.
    let check = toml::Value::try_from(&updated).context("Failed to serialize config")?;
    if key.split('.').try_fold(&check, |v, part| v.get(part)).is_none() {
        bail!("Unknown config key '{}'", key);
    }

    Ok(updated)
}
