//! Profiles command implementation.

use crate::cli::Output;
use crate::config::Settings;
use console::style;

/// List the configured agent profiles.
pub fn run_profiles(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Agent Profiles");

    for (key, profile) in &settings.profiles {
        let marker = if *key == settings.agent.default_profile {
            style(" (default)").dim().to_string()
        } else {
            String::new()
        };
        println!(
            "\n  {} {} {}{}",
            profile.icon,
            style(&profile.agent_name).bold(),
            style(key).cyan(),
            marker
        );
        println!("    {}", style(&profile.system_prompt).dim());
    }

    Ok(())
}
