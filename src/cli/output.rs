//! CLI output formatting utilities.

use crate::clients::{SearchHit, WeatherReading};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print an assistant reply.
    pub fn reply(icon: &str, name: &str, text: &str) {
        println!("\n{} {}", icon, style(name).green().bold());
        println!("{}\n", text);
    }

    /// Print a confirmation question.
    pub fn confirmation(message: &str, context: Option<&str>) {
        println!("\n{} {}", style("??").yellow().bold(), style(message).bold());
        if let Some(ctx) = context {
            println!("   {}", style(ctx).dim());
        }
    }

    /// Print a weather reading.
    pub fn weather(place: &str, reading: &WeatherReading) {
        println!(
            "\n{} {}: {}",
            style(">>").green(),
            style(place).bold(),
            reading.describe()
        );
        Self::kv("Temperature", &format!("{:.1} °C", reading.temperature));
        Self::kv("Humidity", &format!("{:.0} %", reading.humidity));
        Self::kv("WMO code", &format!("{}", reading.weather_code));
    }

    /// Print a search hit.
    pub fn search_hit(hit: &SearchHit) {
        println!("\n{} {}", style(">>").green(), style(&hit.title).bold());
        println!("   {}", content_preview(&hit.content, 200));
        println!("   {}", style(&hit.url).dim());
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Truncate content with ellipsis.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let cut: String = content.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("short\ntext", 20), "short text");
        assert_eq!(content_preview("æøå æøå", 3), "æøå...");
    }
}
