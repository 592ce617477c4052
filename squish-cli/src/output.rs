//! Terminal output helpers: headings, label/value lines and the spinner.
//!
//! Everything here writes to stdout except the spinner, which draws on
//! stderr next to the log output.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Display;
use std::time::Duration;

/// Print a heading with a rule underneath.
pub fn print_heading(text: &str) {
    println!("\n{}", style(text).bold());
    println!("{}", style("=".repeat(40)).cyan());
}

/// Print a label/value line with the label highlighted.
pub fn print_info<T: Display>(label: &str, value: T) {
    println!("  {:<18} {}", style(format!("{label}:")).cyan(), value);
}

pub fn print_success(message: &str) {
    println!("{} {}", style("[OK]").green().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", style("[WARN]").yellow().bold(), message);
}

/// Spinner shown while a long-running step is in progress.
///
/// Hidden automatically when stderr is not a terminal.
pub fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Serialises `value` as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
