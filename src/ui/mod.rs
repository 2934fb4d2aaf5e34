//! CLI UI utilities for terminal output.
//!
//! Colored status lines, a spinner for the model call, and a block-level
//! preview of a formatted document. Status output goes to stderr so stdout
//! stays clean for the generated Markdown.

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use std::time::Duration;

use crate::models::{Block, FormattedDocument};

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Check if stdin is a terminal (no piped input).
pub fn stdin_is_terminal() -> bool {
    std::io::stdin().is_terminal()
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Locked,
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Locked => "🔒",
    }
}

/// Print a styled status message to stderr.
pub fn print_status(status: Status, msg: &str) {
    let icon = status_icon(status);
    match status {
        Status::Success => eprintln!("{} {}", icon.green().bold(), msg),
        Status::Error => eprintln!("{} {}", icon.red().bold(), msg),
        Status::Warning => eprintln!("{} {}", icon.yellow().bold(), msg),
        Status::Info => eprintln!("{} {}", icon.cyan().bold(), msg),
        Status::Locked => eprintln!("{} {}", icon.yellow(), msg),
    }
}

/// Print a section header.
pub fn print_section(title: &str) {
    eprintln!();
    eprintln!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

/// Print a divider line.
pub fn print_divider() {
    eprintln!("{}", "─".repeat(60).dimmed());
}

/// Print the block structure of a document, one line per block.
pub fn print_outline(doc: &FormattedDocument) {
    for block in doc.blocks() {
        match block {
            Block::Heading { level: 0, text } => eprintln!("{}", text.bold().underline()),
            Block::Heading { level: 1, text } => eprintln!("{}", text.bold().cyan()),
            Block::Heading { text, .. } => eprintln!("  {}", text.cyan()),
            Block::BulletItem(text) => eprintln!("    • {}", text),
            Block::NumberedItem(text) => eprintln!("    {}", text),
            Block::Paragraph(text) => eprintln!("  {}", text.dimmed()),
        }
    }
}

/// Get a human-readable file size.
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Loading spinner shown while waiting for the model.
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str) -> Self {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(spinner_style("{spinner:.cyan} {msg}", "⠁⠂⠄⡀⢀⠠⠐⠈ "));
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// A spinner that draws nothing, for quiet mode and non-terminals.
    pub fn hidden() -> Self {
        Self {
            pb: indicatif::ProgressBar::hidden(),
        }
    }

    /// Finish with success message.
    pub fn finish_with_success(&self, msg: &str) {
        self.pb.set_style(spinner_style("{spinner:.green} {msg}", "✓✓"));
        self.pb.finish_with_message(msg.to_string());
    }

    /// Finish with error message.
    pub fn finish_with_error(&self, msg: &str) {
        self.pb.set_style(spinner_style("{spinner:.red} {msg}", "✗✗"));
        self.pb.finish_with_message(msg.to_string());
    }
}

fn spinner_style(template: &str, ticks: &str) -> indicatif::ProgressStyle {
    indicatif::ProgressStyle::with_template(template)
        .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner())
        .tick_chars(ticks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(2048), "2.00 KB");
        assert_eq!(format_file_size(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn test_status_icons_distinct() {
        let icons = [
            status_icon(Status::Success),
            status_icon(Status::Error),
            status_icon(Status::Warning),
            status_icon(Status::Info),
            status_icon(Status::Locked),
        ];
        for (i, a) in icons.iter().enumerate() {
            for b in &icons[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_hidden_spinner_finishes() {
        let spinner = Spinner::hidden();
        spinner.finish_with_success("done");
    }
}
