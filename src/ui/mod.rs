//! Terminal output for fetch outcomes.
//!
//! This module provides status icons, colored outcome rendering in JSON,
//! plain text and table forms, and the batch progress bar.

use comfy_table::{Attribute, Cell, Color, Table};
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

use crate::models::{BatchEntry, BatchSummary, FetchOutcome, Status};

/// Width budget for the message column of the table view
const MESSAGE_WIDTH: usize = 60;

/// How results are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table on a terminal, JSON otherwise
    Auto,
    Table,
    Json,
    Plain,
}

impl OutputFormat {
    /// Resolve `Auto` against whether stdout is a terminal
    pub fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status icons for outcome kinds.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Info => "ℹ",
    }
}

/// Source icons for the places a PDF can come from.
pub fn source_icon(source: &str) -> &'static str {
    match source.to_lowercase().as_str() {
        "pdfdrive" => "📕",
        "internet archive" => "🏛️",
        "web search" => "🔎",
        "mzuni library" => "📚",
        _ => "📄",
    }
}

/// Render entries as a pretty JSON array, one flat record per identifier
pub fn render_json(entries: &[BatchEntry]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(entries)
}

/// Render entries as indented plain text, one block per identifier
pub fn render_plain(entries: &[BatchEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!("{} [{}]\n", entry.identifier, entry.outcome.status()));
        out.push_str(&format!("  {}\n", entry.outcome.message()));

        match &entry.outcome {
            FetchOutcome::Success {
                file_path,
                cover,
                source,
                ..
            } => {
                out.push_str(&format!("  File: {}\n", file_path.display()));
                if let Some(cover) = cover {
                    out.push_str(&format!("  Cover: {}\n", cover.display()));
                }
                if let Some(source) = source {
                    out.push_str(&format!("  Source: {}\n", source));
                }
            }
            FetchOutcome::Error { alternatives, .. } => {
                for url in alternatives {
                    out.push_str(&format!("  Try: {}\n", url));
                }
            }
            FetchOutcome::Info {
                url,
                resources,
                tips,
                ..
            } => {
                if let Some(url) = url {
                    out.push_str(&format!("  URL: {}\n", url));
                }
                for resource in resources {
                    out.push_str(&format!("  Resource: {}\n", resource));
                }
                for tip in tips {
                    out.push_str(&format!("  Tip: {}\n", tip));
                }
            }
        }
        out.push('\n');
    }
    out
}

/// Render entries as a table of identifier, status, message and detail
pub fn render_table(entries: &[BatchEntry]) -> String {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Identifier", "Status", "Message", "Detail"]);

    for entry in entries {
        let status = entry.outcome.status();
        let color = match status {
            Status::Success => Color::Green,
            Status::Error => Color::Red,
            Status::Info => Color::Cyan,
        };

        table.add_row(vec![
            Cell::new(truncate_with_ellipsis(&entry.identifier, 40))
                .add_attribute(Attribute::Bold),
            Cell::new(format!("{} {}", status_icon(status), status)).fg(color),
            Cell::new(truncate_with_ellipsis(entry.outcome.message(), MESSAGE_WIDTH)),
            Cell::new(detail(&entry.outcome)),
        ]);
    }
    table.to_string()
}

/// Second column of detail: where the file went, or what to try next
fn detail(outcome: &FetchOutcome) -> String {
    match outcome {
        FetchOutcome::Success {
            file_path,
            cover,
            source,
            ..
        } => {
            let mut lines = vec![file_path.display().to_string()];
            if let Some(cover) = cover {
                lines.push(cover.display().to_string());
            }
            if let Some(source) = source {
                lines.push(format!("{} {}", source_icon(source), source));
            }
            lines.join("\n")
        }
        FetchOutcome::Error { alternatives, .. } => alternatives.join("\n"),
        FetchOutcome::Info { url, tips, .. } => {
            let mut lines: Vec<String> = url.iter().cloned().collect();
            lines.extend(tips.iter().cloned());
            lines.join("\n")
        }
    }
}

/// Render entries in the requested format
pub fn render(entries: &[BatchEntry], format: OutputFormat) -> serde_json::Result<String> {
    match format.resolve() {
        OutputFormat::Json => render_json(entries),
        OutputFormat::Plain => Ok(render_plain(entries)),
        _ => Ok(render_table(entries)),
    }
}

/// One-line batch summary
pub fn summary_line(summary: &BatchSummary) -> String {
    format!(
        "{} {} processed: {} downloaded, {} need manual follow-up, {} failed",
        "━━━".cyan(),
        summary.total,
        summary.success.to_string().green().bold(),
        summary.info.to_string().cyan(),
        summary.error.to_string().red()
    )
}

/// Truncate text to fit within the specified width using unicode-aware truncation.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width <= 3 {
        return "...".to_string();
    }

    let char_widths: Vec<(char, usize)> = text
        .chars()
        .map(|c| (c, unicode_width::UnicodeWidthChar::width(c).unwrap_or(1)))
        .collect();

    let total_width: usize = char_widths.iter().map(|(_, w)| *w).sum();
    if total_width <= max_width {
        return text.to_string();
    }

    let mut current_width = 0;
    let mut end_idx = 0;
    for (i, (_, w)) in char_widths.iter().enumerate() {
        if current_width + w > max_width - 3 {
            break;
        }
        current_width += w;
        end_idx = i + 1;
    }

    let truncated: String = char_widths[..end_idx].iter().map(|(c, _)| *c).collect();
    format!("{}...", truncated)
}

/// Progress bar ticking once per finished identifier
pub fn batch_progress_bar(len: u64) -> indicatif::ProgressBar {
    let pb = indicatif::ProgressBar::new(len);
    let style = indicatif::ProgressStyle::with_template(
        "{spinner:.cyan} {bar:40.cyan/blue} {pos}/{len} {msg}",
    )
    .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
    .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    .progress_chars("█▓▒░ ");
    pb.set_style(style);
    pb
}

/// Advance the bar for a finished entry
pub fn tick(pb: &indicatif::ProgressBar, entry: &BatchEntry) {
    pb.set_message(format!(
        "{} {}",
        status_icon(entry.outcome.status()),
        truncate_with_ellipsis(&entry.identifier, 40)
    ));
    pb.inc(1);
}
