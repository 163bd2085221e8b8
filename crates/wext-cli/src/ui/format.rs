//! Formatting for sizes, durations and the build summary.

use console::Term;
use owo_colors::OwoColorize;
use std::time::Duration;

/// One emitted file in the build summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
    /// Path relative to the output directory.
    pub file_name: String,
    pub size: u64,
}

/// Human-readable byte size.
///
/// ```
/// use wext_cli::ui::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1024), "1.00 KB");
/// assert_eq!(format_size(1_048_576), "1.00 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_idx = 0;
    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Human-readable duration.
///
/// ```
/// use std::time::Duration;
/// use wext_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Print every emitted file with its size, then the total.
pub fn print_build_summary(out_dir: &str, entries: &[SummaryEntry], duration: Duration) {
    let width = (Term::stderr().size().1 as usize).min(80);

    eprintln!("\n{} {}", "Build Summary".bold().underline(), out_dir.dimmed());
    eprintln!("{}", "─".repeat(width));

    let name_width = entries
        .iter()
        .map(|entry| entry.file_name.len())
        .max()
        .unwrap_or(0);
    for entry in entries {
        eprintln!(
            "  {} {:<name_width$}  {}",
            "▸".blue(),
            entry.file_name.bright_white(),
            format_size(entry.size).dimmed(),
        );
    }

    eprintln!("{}", "─".repeat(width));
    let total: u64 = entries.iter().map(|entry| entry.size).sum();
    eprintln!(
        "  {} {} in {} files, built in {}",
        "Total:".bold(),
        format_size(total).green(),
        entries.len(),
        format_duration(duration).green()
    );
}
