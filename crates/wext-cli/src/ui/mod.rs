//! Terminal output: status messages, spinner and build summary.
//!
//! Everything is written to stderr so stdout stays free for piping.
//!
//! ```no_run
//! use wext_cli::ui;
//!
//! ui::init_colors(false);
//! let spinner = ui::Spinner::new("Building extension...");
//! spinner.finish("Built extension");
//! ui::warning("Skipped entrypoints for chrome: sidebar");
//! ```

mod format;
mod messages;
mod spinner;

pub use format::{SummaryEntry, format_duration, format_size, print_build_summary};
pub use messages::{debug, error, info, success, warning};
pub use spinner::Spinner;

/// Whether a CI environment is detected.
pub fn is_ci() -> bool {
    ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "CIRCLECI", "TRAVIS"]
        .iter()
        .any(|var| std::env::var_os(var).is_some())
}

/// Whether colors should be used, honoring `NO_COLOR` and `FORCE_COLOR`.
pub fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::user_attended_stderr()
}

/// Whether animated output (the spinner) makes sense.
pub fn is_interactive() -> bool {
    !is_ci() && console::user_attended_stderr()
}

/// Apply the color preference to `owo-colors` output. `--no-color` wins
/// over everything else.
pub fn init_colors(no_color: bool) {
    owo_colors::set_override(!no_color && should_use_color());
}
