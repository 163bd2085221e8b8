//! Spinner for the initial build.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;

/// Spinner for work of unknown length.
///
/// ```no_run
/// use wext_cli::ui::Spinner;
///
/// let spinner = Spinner::new("Building extension...");
/// spinner.finish("Built extension");
/// ```
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_strings(&["◐", "◓", "◑", "◒"]));
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }

    /// Spinner that draws nothing, for CI and piped output.
    pub fn hidden() -> Self {
        Self {
            pb: ProgressBar::hidden(),
        }
    }

    /// A visible spinner when interactive, otherwise a hidden one.
    pub fn for_terminal(message: &str) -> Self {
        if super::is_interactive() {
            Self::new(message)
        } else {
            Self::hidden()
        }
    }

    pub fn set_message(&self, message: &str) {
        self.pb.set_message(message.to_string());
    }

    pub fn finish(&self, message: &str) {
        self.pb
            .finish_with_message(format!("{} {}", "✓".green(), message));
    }

    pub fn fail(&self, message: &str) {
        self.pb
            .finish_with_message(format!("{} {}", "✗".red(), message));
    }

    /// Remove the spinner line without leaving a message.
    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }
}
