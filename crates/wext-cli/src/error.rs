//! Error handling for the wext CLI.
//!
//! [`CliError`] wraps the errors of every layer below the CLI. Commands
//! return it and `main` turns it into a [`miette::Report`] with
//! [`cli_error_to_miette`], keeping the bundler's diagnostic codes and help.
//!
//! ```rust,no_run
//! use wext_cli::error::{Result, ResultExt};
//! use std::path::Path;
//!
//! fn read_runner_config(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_path(path)
//!         .with_hint("Create wext-runner.toml or disable the runner")
//! }
//! ```

use std::path::PathBuf;

use miette::Report;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Config file could not be found, read or parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] wext_config::ConfigError),

    /// Layered settings (file, environment, flags) did not extract.
    #[error("Invalid settings: {0}\n\nHint: Check wext.toml and WEXT_* environment variables")]
    Settings(#[from] figment::Error),

    #[error(transparent)]
    Bundler(#[from] wext_bundler::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Reload server errors
    #[error("Server error: {0}")]
    Server(String),

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// Browser runner could not be started.
    #[error("Browser runner error: {0}")]
    Runner(String),

    #[error("{0}")]
    Custom(String),
}

pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Adds context to fallible results.
pub trait ResultExt<T> {
    /// Turn a not-found I/O error into [`CliError::FileNotFound`] for `path`.
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;

    /// Append a hint to the error message.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;

    /// Prefix the error message.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| match e.into() {
            CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                CliError::FileNotFound(path.as_ref().to_path_buf())
            }
            other => other,
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{err}\n\nHint: {hint}"))
        })
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{msg}: {err}"))
        })
    }
}

/// Convert a [`CliError`] into a report for display.
///
/// Bundler errors keep their diagnostic code and help text.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Bundler(e) => Report::new(e),
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        other => miette::miette!("{}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_convert() {
        let err: CliError = wext_config::ConfigError::NotFound.into();
        assert!(matches!(err, CliError::Config(_)));
        assert!(err.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn bundler_errors_are_transparent() {
        let err: CliError = wext_bundler::Error::MissingManifestField("name").into();
        assert_eq!(err.to_string(), "Manifest is missing required field 'name'");
    }

    #[test]
    fn with_path_maps_not_found() {
        let result: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        let err = result.with_path("/ext/wext-runner.toml").unwrap_err();
        assert!(matches!(err, CliError::FileNotFound(path) if path == PathBuf::from("/ext/wext-runner.toml")));
    }

    #[test]
    fn with_path_keeps_other_errors() {
        let result: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(matches!(result.with_path("/x").unwrap_err(), CliError::Io(_)));
    }

    #[test]
    fn with_hint_appends_hint() {
        let result: Result<()> = Err(CliError::InvalidArgument("--mv2".into()));
        let msg = result.with_hint("Pick one manifest version").unwrap_err().to_string();
        assert!(msg.contains("Invalid argument: --mv2"));
        assert!(msg.contains("Hint: Pick one manifest version"));
    }

    #[test]
    fn context_prefixes_message() {
        let result: Result<()> = Err(CliError::Server("bind failed".into()));
        let msg = result.context("Failed to start dev server").unwrap_err().to_string();
        assert_eq!(msg, "Failed to start dev server: Server error: bind failed");
    }

    #[test]
    fn bundler_report_keeps_code() {
        let report = cli_error_to_miette(wext_bundler::Error::MissingManifestField("name").into());
        let code = report.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("MISSING_MANIFEST_FIELD"));
    }
}
