//! wext CLI - build and develop browser extensions.
//!
//! The `wext` binary wraps [`wext_bundler`] with configuration layering,
//! terminal output and a development loop.
//!
//! - [`cli`] - argument definitions
//! - [`config`] - config file, environment and flag layering
//! - [`commands`] - `build` and `dev`
//! - [`dev`] - file watcher, reload server and browser runner
//! - [`error`] - error types and miette conversion
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - status messages, spinner and build summary
//!
//! ```rust,no_run
//! use wext_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod dev;
pub mod error;
pub mod hooks;
pub mod logger;
pub mod ui;

pub use error::{CliError, Result, ResultExt};
