//! Value enums for command-line flags.

use clap::ValueEnum;
use wext_config::Mode;

/// Build mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Optimized output, compact manifest
    Production,
    /// Readable output, pretty manifest
    Development,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Production => Mode::Production,
            ModeArg::Development => Mode::Development,
        }
    }
}
