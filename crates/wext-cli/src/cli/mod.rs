//! Command-line interface definition.
//!
//! - `wext build` - build the extension for one browser target
//! - `wext dev` - build, watch and reload while developing

mod commands;
pub mod enums;

use clap::Parser;

pub use commands::{BuildArgs, Command, DevArgs, TargetArgs};
pub use enums::*;

/// wext - build browser extensions from an entrypoints directory
#[derive(Parser, Debug)]
#[command(
    name = "wext",
    version,
    about = "Build browser extensions",
    long_about = "wext discovers the entrypoints of a browser extension, builds them, and\n\
                  generates manifest.json for the chosen browser and manifest version.\n\
                  `wext dev` keeps rebuilding and reloads the extension as files change."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}
