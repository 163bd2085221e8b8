use std::path::PathBuf;

use clap::{Args, Subcommand};
use wext_config::ManifestVersion;

use crate::cli::enums::ModeArg;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the extension
    ///
    /// Cleans the output directory, builds every entrypoint and writes
    /// manifest.json to `<out_dir>/<browser>-mv<version>`.
    Build(BuildArgs),

    /// Build, watch and reload
    ///
    /// Runs a full build, then rebuilds only what changed files affect and
    /// tells the running extension to reload pages, content scripts or
    /// itself.
    Dev(DevArgs),
}

/// Options shared by every command that resolves a build target.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct TargetArgs {
    /// Project root (defaults to the current directory)
    #[arg(value_name = "ROOT")]
    pub root: Option<PathBuf>,

    /// Target browser (chrome, firefox, edge, safari, ...)
    #[arg(short, long, value_name = "BROWSER")]
    pub browser: Option<String>,

    /// Target manifest version 2
    #[arg(long, conflicts_with = "mv3")]
    pub mv2: bool,

    /// Target manifest version 3
    #[arg(long)]
    pub mv3: bool,

    /// Build mode (defaults to production for build, development for dev)
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Config file to use instead of wext.toml / package.json discovery
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only build these entrypoints (repeatable or comma-separated)
    #[arg(short = 'e', long = "filter-entrypoint", value_name = "NAME", value_delimiter = ',')]
    pub filter_entrypoints: Vec<String>,
}

impl TargetArgs {
    /// Manifest version selected by `--mv2` / `--mv3`.
    pub fn manifest_version(&self) -> Option<ManifestVersion> {
        if self.mv2 {
            Some(ManifestVersion::V2)
        } else if self.mv3 {
            Some(ManifestVersion::V3)
        } else {
            None
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct BuildArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct DevArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Port of the reload server
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Hostname of the reload server
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Do not launch a browser even if wext-runner.toml configures one
    #[arg(long)]
    pub no_runner: bool,
}
