//! # wext-bundler
//!
//! Build pipeline for browser extensions.
//!
//! The pipeline discovers entrypoints in the project's `entrypoints/`
//! directory, buckets them into build groups, hands each group to a
//! [`Builder`], stages public assets, and assembles `manifest.json` for the
//! target browser and manifest version. In development, [`dev`] classifies
//! changed files and rebuilds only what they affect.
//!
//! ```no_run
//! use std::sync::Arc;
//! use wext_bundler::{NoopHooks, StaticBuilder, pipeline};
//! use wext_config::{Command, InlineConfig, ResolvedConfig, UserConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(ResolvedConfig::resolve(
//!     ".".as_ref(),
//!     UserConfig::default(),
//!     None,
//!     Command::Build,
//!     InlineConfig::default(),
//! )?);
//! let builder = Arc::new(StaticBuilder::new(&config));
//! let (summary, _) = pipeline::build(config, builder, Arc::new(NoopHooks)).await?;
//! for warning in &summary.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! # Ok(()) }
//! ```

pub mod builder;
pub mod dev;
pub mod entrypoints;
pub mod grouping;
pub mod hooks;
pub mod manifest;
pub mod orchestrator;
pub mod output;
pub mod pipeline;
pub mod public;
pub mod types;

mod error;

pub use builder::{Builder, BuilderError, StaticBuilder, dev_client_script};
pub use dev::{
    ChangeKind, DevModeChange, RebuildCoordinator, RebuildOutcome, RebuildResult, ReloadEvent,
    detect_dev_changes, detect_restart,
};
pub use entrypoints::{Discovery, Entrypoint, EntrypointOptions, EntrypointType, find_entrypoints};
pub use error::{Error, Result};
pub use grouping::{EntrypointGroup, group_entrypoints};
pub use hooks::{Hooks, NoopHooks, PublicAssetsDelta};
pub use manifest::{GeneratedManifest, Manifest, generate_manifest, write_manifest};
pub use orchestrator::{BuildOrchestrator, StepsOutput};
pub use output::{BuildOutput, BuildStepOutput, OutputAsset, OutputChunk, OutputFile, StepId};
pub use pipeline::BuildSummary;
