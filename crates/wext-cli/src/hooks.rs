//! Pipeline hooks installed by the CLI.

use tracing::debug;
use wext_bundler::{BuildOutput, Entrypoint, EntrypointGroup, Hooks};
use wext_config::ResolvedConfig;

/// Traces pipeline progress at debug level. Never alters the build.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHooks;

impl Hooks for TracingHooks {
    fn build_started(&self, config: &ResolvedConfig) {
        debug!(out_dir = %config.out_dir.display(), "build started");
    }

    fn entrypoints_resolved(&self, entrypoints: &[Entrypoint]) {
        for entry in entrypoints {
            debug!(
                name = %entry.name,
                kind = ?entry.entrypoint_type(),
                skipped = entry.skipped,
                "entrypoint"
            );
        }
    }

    fn entrypoints_grouped(&self, groups: &[EntrypointGroup]) {
        debug!(groups = groups.len(), "entrypoints grouped");
    }

    fn build_done(&self, output: &BuildOutput) {
        debug!(
            steps = output.steps.len(),
            public_assets = output.public_assets.len(),
            "build done"
        );
    }
}
