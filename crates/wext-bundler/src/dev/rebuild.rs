//! Incremental rebuilds driven by a classified change.

use tracing::{debug, info};

use super::classifier::DevModeChange;
use crate::entrypoints::Entrypoint;
use crate::error::Result;
use crate::grouping::EntrypointGroup;
use crate::manifest::{generate_manifest, write_manifest};
use crate::orchestrator::BuildOrchestrator;
use crate::output::BuildOutput;
use crate::public::list_public_files;
use crate::types::write_path_types;

#[derive(Debug, Clone)]
pub struct RebuildResult {
    pub output: BuildOutput,
    /// Manifest warnings from this rebuild.
    pub warnings: Vec<String>,
}

/// What handling a change amounted to.
#[derive(Debug, Clone)]
pub enum RebuildOutcome {
    Unchanged,
    Rebuilt(RebuildResult),
    /// The caller must restart the browser. Nothing was built.
    RestartBrowser,
    /// The caller must re-resolve config and rebuild from scratch.
    RestartProcess,
}

/// Owns the rebuild half of the dev loop: rebuild the affected groups, merge
/// them with the cached steps, then regenerate and write the manifest.
#[derive(Debug, Clone)]
pub struct RebuildCoordinator {
    orchestrator: BuildOrchestrator,
}

impl RebuildCoordinator {
    pub fn new(orchestrator: BuildOrchestrator) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &BuildOrchestrator {
        &self.orchestrator
    }

    /// Act on `change`. `entrypoints` is the complete entrypoint list.
    pub async fn apply(
        &self,
        entrypoints: &[Entrypoint],
        change: DevModeChange,
    ) -> Result<RebuildOutcome> {
        let (groups, cached) = match change {
            DevModeChange::NoChange => return Ok(RebuildOutcome::Unchanged),
            DevModeChange::BrowserRestart => return Ok(RebuildOutcome::RestartBrowser),
            DevModeChange::FullRestart => return Ok(RebuildOutcome::RestartProcess),
            DevModeChange::HtmlReload {
                rebuild_groups,
                cached_output,
            }
            | DevModeChange::ContentScriptReload {
                rebuild_groups,
                cached_output,
            }
            | DevModeChange::ExtensionReload {
                rebuild_groups,
                cached_output,
            } => (rebuild_groups, cached_output),
        };
        self.rebuild(entrypoints, &groups, Some(cached))
            .await
            .map(RebuildOutcome::Rebuilt)
    }

    /// Build `groups` and produce a complete output.
    ///
    /// Steps in `cached` are kept ahead of the new ones; public assets always
    /// come from this run since the whole directory is copied again. The
    /// manifest is generated from every entrypoint, and only written once all
    /// groups have built.
    pub async fn rebuild(
        &self,
        entrypoints: &[Entrypoint],
        groups: &[EntrypointGroup],
        cached: Option<BuildOutput>,
    ) -> Result<RebuildResult> {
        let config = self.orchestrator.config();
        let hooks = self.orchestrator.hooks();

        let public_files = list_public_files(&config.public_dir)?;
        write_path_types(config, entrypoints, &public_files).await?;

        let built = self.orchestrator.build_entrypoints(groups).await?;
        let cached = cached.unwrap_or_default();
        debug!(
            cached = cached.steps.len(),
            rebuilt = built.steps.len(),
            "merging build steps"
        );
        let mut output = BuildOutput {
            manifest: cached.manifest,
            public_assets: built.public_assets,
            steps: cached.steps.into_iter().chain(built.steps).collect(),
        };

        let generated = generate_manifest(config, entrypoints, &output, hooks)?;
        write_manifest(config, &generated.manifest, &mut output).await?;
        hooks.build_done(&output);
        info!(files = output.file_names().count(), "build finished");

        Ok(RebuildResult {
            output,
            warnings: generated.warnings,
        })
    }
}
