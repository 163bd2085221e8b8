//! Build orchestration.
//!
//! Dispatches each [`EntrypointGroup`] to the [`Builder`] in order, then
//! stages the public assets.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};
use wext_config::ResolvedConfig;

use crate::builder::Builder;
use crate::error::{Error, Result};
use crate::grouping::EntrypointGroup;
use crate::hooks::Hooks;
use crate::output::{BuildStepOutput, OutputAsset};
use crate::public::{apply_delta, copy_public_files, list_public_files};

/// Everything a build produces except the manifest.
#[derive(Debug, Clone, Default)]
pub struct StepsOutput {
    /// In group order.
    pub steps: Vec<BuildStepOutput>,
    pub public_assets: Vec<OutputAsset>,
}

#[derive(Clone)]
pub struct BuildOrchestrator {
    config: Arc<ResolvedConfig>,
    builder: Arc<dyn Builder>,
    hooks: Arc<dyn Hooks>,
}

impl BuildOrchestrator {
    pub fn new(
        config: Arc<ResolvedConfig>,
        builder: Arc<dyn Builder>,
        hooks: Arc<dyn Hooks>,
    ) -> Self {
        Self {
            config,
            builder,
            hooks,
        }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn builder(&self) -> &dyn Builder {
        self.builder.as_ref()
    }

    pub fn hooks(&self) -> &dyn Hooks {
        self.hooks.as_ref()
    }

    /// Build `groups` one after another, then copy the public assets.
    ///
    /// The first failing group aborts the remaining ones. Files already
    /// emitted by earlier groups are left on disk.
    pub async fn build_entrypoints(&self, groups: &[EntrypointGroup]) -> Result<StepsOutput> {
        let mut steps = Vec::with_capacity(groups.len());
        for (index, group) in groups.iter().enumerate() {
            let label = group.label();
            let start = Instant::now();
            info!(
                builder = self.builder.name(),
                "[{}/{}] Building {}",
                index + 1,
                groups.len(),
                label
            );

            let step = self
                .builder
                .build(group)
                .await
                .map_err(|source| Error::BuildFailed {
                    entrypoints: label.clone(),
                    source,
                })?;

            debug!(
                entrypoints = %label,
                files = step.chunks.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "group built"
            );
            steps.push(step);
        }

        let public_assets = self.copy_public_assets().await?;
        Ok(StepsOutput {
            steps,
            public_assets,
        })
    }

    async fn copy_public_assets(&self) -> Result<Vec<OutputAsset>> {
        let files = list_public_files(&self.config.public_dir)?;
        let delta = self.hooks.public_assets(&files);
        let files = apply_delta(files, delta);
        debug!(count = files.len(), "copying public assets");
        copy_public_files(&files, &self.config.out_dir).await
    }
}

impl std::fmt::Debug for BuildOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildOrchestrator")
            .field("out_dir", &self.config.out_dir)
            .field("builder", &self.builder.name())
            .finish()
    }
}
