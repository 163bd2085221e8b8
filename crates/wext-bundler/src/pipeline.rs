//! A complete build: discovery, grouping, building and manifest.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};
use wext_config::ResolvedConfig;

use crate::builder::Builder;
use crate::dev::RebuildCoordinator;
use crate::entrypoints::{Entrypoint, find_entrypoints};
use crate::error::{Error, Result};
use crate::grouping::{EntrypointGroup, group_entrypoints};
use crate::hooks::Hooks;
use crate::orchestrator::BuildOrchestrator;
use crate::output::BuildOutput;

/// Result of a full build.
#[derive(Debug, Clone)]
pub struct BuildSummary {
    /// Every discovered entrypoint, skipped ones included.
    pub entrypoints: Vec<Entrypoint>,
    pub groups: Vec<EntrypointGroup>,
    pub output: BuildOutput,
    /// Discovery and manifest warnings, in that order.
    pub warnings: Vec<String>,
    pub duration: Duration,
}

/// Clean the output directory and build everything.
///
/// Returns the summary along with a coordinator that can rebuild
/// incrementally from it.
pub async fn build(
    config: Arc<ResolvedConfig>,
    builder: Arc<dyn Builder>,
    hooks: Arc<dyn Hooks>,
) -> Result<(BuildSummary, RebuildCoordinator)> {
    let start = Instant::now();
    hooks.build_started(&config);
    info!(
        browser = %config.browser,
        manifest_version = %config.manifest_version,
        mode = ?config.mode,
        "building extension"
    );

    clean_out_dir(&config).await?;

    let discovery = find_entrypoints(&config, builder.as_ref()).await?;
    hooks.entrypoints_resolved(&discovery.entrypoints);
    let groups = group_entrypoints(&discovery.entrypoints);
    hooks.entrypoints_grouped(&groups);
    debug!(
        entrypoints = discovery.entrypoints.len(),
        groups = groups.len(),
        "grouped entrypoints"
    );

    let coordinator =
        RebuildCoordinator::new(BuildOrchestrator::new(config, builder, hooks));
    let result = coordinator
        .rebuild(&discovery.entrypoints, &groups, None)
        .await?;

    let mut warnings = discovery.warnings;
    warnings.extend(result.warnings);

    Ok((
        BuildSummary {
            entrypoints: discovery.entrypoints,
            groups,
            output: result.output,
            warnings,
            duration: start.elapsed(),
        },
        coordinator,
    ))
}

async fn clean_out_dir(config: &ResolvedConfig) -> Result<()> {
    match tokio::fs::remove_dir_all(&config.out_dir).await {
        Ok(()) => {
            debug!(dir = %config.out_dir.display(), "cleaned output directory");
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(Error::Io {
            path: config.out_dir.clone(),
            source,
        }),
    }
}
