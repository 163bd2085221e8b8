//! `wext build`

use std::sync::Arc;

use tracing::info;
use wext_bundler::{StaticBuilder, pipeline};
use wext_config::Command;

use crate::cli::BuildArgs;
use crate::commands::utils;
use crate::config::{ConfigRequest, load};
use crate::error::Result;
use crate::hooks::TracingHooks;
use crate::ui;

/// Resolve the config, run a full build and print the summary.
pub async fn execute(args: BuildArgs) -> Result<()> {
    let request = ConfigRequest::new(args.target, Command::Build)?;
    let config = Arc::new(load(&request)?);

    let out_dir = utils::display_path(&config.out_dir, &config.root);
    info!(out_dir = %out_dir, "building");
    let spinner = ui::Spinner::for_terminal(&format!(
        "Building for {} (MV{})...",
        config.browser, config.manifest_version
    ));

    let builder = Arc::new(StaticBuilder::new(&config));
    let summary = match pipeline::build(config.clone(), builder, Arc::new(TracingHooks)).await {
        Ok((summary, _)) => summary,
        Err(err) => {
            spinner.fail("Build failed");
            return Err(err.into());
        }
    };
    spinner.clear();

    for warning in &summary.warnings {
        ui::warning(warning);
    }

    let entries = utils::collect_summary(&config.out_dir, &summary.output).await;
    ui::print_build_summary(&out_dir, &entries, summary.duration);
    ui::success(&format!(
        "Built extension in {}",
        ui::format_duration(summary.duration)
    ));
    Ok(())
}
