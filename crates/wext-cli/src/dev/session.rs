//! The `wext dev` loop.
//!
//! One full build, then per batch of changed files:
//!
//! - config file or modules dir: abort any in-flight rebuild, re-resolve the
//!   config and build from scratch
//! - runner config: let the in-flight rebuild finish, restart the browser
//! - anything else: let the in-flight rebuild finish, classify the batch
//!   against the latest output, rebuild what it affects in the background and
//!   broadcast the matching reload events once done

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::signal;
use tokio::task::{JoinError, JoinHandle};
use tracing::debug;
use wext_bundler::dev::{content_script_reloads, page_reloads};
use wext_bundler::{
    BuildOutput, ChangeKind, DevModeChange, Entrypoint, RebuildCoordinator, RebuildOutcome,
    ReloadEvent, StaticBuilder, detect_dev_changes, detect_restart, pipeline,
};
use wext_config::ResolvedConfig;

use crate::commands::display_path;
use crate::config::{ConfigRequest, load};
use crate::dev::runner::{BrowserRunner, RunnerConfig};
use crate::dev::server::ReloadServer;
use crate::dev::state::{DevState, SharedState};
use crate::dev::watcher::{FileWatcher, spawn_batcher};
use crate::error::Result;
use crate::hooks::TracingHooks;
use crate::ui;

/// The latest build and the coordinator that produced it.
struct Project {
    coordinator: RebuildCoordinator,
    entrypoints: Vec<Entrypoint>,
    output: BuildOutput,
}

struct RebuildReport {
    change: DevModeChange,
    outcome: wext_bundler::Result<RebuildOutcome>,
    duration: Duration,
}

type RebuildTask = JoinHandle<RebuildReport>;

/// Abort `task` and wait until it has stopped, so none of its writes land
/// after the caller moves on.
async fn cancel_rebuild<T>(task: JoinHandle<T>) {
    task.abort();
    let _ = task.await;
}

pub struct DevSession {
    request: ConfigRequest,
    config: Arc<ResolvedConfig>,
    state: SharedState,
    project: Project,
    runner: BrowserRunner,
    server: JoinHandle<Result<()>>,
}

impl DevSession {
    /// Build, start the reload server and launch the browser.
    pub async fn start(request: ConfigRequest, runner_enabled: bool) -> Result<Self> {
        let config = Arc::new(load(&request)?);
        let state: SharedState = Arc::new(DevState::new());
        ui::info(&format!(
            "Starting development for {} (MV{})",
            config.browser, config.manifest_version
        ));

        let project = full_build(&config, &state).await?;

        let server =
            ReloadServer::bind(&config.dev_server_host(), &config.dev_server_origin(), state.clone())
                .await?;
        ui::success(&format!(
            "Reload server listening at {}",
            config.dev_server_origin()
        ));
        let server = tokio::spawn(server.serve());

        let mut runner = BrowserRunner::new(
            RunnerConfig::load(&config.runner_config_file)?,
            runner_enabled,
        );
        match runner.start(&config.out_dir).await? {
            Some(dir) => ui::info(&format!(
                "Load {} as an unpacked extension",
                display_path(&dir, &config.root)
            )),
            None => ui::success("Launched browser"),
        }

        Ok(Self {
            request,
            config,
            state,
            project,
            runner,
            server,
        })
    }

    /// Watch and rebuild until Ctrl+C.
    pub async fn run(mut self) -> Result<()> {
        let (watcher, changes) =
            FileWatcher::new(self.config.root.clone(), ignored_dirs(&self.config))?;
        let mut batches = spawn_batcher(changes, Duration::from_millis(self.config.dev.debounce_ms));
        ui::info(&format!("Watching {}", watcher.root().display()));
        ui::info("Press Ctrl+C to stop");

        let mut inflight: Option<RebuildTask> = None;
        loop {
            tokio::select! {
                batch = batches.recv() => {
                    let Some(batch) = batch else { break };
                    self.handle_batch(batch, &mut inflight).await;
                }
                joined = wait_for(&mut inflight) => {
                    inflight = None;
                    self.finish_rebuild(joined).await;
                }
                _ = signal::ctrl_c() => {
                    ui::info("Shutting down...");
                    break;
                }
                served = &mut self.server => {
                    match served {
                        Ok(Err(err)) => ui::error(&err.to_string()),
                        Err(err) => ui::error(&format!("Reload server stopped: {err}")),
                        Ok(Ok(())) => ui::warning("Reload server stopped"),
                    }
                    break;
                }
            }
        }

        if let Some(task) = inflight {
            cancel_rebuild(task).await;
        }
        self.runner.stop().await;
        self.server.abort();
        Ok(())
    }

    async fn handle_batch(&mut self, mut batch: Vec<PathBuf>, inflight: &mut Option<RebuildTask>) {
        debug!(paths = ?batch, "changed files");

        match detect_restart(&self.config, &batch) {
            Some(ChangeKind::FullRestart) => {
                if let Some(task) = inflight.take() {
                    cancel_rebuild(task).await;
                    debug!("aborted in-flight rebuild");
                }
                self.restart_process().await;
                return;
            }
            Some(_) => {
                self.finish_inflight(inflight).await;
                self.restart_browser().await;
                let runner_config = self.config.runner_config_file.clone();
                batch.retain(|path| path != &runner_config);
                if batch.is_empty() {
                    return;
                }
            }
            None => self.finish_inflight(inflight).await,
        }

        let change = detect_dev_changes(&self.config, &batch, &self.project.output);
        if matches!(change, DevModeChange::NoChange) {
            debug!("no entrypoint affected");
            return;
        }

        ui::info(&format!(
            "{} changed ({})",
            describe_batch(&batch, &self.config.root),
            change.kind()
        ));
        self.state.start_build();

        let coordinator = self.project.coordinator.clone();
        let entrypoints = self.project.entrypoints.clone();
        *inflight = Some(tokio::spawn(async move {
            let started = Instant::now();
            let outcome = coordinator.apply(&entrypoints, change.clone()).await;
            RebuildReport {
                change,
                outcome,
                duration: started.elapsed(),
            }
        }));
    }

    async fn finish_inflight(&mut self, inflight: &mut Option<RebuildTask>) {
        if let Some(task) = inflight.take() {
            let joined = task.await;
            self.finish_rebuild(joined).await;
        }
    }

    async fn finish_rebuild(&mut self, joined: std::result::Result<RebuildReport, JoinError>) {
        let report = match joined {
            Ok(report) => report,
            Err(err) if err.is_cancelled() => return,
            Err(err) => {
                self.state.fail_build(err.to_string());
                ui::error(&format!("Rebuild task failed: {err}"));
                return;
            }
        };

        match report.outcome {
            Ok(RebuildOutcome::Rebuilt(result)) => {
                for warning in &result.warnings {
                    ui::warning(warning);
                }
                self.project.output = result.output;
                self.state
                    .complete_build(report.duration.as_millis() as u64);

                let events = self.reload_events(&report.change);
                for event in &events {
                    self.state.broadcast(event).await;
                }
                ui::success(&format!(
                    "Rebuilt in {} ({})",
                    ui::format_duration(report.duration),
                    describe_events(&events)
                ));
            }
            Ok(RebuildOutcome::Unchanged) => {
                self.state
                    .complete_build(report.duration.as_millis() as u64);
            }
            Ok(RebuildOutcome::RestartBrowser) => self.restart_browser().await,
            Ok(RebuildOutcome::RestartProcess) => self.restart_process().await,
            Err(err) => {
                self.state.fail_build(err.to_string());
                ui::error(&format!("Rebuild failed: {err}"));
            }
        }
    }

    fn reload_events(&self, change: &DevModeChange) -> Vec<ReloadEvent> {
        let events = match change.kind() {
            ChangeKind::HtmlReload => page_reloads(&self.config, change.rebuild_groups()),
            // MV2 has no scripting API to re-inject with.
            ChangeKind::ContentScriptReload if self.config.is_mv3() => content_script_reloads(
                &self.config,
                change.rebuild_groups(),
                &self.project.output.manifest,
            ),
            _ => Vec::new(),
        };
        if events.is_empty() {
            vec![ReloadEvent::ReloadExtension]
        } else {
            events
        }
    }

    /// Re-resolve the config and rebuild everything in-process.
    async fn restart_process(&mut self) {
        ui::info("Configuration changed, rebuilding from scratch...");
        let config = match load(&self.request) {
            Ok(config) => Arc::new(config),
            Err(err) => {
                self.state.fail_build(err.to_string());
                ui::error(&format!("Failed to reload configuration: {err}"));
                return;
            }
        };
        if config.dev_server_host() != self.config.dev_server_host() {
            ui::warning("Reload server address changes apply after restarting `wext dev`");
        }

        match full_build(&config, &self.state).await {
            Ok(project) => {
                self.config = config;
                self.project = project;
                self.restart_browser().await;
            }
            Err(err) => ui::error(&err.to_string()),
        }
    }

    /// Relaunch the browser, or ask the extension to reload itself when
    /// no browser is managed.
    async fn restart_browser(&mut self) {
        match self
            .runner
            .restart(&self.config.runner_config_file, &self.config.out_dir)
            .await
        {
            Ok(None) => ui::success("Restarted browser"),
            Ok(Some(_)) => self.state.broadcast(&ReloadEvent::ReloadExtension).await,
            Err(err) => ui::error(&err.to_string()),
        }
    }
}

async fn full_build(config: &Arc<ResolvedConfig>, state: &SharedState) -> Result<Project> {
    state.start_build();
    let spinner = ui::Spinner::for_terminal("Building extension...");
    let builder = Arc::new(StaticBuilder::new(config));

    match pipeline::build(config.clone(), builder, Arc::new(TracingHooks)).await {
        Ok((summary, coordinator)) => {
            spinner.clear();
            state.complete_build(summary.duration.as_millis() as u64);
            for warning in &summary.warnings {
                ui::warning(warning);
            }
            ui::success(&format!(
                "Built {} entrypoints in {}",
                summary.entrypoints.iter().filter(|e| !e.skipped).count(),
                ui::format_duration(summary.duration)
            ));
            Ok(Project {
                coordinator,
                entrypoints: summary.entrypoints,
                output: summary.output,
            })
        }
        Err(err) => {
            spinner.fail("Build failed");
            state.fail_build(err.to_string());
            Err(err.into())
        }
    }
}

async fn wait_for(
    task: &mut Option<RebuildTask>,
) -> std::result::Result<RebuildReport, JoinError> {
    match task {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

/// Directories whose changes never affect the build.
fn ignored_dirs(config: &ResolvedConfig) -> Vec<PathBuf> {
    vec![
        config.out_base_dir.clone(),
        config.wext_dir.clone(),
        config.root.join("node_modules"),
    ]
}

fn describe_batch(batch: &[PathBuf], root: &Path) -> String {
    match batch {
        [] => String::new(),
        [only] => display_path(only, root),
        [first, rest @ ..] => format!("{} (+{} more)", display_path(first, root), rest.len()),
    }
}

fn describe_events(events: &[ReloadEvent]) -> String {
    let count = |wanted: fn(&ReloadEvent) -> bool| events.iter().filter(|e| wanted(e)).count();
    let pages = count(|e| matches!(e, ReloadEvent::ReloadPage { .. }));
    let scripts = count(|e| matches!(e, ReloadEvent::ReloadContentScript { .. }));
    match (pages, scripts) {
        (0, 0) => "reloaded extension".to_string(),
        (pages, 0) => format!("reloaded {pages} page(s)"),
        (0, scripts) => format!("re-injected {scripts} content script(s)"),
        (pages, scripts) => format!("reloaded {pages} page(s), re-injected {scripts} content script(s)"),
    }
}
