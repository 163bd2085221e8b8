//! Browser runner.
//!
//! Launches a browser with the built extension loaded, as configured in
//! `wext-runner.toml`:
//!
//! ```toml
//! binary = "/usr/bin/chromium"
//! args = ["--load-extension={out_dir}", "--no-first-run"]
//! ```
//!
//! `{out_dir}` in an argument is replaced with the output directory.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::error::{CliError, Result};

const OUT_DIR_PLACEHOLDER: &str = "{out_dir}";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<PathBuf>,
    pub args: Vec<String>,
}

impl RunnerConfig {
    /// Read `path`; a missing file yields the default (no browser).
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .extract()?)
    }

    pub fn args_for(&self, out_dir: &Path) -> Vec<String> {
        let out_dir = out_dir.display().to_string();
        self.args
            .iter()
            .map(|arg| arg.replace(OUT_DIR_PLACEHOLDER, &out_dir))
            .collect()
    }
}

#[derive(Debug)]
pub struct BrowserRunner {
    config: RunnerConfig,
    /// False when `--no-runner` was given.
    enabled: bool,
    child: Option<Child>,
}

impl BrowserRunner {
    pub fn new(config: RunnerConfig, enabled: bool) -> Self {
        Self {
            config,
            enabled,
            child: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }

    /// Launch the browser, if one is configured.
    ///
    /// Returns the output directory to load manually when nothing was
    /// launched.
    pub async fn start(&mut self, out_dir: &Path) -> Result<Option<PathBuf>> {
        if !self.enabled || self.config.disabled {
            debug!("browser runner disabled");
            return Ok(Some(out_dir.to_path_buf()));
        }
        let Some(binary) = self.config.binary.clone() else {
            return Ok(Some(out_dir.to_path_buf()));
        };

        let args = self.args_for(out_dir);
        info!(binary = %binary.display(), ?args, "launching browser");
        let child = Command::new(&binary)
            .args(&args)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CliError::Runner(format!("{}: {e}", binary.display())))?;
        self.child = Some(child);
        Ok(None)
    }

    pub async fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(err) = child.kill().await {
                debug!(%err, "browser already exited");
            }
        }
    }

    /// Re-read `config_path`, then relaunch.
    pub async fn restart(&mut self, config_path: &Path, out_dir: &Path) -> Result<Option<PathBuf>> {
        self.config = RunnerConfig::load(config_path)?;
        self.stop().await;
        self.start(out_dir).await
    }

    fn args_for(&self, out_dir: &Path) -> Vec<String> {
        self.config.args_for(out_dir)
    }
}
