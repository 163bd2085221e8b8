//! Resolution of a [`UserConfig`] into the immutable [`ResolvedConfig`]
//! threaded through every pipeline component.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::browser::{ManifestVersion, TargetBrowser};
use crate::config::UserConfig;
use crate::dev::DevOptions;
use crate::error::Result;
use crate::package::PackageInfo;

/// Which top-level operation the pipeline runs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Build,
    Serve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Production,
    Development,
}

/// Options supplied by the caller rather than the config file. Each set
/// field wins over its config file counterpart.
#[derive(Debug, Clone, Default)]
pub struct InlineConfig {
    pub browser: Option<TargetBrowser>,
    pub manifest_version: Option<ManifestVersion>,
    pub mode: Option<Mode>,
    pub filter_entrypoints: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub root: PathBuf,
    pub src_dir: PathBuf,
    pub entrypoints_dir: PathBuf,
    pub public_dir: PathBuf,
    pub modules_dir: PathBuf,
    /// Base output directory shared by every browser target.
    pub out_base_dir: PathBuf,
    /// `<out_base_dir>/<browser>-mv<version>`
    pub out_dir: PathBuf,
    /// Directory for generated artifacts such as type declarations.
    pub wext_dir: PathBuf,
    pub config_file: Option<PathBuf>,
    pub runner_config_file: PathBuf,
    pub browser: TargetBrowser,
    pub manifest_version: ManifestVersion,
    pub command: Command,
    pub mode: Mode,
    pub filter_entrypoints: Option<BTreeSet<String>>,
    pub manifest: Map<String, Value>,
    pub dev: DevOptions,
    pub package: PackageInfo,
}

impl ResolvedConfig {
    /// Resolve `user` for the browser selected by `inline` (or the config).
    ///
    /// `root` is the directory the config was discovered in; a relative
    /// `root` field in the config is taken relative to it.
    pub fn resolve(
        root: &Path,
        user: UserConfig,
        config_file: Option<PathBuf>,
        command: Command,
        inline: InlineConfig,
    ) -> Result<Self> {
        let browser = inline
            .browser
            .or_else(|| user.browser.clone())
            .unwrap_or_default();
        let user = user.materialize_browser(&browser)?;

        let manifest_version = inline
            .manifest_version
            .or(user.manifest_version)
            .unwrap_or_else(|| browser.default_manifest_version());
        let mode = inline.mode.unwrap_or(match command {
            Command::Build => Mode::Production,
            Command::Serve => Mode::Development,
        });

        let root = match &user.root {
            Some(dir) => root.join(dir),
            None => root.to_path_buf(),
        }
        .clean();
        let src_dir = root.join(user.src_dir.as_deref().unwrap_or(Path::new("."))).clean();
        let entrypoints_dir = src_dir
            .join(user.entrypoints_dir.as_deref().unwrap_or(Path::new("entrypoints")))
            .clean();
        let public_dir = src_dir
            .join(user.public_dir.as_deref().unwrap_or(Path::new("public")))
            .clean();
        let modules_dir = root
            .join(user.modules_dir.as_deref().unwrap_or(Path::new("modules")))
            .clean();
        let out_base_dir = root
            .join(user.out_dir.as_deref().unwrap_or(Path::new(".output")))
            .clean();
        let out_dir = out_base_dir.join(format!("{}-mv{}", browser, manifest_version));
        let runner_config_file = root
            .join(
                user.runner_config
                    .as_deref()
                    .unwrap_or(Path::new("wext-runner.toml")),
            )
            .clean();

        let filter_entrypoints = inline
            .filter_entrypoints
            .or(user.filter_entrypoints)
            .filter(|names| !names.is_empty())
            .map(|names| names.into_iter().collect::<BTreeSet<_>>());

        let package = PackageInfo::load(&root)?;

        debug!(
            browser = %browser,
            manifest_version = %manifest_version,
            out_dir = %out_dir.display(),
            "resolved config"
        );

        Ok(Self {
            wext_dir: root.join(".wext"),
            src_dir,
            entrypoints_dir,
            public_dir,
            modules_dir,
            out_base_dir,
            out_dir,
            config_file: config_file.map(|path| path.clean()),
            runner_config_file,
            browser,
            manifest_version,
            command,
            mode,
            filter_entrypoints,
            manifest: user.manifest,
            dev: user.dev,
            package,
            root,
        })
    }

    /// Whether the live-development command is running.
    pub fn is_dev(&self) -> bool {
        self.command == Command::Serve
    }

    pub fn is_mv3(&self) -> bool {
        self.manifest_version == ManifestVersion::V3
    }

    /// `hostname:port` of the reload server.
    pub fn dev_server_host(&self) -> String {
        format!("{}:{}", self.dev.hostname, self.dev.port)
    }

    /// `http://hostname:port`
    pub fn dev_server_origin(&self) -> String {
        format!("http://{}", self.dev_server_host())
    }
}
