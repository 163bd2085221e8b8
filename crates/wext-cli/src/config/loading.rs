use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Serialized},
};
use tracing::debug;
use wext_config::{
    Command, ConfigDiscovery, InlineConfig, ResolvedConfig, TargetBrowser, UserConfig,
};

use crate::cli::TargetArgs;
use crate::error::{CliError, Result, ResultExt};

const ENV_PREFIX: &str = "WEXT_";

/// Reload server settings given on the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DevOverrides {
    pub port: Option<u16>,
    pub host: Option<String>,
}

/// Everything needed to (re)resolve the config for a command.
///
/// Kept by the dev loop so a config change can be resolved again with the
/// same flags.
#[derive(Debug, Clone)]
pub struct ConfigRequest {
    pub target: TargetArgs,
    pub command: Command,
    pub dev: DevOverrides,
    /// Directory relative paths on the command line are taken from.
    pub cwd: PathBuf,
}

impl ConfigRequest {
    pub fn new(target: TargetArgs, command: Command) -> Result<Self> {
        Ok(Self {
            target,
            command,
            dev: DevOverrides::default(),
            cwd: std::env::current_dir()?,
        })
    }

    pub fn with_dev(mut self, dev: DevOverrides) -> Self {
        self.dev = dev;
        self
    }

    fn root(&self) -> PathBuf {
        match &self.target.root {
            Some(root) => self.cwd.join(root),
            None => self.cwd.clone(),
        }
    }
}

/// Resolve the config for `request`.
pub fn load(request: &ConfigRequest) -> Result<ResolvedConfig> {
    let root = request.root();
    if !root.is_dir() {
        return Err(CliError::FileNotFound(root));
    }

    let (file_config, config_file) = read_config_file(request, &root)?;
    let user = layer(file_config, &request.dev)?;

    let inline = InlineConfig {
        browser: request.target.browser.as_deref().map(TargetBrowser::new),
        manifest_version: request.target.manifest_version(),
        mode: request.target.mode.map(Into::into),
        filter_entrypoints: (!request.target.filter_entrypoints.is_empty())
            .then(|| request.target.filter_entrypoints.clone()),
    };

    let config = ResolvedConfig::resolve(&root, user, config_file, request.command, inline)?;
    debug!(
        root = %config.root.display(),
        config_file = ?config.config_file,
        "loaded configuration"
    );
    Ok(config)
}

fn read_config_file(
    request: &ConfigRequest,
    root: &Path,
) -> Result<(UserConfig, Option<PathBuf>)> {
    match &request.target.config {
        Some(path) => {
            let path = request.cwd.join(path);
            if !path.is_file() {
                return Err(CliError::FileNotFound(path));
            }
            let config = ConfigDiscovery::load_file(&path)
                .with_hint("Config files are TOML, or package.json with a \"wext\" field")?;
            Ok((config, Some(path)))
        }
        None => Ok(ConfigDiscovery::new(root).load_or_default()?),
    }
}

/// Merge environment and flag layers over the file config.
fn layer(file_config: UserConfig, dev: &DevOverrides) -> Result<UserConfig> {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(file_config))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    if let Some(port) = dev.port {
        figment = figment.merge(Serialized::default("dev.port", port));
    }
    if let Some(host) = &dev.host {
        figment = figment.merge(Serialized::default("dev.hostname", host));
    }

    Ok(figment.extract()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;
    use wext_config::{ManifestVersion, Mode};

    fn request(dir: &TempDir, target: TargetArgs, command: Command) -> ConfigRequest {
        ConfigRequest {
            target,
            command,
            dev: DevOverrides::default(),
            cwd: dir.path().to_path_buf(),
        }
    }

    #[test]
    #[serial]
    fn defaults_without_config_file() {
        let dir = TempDir::new().unwrap();
        let config = load(&request(&dir, TargetArgs::default(), Command::Build)).unwrap();
        assert_eq!(config.browser.as_str(), "chrome");
        assert_eq!(config.manifest_version, ManifestVersion::V3);
        assert_eq!(config.mode, Mode::Production);
        assert!(config.config_file.is_none());
    }

    #[test]
    #[serial]
    fn config_file_is_discovered() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("wext.toml"), "browser = \"firefox\"\n").unwrap();
        let config = load(&request(&dir, TargetArgs::default(), Command::Build)).unwrap();
        assert_eq!(config.browser.as_str(), "firefox");
        assert_eq!(config.manifest_version, ManifestVersion::V2);
        assert_eq!(config.config_file, Some(dir.path().join("wext.toml")));
    }

    #[test]
    #[serial]
    fn environment_overrides_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("wext.toml"),
            "browser = \"firefox\"\n[dev]\nport = 3100\n",
        )
        .unwrap();
        unsafe {
            std::env::set_var("WEXT_BROWSER", "edge");
            std::env::set_var("WEXT_DEV__PORT", "3200");
        }
        let result = load(&request(&dir, TargetArgs::default(), Command::Serve));
        unsafe {
            std::env::remove_var("WEXT_BROWSER");
            std::env::remove_var("WEXT_DEV__PORT");
        }
        let config = result.unwrap();
        assert_eq!(config.browser.as_str(), "edge");
        assert_eq!(config.dev.port, 3200);
    }

    #[test]
    #[serial]
    fn flags_override_environment() {
        let dir = TempDir::new().unwrap();
        unsafe {
            std::env::set_var("WEXT_BROWSER", "edge");
            std::env::set_var("WEXT_DEV__PORT", "3200");
        }
        let target = TargetArgs {
            browser: Some("firefox".into()),
            mv3: true,
            filter_entrypoints: vec!["popup".into()],
            ..Default::default()
        };
        let mut req = request(&dir, target, Command::Serve);
        req.dev = DevOverrides {
            port: Some(4000),
            host: Some("127.0.0.1".into()),
        };
        let result = load(&req);
        unsafe {
            std::env::remove_var("WEXT_BROWSER");
            std::env::remove_var("WEXT_DEV__PORT");
        }
        let config = result.unwrap();
        assert_eq!(config.browser.as_str(), "firefox");
        assert_eq!(config.manifest_version, ManifestVersion::V3);
        assert_eq!(config.dev.port, 4000);
        assert_eq!(config.dev_server_origin(), "http://127.0.0.1:4000");
        assert_eq!(
            config.filter_entrypoints.unwrap().into_iter().collect::<Vec<_>>(),
            vec!["popup"]
        );
    }

    #[test]
    #[serial]
    fn explicit_config_path() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("custom.toml"), "out_dir = \"dist\"\n").unwrap();
        let target = TargetArgs {
            config: Some("custom.toml".into()),
            ..Default::default()
        };
        let config = load(&request(&dir, target, Command::Build)).unwrap();
        assert_eq!(config.out_base_dir, dir.path().join("dist"));
        assert_eq!(config.config_file, Some(dir.path().join("custom.toml")));
    }

    #[test]
    #[serial]
    fn missing_explicit_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let target = TargetArgs {
            config: Some("nope.toml".into()),
            ..Default::default()
        };
        let err = load(&request(&dir, target, Command::Build)).unwrap_err();
        assert!(matches!(err, CliError::FileNotFound(_)));
    }

    #[test]
    #[serial]
    fn missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let target = TargetArgs {
            root: Some("missing".into()),
            ..Default::default()
        };
        assert!(matches!(
            load(&request(&dir, target, Command::Build)),
            Err(CliError::FileNotFound(_))
        ));
    }
}
