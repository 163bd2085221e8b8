//! File-based config discovery for CLI use
//!
//! Handles finding and loading wext configuration files from the filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::UserConfig;
use crate::error::{ConfigError, Result};

/// File-based configuration discovery
///
/// Searches for wext configuration files in conventional locations and loads them.
///
/// # Example
///
/// ```no_run
/// use wext_config::ConfigDiscovery;
///
/// let discovery = ConfigDiscovery::new(".");
/// let config = discovery.load().unwrap();
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Find a config file in the root directory
    ///
    /// Searches in this order:
    /// 1. TOML config: wext.toml
    /// 2. package.json (wext field)
    pub fn find(&self) -> Option<PathBuf> {
        let toml_path = self.root.join("wext.toml");
        if toml_path.exists() {
            return Some(toml_path);
        }

        let pkg_path = self.root.join("package.json");
        if pkg_path.exists() {
            if let Ok(content) = fs::read_to_string(&pkg_path) {
                if let Ok(parsed) = serde_json::from_str::<Value>(&content) {
                    if parsed.get("wext").is_some_and(|v| !v.is_null()) {
                        return Some(pkg_path);
                    }
                }
            }
        }

        None
    }

    /// Load config from discovered file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if no config file is found.
    pub fn load(&self) -> Result<(UserConfig, PathBuf)> {
        let path = self.find().ok_or(ConfigError::NotFound)?;
        let config = Self::load_file(&path)?;
        Ok((config, path))
    }

    /// Load the discovered config, or the default config when there is none.
    pub fn load_or_default(&self) -> Result<(UserConfig, Option<PathBuf>)> {
        match self.load() {
            Ok((config, path)) => Ok((config, Some(path))),
            Err(ConfigError::NotFound) => Ok((UserConfig::default(), None)),
            Err(err) => Err(err),
        }
    }

    /// Load config from a specific file path
    pub fn load_file(path: &Path) -> Result<UserConfig> {
        if path.file_name() == Some(std::ffi::OsStr::new("package.json")) {
            return Self::load_from_package_json(path);
        }

        let content = read(path)?;

        let toml_val: toml::Value =
            toml::from_str(&content).map_err(|e| ConfigError::InvalidValue {
                field: "toml".to_string(),
                hint: Some(format!("Invalid TOML syntax: {}", e)),
            })?;

        let value = serde_json::to_value(toml_val).map_err(|e| ConfigError::InvalidValue {
            field: "toml".to_string(),
            hint: Some(format!("TOML to JSON conversion failed: {}", e)),
        })?;

        UserConfig::from_value(value)
    }

    fn load_from_package_json(path: &Path) -> Result<UserConfig> {
        let content = read(path)?;

        let parsed: Value =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidValue {
                field: "package.json".to_string(),
                hint: Some(format!("Invalid JSON: {}", e)),
            })?;

        let wext_value = parsed.get("wext").ok_or_else(|| ConfigError::InvalidValue {
            field: "wext".to_string(),
            hint: Some("Add a 'wext' field to your package.json".to_string()),
        })?;

        if wext_value.is_null() {
            return Err(ConfigError::InvalidValue {
                field: "wext".to_string(),
                hint: Some("The 'wext' field cannot be null".to_string()),
            });
        }

        UserConfig::from_value(wext_value.clone())
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Discover and load config from current directory (convenience function)
pub fn discover() -> Result<(UserConfig, PathBuf)> {
    let root = std::env::current_dir()?;
    ConfigDiscovery::new(&root).load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn find_returns_none_when_no_config() {
        let dir = TempDir::new().unwrap();
        let discovery = ConfigDiscovery::new(dir.path());
        assert!(discovery.find().is_none());
    }

    #[test]
    fn find_discovers_toml_config() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("wext.toml");
        fs::write(&config_path, "browser = \"firefox\"\n").unwrap();

        let discovery = ConfigDiscovery::new(dir.path());
        assert_eq!(discovery.find().unwrap(), config_path);
    }

    #[test]
    fn load_returns_not_found_when_no_config() {
        let dir = TempDir::new().unwrap();
        let discovery = ConfigDiscovery::new(dir.path());
        assert!(matches!(discovery.load(), Err(ConfigError::NotFound)));
    }

    #[test]
    fn load_or_default_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let (config, path) = ConfigDiscovery::new(dir.path()).load_or_default().unwrap();
        assert!(path.is_none());
        assert_eq!(config, UserConfig::default());
    }

    #[test]
    fn package_json_without_wext_field_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), r#"{ "name": "demo" }"#).unwrap();
        assert!(ConfigDiscovery::new(dir.path()).find().is_none());
    }

    #[test]
    fn invalid_toml_reports_hint() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("wext.toml"), "browser = ").unwrap();
        let err = ConfigDiscovery::new(dir.path()).load().unwrap_err();
        assert!(err.to_string().contains("Invalid TOML syntax"));
    }
}
