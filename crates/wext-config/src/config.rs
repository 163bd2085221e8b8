//! User-facing configuration structure.
//!
//! `UserConfig` is what a `wext.toml` (or the `wext` field of `package.json`)
//! deserializes into. Every field is optional; defaults are applied when the
//! config is resolved against a target browser, see [`crate::ResolvedConfig`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::browser::{ManifestVersion, TargetBrowser};
use crate::dev::DevOptions;
use crate::error::{ConfigError, Result as ConfigResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Project root, relative to the directory the config was found in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_dir: Option<PathBuf>,

    /// Relative to `src_dir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrypoints_dir: Option<PathBuf>,

    /// Relative to `src_dir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<TargetBrowser>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_version: Option<ManifestVersion>,

    /// Only build the named entrypoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_entrypoints: Option<Vec<String>>,

    /// Manifest fields merged over the generated base manifest.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub manifest: Map<String, Value>,

    #[serde(default)]
    pub dev: DevOptions,

    /// Browser runner settings file, relative to the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner_config: Option<PathBuf>,

    /// Per-browser overrides, deep-merged over the rest of the config.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub browsers: BTreeMap<String, Value>,
}

impl UserConfig {
    /// Create from serde_json::Value
    ///
    /// # Example
    ///
    /// ```
    /// use wext_config::UserConfig;
    /// use serde_json::json;
    ///
    /// let config = UserConfig::from_value(json!({
    ///     "browser": "firefox",
    ///     "manifest": { "permissions": ["storage"] }
    /// }))
    /// .unwrap();
    /// assert_eq!(config.browser.unwrap().as_str(), "firefox");
    /// ```
    pub fn from_value(value: Value) -> ConfigResult<Self> {
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: Some(e.to_string()),
        })
    }

    /// Convert to serde_json::Value
    pub fn to_value(&self) -> ConfigResult<Value> {
        serde_json::to_value(self).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: Some(e.to_string()),
        })
    }

    /// Apply the `browsers.<name>` override for `browser`, if one exists.
    ///
    /// Objects merge key by key; arrays and scalars in the override replace
    /// the base value.
    pub fn materialize_browser(self, browser: &TargetBrowser) -> ConfigResult<Self> {
        let Some(overrides) = self.browsers.get(browser.as_str()).cloned() else {
            return Ok(self);
        };
        if overrides.is_null() {
            return Ok(self);
        }

        let invalid = |message: String| ConfigError::InvalidBrowserOverride {
            browser: browser.to_string(),
            message,
        };

        let mut base = serde_json::to_value(&self).map_err(|err| invalid(err.to_string()))?;
        merge_values(&mut base, &overrides);
        let mut merged: UserConfig =
            serde_json::from_value(base).map_err(|err| invalid(err.to_string()))?;
        merged.browsers = self.browsers;
        Ok(merged)
    }
}

pub fn merge_values(target: &mut Value, update: &Value) {
    match (target, update) {
        (Value::Object(target_map), Value::Object(update_map)) => {
            for (key, value) in update_map {
                merge_values(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (target_slot, _) => {
            *target_slot = update.clone();
        }
    }
}
