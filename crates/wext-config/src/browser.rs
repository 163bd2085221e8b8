//! Target browser, manifest version and per-browser option values.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Name of the browser a build targets.
///
/// Browser names are free-form (`chrome`, `firefox`, `edge`, `opera`, ...);
/// only Firefox and Safari get special treatment during manifest generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetBrowser(String);

impl TargetBrowser {
    pub const CHROME: &'static str = "chrome";
    pub const FIREFOX: &'static str = "firefox";
    pub const SAFARI: &'static str = "safari";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().to_ascii_lowercase())
    }

    pub fn chrome() -> Self {
        Self::new(Self::CHROME)
    }

    pub fn firefox() -> Self {
        Self::new(Self::FIREFOX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_firefox(&self) -> bool {
        self.0 == Self::FIREFOX
    }

    pub fn is_safari(&self) -> bool {
        self.0 == Self::SAFARI
    }

    /// Manifest version used when none is configured.
    ///
    /// Firefox still defaults to MV2; every other browser gets MV3.
    pub fn default_manifest_version(&self) -> ManifestVersion {
        if self.is_firefox() {
            ManifestVersion::V2
        } else {
            ManifestVersion::V3
        }
    }
}

impl Default for TargetBrowser {
    fn default() -> Self {
        Self::chrome()
    }
}

impl fmt::Display for TargetBrowser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetBrowser {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Extension manifest format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ManifestVersion {
    V2,
    V3,
}

impl ManifestVersion {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::V2 => 2,
            Self::V3 => 3,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            2 => Some(Self::V2),
            3 => Some(Self::V3),
            _ => None,
        }
    }
}

impl fmt::Display for ManifestVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

impl Serialize for ManifestVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for ManifestVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Self::from_u8(value).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "unsupported manifest version {value}, expected 2 or 3"
            ))
        })
    }
}

/// A value shared by every browser, or chosen per browser.
///
/// ```
/// use wext_config::{PerBrowser, TargetBrowser};
///
/// let value: PerBrowser<bool> = serde_json::from_str(r#"{ "firefox": true }"#).unwrap();
/// assert_eq!(value.resolve(&TargetBrowser::firefox()), Some(true));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PerBrowser<T> {
    Value(T),
    Browsers(BTreeMap<String, T>),
}

impl<T> PerBrowser<T> {
    /// Pick the value for `browser`. A per-browser map with no entry for it
    /// resolves to `None`.
    pub fn resolve(self, browser: &TargetBrowser) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Browsers(mut map) => map.remove(browser.as_str()),
        }
    }
}

impl<T> From<T> for PerBrowser<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}
