//! Icon discovery from public asset file names.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::output::OutputAsset;

/// Each pattern captures the size: the number nearest the extension.
static ICON_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^icon-(\d+)\.png$",
        r"^icon-\d+x(\d+)\.png$",
        r"^icon@(\d+)w\.png$",
        r"^icon@(\d+)h\.png$",
        r"^icon@(\d+)\.png$",
        r"^icons?/(\d+)\.png$",
        r"^icons?/\d+x(\d+)\.png$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("icon pattern is valid"))
    .collect()
});

/// Size-keyed icon map discovered from `assets`, or `None` if none match.
pub fn discover_icons(assets: &[OutputAsset]) -> Option<Map<String, Value>> {
    let mut icons = Map::new();
    for asset in assets {
        let size = ICON_PATTERNS
            .iter()
            .find_map(|regex| regex.captures(&asset.file_name))
            .map(|captures| captures[1].to_string());
        if let Some(size) = size {
            icons.insert(size, Value::String(asset.file_name.clone()));
        }
    }
    (!icons.is_empty()).then_some(icons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assets(names: &[&str]) -> Vec<OutputAsset> {
        names
            .iter()
            .map(|name| OutputAsset {
                file_name: name.to_string(),
            })
            .collect()
    }

    #[test]
    fn recognizes_every_naming_scheme() {
        let icons = discover_icons(&assets(&[
            "icon-16.png",
            "icon/32.png",
            "icon@48w.png",
            "icon-64x64.png",
            "icons/128x128.png",
            "icon@96.png",
            "logo.png",
            "icon/readme.txt",
        ]))
        .unwrap();

        assert_eq!(
            Value::Object(icons),
            json!({
                "16": "icon-16.png",
                "32": "icon/32.png",
                "48": "icon@48w.png",
                "64": "icon-64x64.png",
                "96": "icon@96.png",
                "128": "icons/128x128.png"
            })
        );
    }

    #[test]
    fn no_icons_is_none() {
        assert!(discover_icons(&assets(&["logo.svg"])).is_none());
    }
}
