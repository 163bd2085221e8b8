//! What to tell the running extension after a rebuild.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use wext_config::ResolvedConfig;

use crate::entrypoints::Entrypoint;
use crate::grouping::EntrypointGroup;
use crate::manifest::Manifest;

/// Message sent to the reload client in the extension background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ReloadEvent {
    ReloadExtension,
    ReloadPage {
        path: String,
    },
    #[serde(rename_all = "camelCase")]
    ReloadContentScript {
        content_script: Value,
    },
}

/// `reload-page` events for every HTML page in `groups`.
pub fn page_reloads(config: &ResolvedConfig, groups: &[EntrypointGroup]) -> Vec<ReloadEvent> {
    rebuilt_entrypoints(groups)
        .filter(|entry| entry.entrypoint_type().is_html())
        .map(|entry| ReloadEvent::ReloadPage {
            path: entry.bundle_path(&config.out_dir, ".html"),
        })
        .collect()
}

/// `reload-content-script` events for every content script in `groups`.
///
/// The payload is the manifest entry the script was bundled into, narrowed
/// to that script's files. Scripts registered at runtime are described from
/// their own options.
pub fn content_script_reloads(
    config: &ResolvedConfig,
    groups: &[EntrypointGroup],
    manifest: &Manifest,
) -> Vec<ReloadEvent> {
    let declared: Vec<&Map<String, Value>> = manifest
        .get("content_scripts")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .collect();

    rebuilt_entrypoints(groups)
        .filter_map(|entry| {
            let options = entry.content_script_options()?;
            let js = entry.bundle_path(&config.out_dir, ".js");
            let css = entry.bundle_path(&config.out_dir, ".css");

            let payload = match declared.iter().find(|script| lists(script, "js", &js)) {
                Some(script) => {
                    let mut payload = (*script).clone();
                    payload.insert("js".into(), json!([js]));
                    if lists(script, "css", &css) {
                        payload.insert("css".into(), json!([css]));
                    } else {
                        payload.remove("css");
                    }
                    Value::Object(payload)
                }
                None => json!({
                    "matches": options.matches,
                    "js": [js],
                    "all_frames": options.all_frames.unwrap_or(false),
                    "world": options.world.unwrap_or_default(),
                }),
            };
            Some(ReloadEvent::ReloadContentScript {
                content_script: payload,
            })
        })
        .collect()
}

fn rebuilt_entrypoints(groups: &[EntrypointGroup]) -> impl Iterator<Item = &Entrypoint> {
    groups
        .iter()
        .flat_map(EntrypointGroup::entrypoints)
        .filter(|entry| !entry.is_virtual())
}

fn lists(script: &Map<String, Value>, key: &str, file: &str) -> bool {
    script
        .get(key)
        .and_then(Value::as_array)
        .is_some_and(|files| files.iter().any(|f| f.as_str() == Some(file)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entrypoints::{ContentScriptOptions, EntrypointOptions, output_dir_for};
    use std::path::{Path, PathBuf};
    use wext_config::{Command, InlineConfig, UserConfig};

    fn config() -> ResolvedConfig {
        ResolvedConfig::resolve(
            Path::new("/ext"),
            UserConfig::default(),
            None,
            Command::Serve,
            InlineConfig::default(),
        )
        .unwrap()
    }

    fn entry(config: &ResolvedConfig, name: &str, options: EntrypointOptions) -> Entrypoint {
        Entrypoint {
            name: name.into(),
            input_path: PathBuf::from(format!("/ext/entrypoints/{name}")),
            output_dir: output_dir_for(options.entrypoint_type(), &config.out_dir),
            skipped: false,
            options,
        }
    }

    #[test]
    fn events_serialize_for_the_client() {
        assert_eq!(
            serde_json::to_value(ReloadEvent::ReloadExtension).unwrap(),
            json!({ "type": "reload-extension" })
        );
        assert_eq!(
            serde_json::to_value(ReloadEvent::ReloadContentScript {
                content_script: json!({ "js": ["a.js"] })
            })
            .unwrap(),
            json!({ "type": "reload-content-script", "contentScript": { "js": ["a.js"] } })
        );
    }

    #[test]
    fn pages_are_reloaded_by_bundle_path() {
        let config = config();
        let groups = vec![EntrypointGroup::Shared(vec![
            entry(&config, "popup", EntrypointOptions::Popup(Default::default())),
            entry(&config, "injected", EntrypointOptions::UnlistedScript),
        ])];
        assert_eq!(
            page_reloads(&config, &groups),
            vec![ReloadEvent::ReloadPage {
                path: "popup.html".into()
            }]
        );
    }

    #[test]
    fn content_script_payload_is_narrowed_to_the_script() {
        let config = config();
        let overlay = entry(
            &config,
            "overlay",
            EntrypointOptions::ContentScript(ContentScriptOptions {
                matches: vec!["<all_urls>".into()],
                ..Default::default()
            }),
        );
        let manifest: Manifest = serde_json::from_value(json!({
            "content_scripts": [{
                "matches": ["<all_urls>"],
                "run_at": "document_start",
                "js": ["content-scripts/other.js", "content-scripts/overlay.js"],
                "css": ["content-scripts/other.css"]
            }]
        }))
        .unwrap();

        let events = content_script_reloads(&config, &[EntrypointGroup::Single(overlay)], &manifest);
        assert_eq!(
            events,
            vec![ReloadEvent::ReloadContentScript {
                content_script: json!({
                    "matches": ["<all_urls>"],
                    "run_at": "document_start",
                    "js": ["content-scripts/overlay.js"]
                })
            }]
        );
    }
}
