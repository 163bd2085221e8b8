//! Pipeline hooks.
//!
//! Hooks observe the pipeline at fixed points. Where a hook can influence
//! the result it returns a delta ([`PublicAssetsDelta`], a manifest merge
//! patch) that the pipeline applies; hooks never receive mutable access to
//! pipeline state.

use serde_json::Value;
use wext_config::ResolvedConfig;

use crate::entrypoints::Entrypoint;
use crate::grouping::EntrypointGroup;
use crate::manifest::Manifest;
use crate::output::BuildOutput;
use crate::public::PublicFile;

/// Files to add to or remove from the staged public assets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublicAssetsDelta {
    pub add: Vec<PublicFile>,
    /// Relative destinations to drop.
    pub remove: Vec<String>,
}

pub trait Hooks: Send + Sync {
    fn build_started(&self, _config: &ResolvedConfig) {}

    fn entrypoints_resolved(&self, _entrypoints: &[Entrypoint]) {}

    fn entrypoints_grouped(&self, _groups: &[EntrypointGroup]) {}

    fn public_assets(&self, _files: &[PublicFile]) -> PublicAssetsDelta {
        PublicAssetsDelta::default()
    }

    /// Return a JSON merge patch (RFC 7386) to apply to the manifest.
    fn manifest_generated(&self, _manifest: &Manifest) -> Option<Value> {
        None
    }

    fn build_done(&self, _output: &BuildOutput) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl Hooks for NoopHooks {}

/// Apply an RFC 7386 JSON merge patch to `target`.
///
/// ```
/// use serde_json::json;
/// use wext_bundler::hooks::apply_merge_patch;
///
/// let mut doc = json!({ "a": 1, "b": { "c": 2 } });
/// apply_merge_patch(&mut doc, &json!({ "a": null, "b": { "d": 3 } }));
/// assert_eq!(doc, json!({ "b": { "c": 2, "d": 3 } }));
/// ```
pub fn apply_merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Default::default());
    }
    if let Value::Object(target_map) = target {
        for (key, value) in patch_map {
            if value.is_null() {
                target_map.remove(key);
            } else {
                apply_merge_patch(
                    target_map.entry(key.clone()).or_insert(Value::Null),
                    value,
                );
            }
        }
    }
}
