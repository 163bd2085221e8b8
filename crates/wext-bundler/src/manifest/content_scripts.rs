//! Content script entries, their web-accessible CSS, and runtime host
//! permissions.

use indexmap::IndexMap;
use serde_json::{Map, Value, json};
use wext_config::ResolvedConfig;

use super::{Manifest, add_host_permissions, push_array};
use crate::entrypoints::{
    ContentScriptOptions, CssInjectionMode, Entrypoint, Registration, RunAt, World,
};
use crate::error::{Error, Result};
use crate::output::BuildOutput;

/// Replace the path of a match pattern with `/*`, keeping scheme and host.
///
/// ```
/// use wext_bundler::manifest::strip_path_from_match_pattern;
///
/// assert_eq!(
///     strip_path_from_match_pattern("*://play.google.com/books/*"),
///     "*://play.google.com/*"
/// );
/// assert_eq!(strip_path_from_match_pattern("<all_urls>"), "<all_urls>");
/// ```
pub fn strip_path_from_match_pattern(pattern: &str) -> String {
    let Some(scheme_end) = pattern.find("://") else {
        return pattern.to_string();
    };
    let host_start = scheme_end + 3;
    match pattern[host_start..].find('/') {
        Some(slash) => format!("{}/*", &pattern[..host_start + slash]),
        None => format!("{}/*", pattern),
    }
}

/// Fields two content scripts must agree on to share a manifest entry.
/// Defaults are applied and lists sorted so equivalent options compare equal.
#[derive(Debug, PartialEq, Eq, Hash)]
struct EntryKey {
    matches: Vec<String>,
    run_at: RunAt,
    match_about_blank: bool,
    exclude_matches: Vec<String>,
    include_globs: Vec<String>,
    exclude_globs: Vec<String>,
    all_frames: bool,
    world: World,
}

impl EntryKey {
    fn new(options: &ContentScriptOptions) -> Self {
        let sorted = |list: Option<&Vec<String>>| {
            let mut list = list.cloned().unwrap_or_default();
            list.sort();
            list
        };
        Self {
            matches: sorted(Some(&options.matches)),
            run_at: options.run_at.unwrap_or_default(),
            match_about_blank: options.match_about_blank.unwrap_or(false),
            exclude_matches: sorted(options.exclude_matches.as_ref()),
            include_globs: sorted(options.include_globs.as_ref()),
            exclude_globs: sorted(options.exclude_globs.as_ref()),
            all_frames: options.all_frames.unwrap_or(false),
            world: options.world.unwrap_or_default(),
        }
    }
}

/// Add every content script in `entrypoints` to `manifest`.
pub(super) fn add_content_scripts(
    manifest: &mut Manifest,
    config: &ResolvedConfig,
    entrypoints: &[&Entrypoint],
    output: &BuildOutput,
) -> Result<()> {
    let scripts: Vec<(&Entrypoint, &ContentScriptOptions)> = entrypoints
        .iter()
        .filter_map(|entry| entry.content_script_options().map(|o| (*entry, o)))
        .collect();
    if scripts.is_empty() {
        return Ok(());
    }

    let (runtime, declared): (Vec<_>, Vec<_>) = scripts
        .into_iter()
        .partition(|(_, options)| options.registration == Registration::Runtime);

    if !runtime.is_empty() {
        if !config.is_mv3() {
            return Err(Error::RuntimeContentScriptMv2 {
                names: runtime.iter().map(|(e, _)| e.name.clone()).collect(),
            });
        }
        add_host_permissions(
            manifest,
            runtime.iter().flat_map(|(_, options)| options.matches.iter().cloned()),
        );
    }

    let mut grouped: IndexMap<EntryKey, Vec<(&Entrypoint, &ContentScriptOptions)>> =
        IndexMap::new();
    for (entry, options) in declared {
        grouped
            .entry(EntryKey::new(options))
            .or_default()
            .push((entry, options));
    }

    let mut entries = Vec::with_capacity(grouped.len());
    for scripts in grouped.values() {
        let (_, first) = scripts[0];
        let mut entry = script_fields(first);

        let js: Vec<Value> = scripts
            .iter()
            .map(|(e, _)| Value::String(e.bundle_path(&config.out_dir, ".js")))
            .collect();
        entry.insert("js".into(), Value::Array(js));

        let css: Vec<Value> = scripts
            .iter()
            .filter(|(_, o)| o.css_injection_mode == CssInjectionMode::Manifest)
            .filter_map(|(e, _)| css_file(e, config, output))
            .map(Value::String)
            .collect();
        if !css.is_empty() {
            entry.insert("css".into(), Value::Array(css));
        }

        entries.push(Value::Object(entry));
    }
    if !entries.is_empty() {
        push_array(manifest, "content_scripts", entries);
    }

    let mut resources = Vec::new();
    for (entry, options) in runtime.iter().chain(grouped.values().flatten()) {
        if options.css_injection_mode == CssInjectionMode::Manifest {
            continue;
        }
        let Some(css) = css_file(entry, config, output) else {
            continue;
        };
        if config.is_mv3() {
            let mut matches: Vec<String> = Vec::new();
            for pattern in &options.matches {
                let stripped = strip_path_from_match_pattern(pattern);
                if !matches.contains(&stripped) {
                    matches.push(stripped);
                }
            }
            resources.push(json!({ "resources": [css], "matches": matches }));
        } else {
            resources.push(Value::String(css));
        }
    }
    if !resources.is_empty() {
        push_array(manifest, "web_accessible_resources", resources);
    }

    Ok(())
}

/// Manifest fields for a content script entry, only those that are set.
fn script_fields(options: &ContentScriptOptions) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("matches".into(), json!(options.matches));
    if let Some(run_at) = options.run_at {
        fields.insert("run_at".into(), json!(run_at));
    }
    if let Some(value) = options.match_about_blank {
        fields.insert("match_about_blank".into(), json!(value));
    }
    if let Some(value) = &options.exclude_matches {
        fields.insert("exclude_matches".into(), json!(value));
    }
    if let Some(value) = &options.include_globs {
        fields.insert("include_globs".into(), json!(value));
    }
    if let Some(value) = &options.exclude_globs {
        fields.insert("exclude_globs".into(), json!(value));
    }
    if let Some(value) = options.all_frames {
        fields.insert("all_frames".into(), json!(value));
    }
    if let Some(world) = options.world {
        fields.insert("world".into(), json!(world));
    }
    fields
}

/// The stylesheet emitted for a content script, if the build produced one.
fn css_file(entry: &Entrypoint, config: &ResolvedConfig, output: &BuildOutput) -> Option<String> {
    let expected = entry.bundle_path(&config.out_dir, ".css");
    output
        .file_names()
        .any(|name| name == expected)
        .then_some(expected)
}
