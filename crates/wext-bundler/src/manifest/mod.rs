//! Manifest assembly for a target browser and manifest version.
//!
//! [`generate_manifest`] is pure: it reads the resolved config, the complete
//! entrypoint list and the current build output, and returns the manifest
//! plus any warnings. [`write_manifest`] persists it.

mod content_scripts;
mod csp;
mod icons;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value, json};
use tracing::debug;
use wext_config::{ManifestVersion, ResolvedConfig};

pub use content_scripts::strip_path_from_match_pattern;
pub use csp::ContentSecurityPolicy;
pub use icons::discover_icons;

use crate::entrypoints::{Entrypoint, EntrypointOptions, EntrypointType};
use crate::error::{Error, Result};
use crate::hooks::{Hooks, apply_merge_patch};
use crate::output::{BuildOutput, OutputAsset};

/// A manifest document.
pub type Manifest = Map<String, Value>;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Name of the development reload command.
pub const RELOAD_COMMAND: &str = "wext:reload-extension";

/// Browsers reject more than this many commands with a suggested key.
const MAX_SUGGESTED_KEYS: usize = 4;

const DEFAULT_MV3_EXTENSION_PAGES_CSP: &str = "script-src 'self' 'wasm-unsafe-eval'; object-src 'self';";
const DEFAULT_MV3_SANDBOX_CSP: &str = "sandbox allow-scripts allow-forms allow-popups allow-modals; script-src 'self' 'unsafe-inline' 'unsafe-eval'; child-src 'self';";
const DEFAULT_MV2_CSP: &str = "script-src 'self'; object-src 'self';";

/// Keys removed from the final manifest, per target.
const MV2_ONLY_KEYS: &[&str] = &["browser_action", "page_action"];
const MV3_ONLY_KEYS: &[&str] = &["action", "side_panel"];
const FIREFOX_ONLY_KEYS: &[&str] = &["sidebar_action", "browser_specific_settings"];
const CHROMIUM_ONLY_KEYS: &[&str] = &["side_panel", "minimum_chrome_version"];

static VERSION_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^((0|[1-9][0-9]{0,8})([.](0|[1-9][0-9]{0,8})){0,3})")
        .expect("version regex is valid")
});

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedManifest {
    pub manifest: Manifest,
    pub warnings: Vec<String>,
}

/// Build the manifest for `config`'s browser and manifest version.
///
/// `entrypoints` is the complete list; skipped ones are ignored. Generating
/// twice from the same inputs yields the same document.
pub fn generate_manifest(
    config: &ResolvedConfig,
    entrypoints: &[Entrypoint],
    output: &BuildOutput,
    hooks: &dyn Hooks,
) -> Result<GeneratedManifest> {
    let entrypoints: Vec<&Entrypoint> = entrypoints.iter().filter(|e| !e.skipped).collect();
    let mut warnings = Vec::new();

    let mut manifest = base_manifest(config, output, &mut warnings)?;
    for (key, value) in &config.manifest {
        if key == "manifest_version" {
            warnings.push(
                "manifest.manifest_version is ignored; choose the version with the manifest_version option or --mv2/--mv3"
                    .to_string(),
            );
            continue;
        }
        manifest.insert(key.clone(), value.clone());
    }

    if config.is_dev() {
        if let Some(key) = config.dev.reload_command.key() {
            add_reload_command(&mut manifest, key, &mut warnings);
        }
    }

    let version_name = manifest.get("version_name").cloned();
    if config.browser.is_firefox() || version_name.as_ref() == manifest.get("version") {
        manifest.remove("version_name");
    }

    add_entrypoints(&mut manifest, config, &entrypoints, output, &mut warnings)?;

    if config.is_dev() {
        add_dev_permissions(&mut manifest, config);
    }

    match config.manifest_version {
        ManifestVersion::V2 => convert_to_mv2(&mut manifest, config, &mut warnings),
        ManifestVersion::V3 => validate_mv3(&manifest)?,
    }
    strip_keys(&mut manifest, config);

    if let Some(patch) = hooks.manifest_generated(&manifest) {
        let mut document = Value::Object(manifest);
        apply_merge_patch(&mut document, &patch);
        manifest = match document {
            Value::Object(map) => map,
            _ => Manifest::new(),
        };
    }

    if !manifest.get("name").is_some_and(Value::is_string) {
        return Err(Error::MissingManifestField("name"));
    }

    Ok(GeneratedManifest { manifest, warnings })
}

/// Write `manifest` to `<out_dir>/manifest.json` and record it in `output`.
///
/// The file is replaced atomically so an interrupted write never clobbers
/// the previous manifest.
pub async fn write_manifest(
    config: &ResolvedConfig,
    manifest: &Manifest,
    output: &mut BuildOutput,
) -> Result<()> {
    let text = if config.is_dev() {
        serde_json::to_string_pretty(manifest)?
    } else {
        serde_json::to_string(manifest)?
    };

    tokio::fs::create_dir_all(&config.out_dir)
        .await
        .map_err(Error::io(&config.out_dir))?;
    let dest = config.out_dir.join(MANIFEST_FILE);
    let temp = config.out_dir.join(format!(".{MANIFEST_FILE}.tmp"));
    tokio::fs::write(&temp, text).await.map_err(Error::io(&temp))?;
    tokio::fs::rename(&temp, &dest).await.map_err(Error::io(&dest))?;
    debug!(path = %dest.display(), "wrote manifest");

    output.manifest = manifest.clone();
    if !output.public_assets.iter().any(|a| a.file_name == MANIFEST_FILE) {
        output.public_assets.insert(
            0,
            OutputAsset {
                file_name: MANIFEST_FILE.to_string(),
            },
        );
    }
    Ok(())
}

/// Longest `X(.Y){0,3}` prefix of `version_name`.
pub fn simplify_version(version_name: &str) -> Result<String> {
    VERSION_PREFIX
        .captures(version_name)
        .map(|captures| captures[1].to_string())
        .ok_or_else(|| Error::InvalidVersion {
            version: version_name.to_string(),
        })
}

fn base_manifest(
    config: &ResolvedConfig,
    output: &BuildOutput,
    warnings: &mut Vec<String>,
) -> Result<Manifest> {
    let user = &config.manifest;
    let user_str = |key: &str| user.get(key).and_then(Value::as_str).map(str::to_string);

    let version_name = user_str("version_name")
        .or_else(|| user_str("version"))
        .or_else(|| config.package.version.clone())
        .unwrap_or_else(|| {
            warnings.push(
                "Extension version not found, defaulting to \"0.0.0\". Add a version to package.json or the manifest config."
                    .to_string(),
            );
            "0.0.0".to_string()
        });
    let version = match user_str("version") {
        Some(version) => version,
        None => simplify_version(&version_name)?,
    };

    let mut manifest = Manifest::new();
    manifest.insert(
        "manifest_version".into(),
        json!(config.manifest_version.as_u8()),
    );
    if let Some(name) = &config.package.name {
        manifest.insert("name".into(), json!(name));
    }
    if let Some(description) = &config.package.description {
        manifest.insert("description".into(), json!(description));
    }
    manifest.insert("version".into(), json!(version));
    manifest.insert("version_name".into(), json!(version_name));
    if let Some(icons) = discover_icons(&output.public_assets) {
        manifest.insert("icons".into(), Value::Object(icons));
    }
    Ok(manifest)
}

fn add_reload_command(manifest: &mut Manifest, key: &str, warnings: &mut Vec<String>) {
    with_object(manifest, "commands", |commands| {
        let with_keys = commands
            .values()
            .filter(|command| command.get("suggested_key").is_some())
            .count();
        if with_keys >= MAX_SUGGESTED_KEYS {
            warnings.push(format!(
                "Extension already has {} commands with a suggested key, skipping the {} command",
                with_keys, RELOAD_COMMAND
            ));
            return;
        }
        commands.insert(
            RELOAD_COMMAND.into(),
            json!({
                "description": "Reload the extension during development",
                "suggested_key": { "default": key },
            }),
        );
    });
}

fn add_entrypoints(
    manifest: &mut Manifest,
    config: &ResolvedConfig,
    entrypoints: &[&Entrypoint],
    output: &BuildOutput,
    warnings: &mut Vec<String>,
) -> Result<()> {
    let out_dir = &config.out_dir;
    let browser = &config.browser;
    let of_type = |kind: EntrypointType| {
        entrypoints
            .iter()
            .copied()
            .filter(move |e| e.entrypoint_type() == kind)
    };

    if let Some(entry) = of_type(EntrypointType::Background).next() {
        let script = entry.bundle_path(out_dir, ".js");
        let options = entry.background_options().cloned().unwrap_or_default();
        let mut background = Map::new();
        if config.is_mv3() {
            if browser.is_firefox() {
                background.insert("scripts".into(), json!([script]));
            } else {
                background.insert("service_worker".into(), json!(script));
            }
            if let Some(module_type) = options.module_type {
                background.insert("type".into(), json!(module_type));
            }
        } else {
            background.insert("scripts".into(), json!([script]));
            if let Some(persistent) = options.persistent {
                background.insert("persistent".into(), json!(persistent));
            }
        }
        manifest.insert("background".into(), Value::Object(background));
    }

    if let Some(entry) = of_type(EntrypointType::Popup).next() {
        if let EntrypointOptions::Popup(options) = &entry.options {
            let key = if config.is_mv3() {
                "action"
            } else {
                options.mv2_key.as_str()
            };
            let mut action = match manifest.remove("action") {
                Some(Value::Object(action)) => action,
                _ => Map::new(),
            };
            if let Some(Value::Object(existing)) = manifest.remove(key) {
                action.extend(existing);
            }
            action.insert(
                "default_popup".into(),
                json!(entry.bundle_path(out_dir, ".html")),
            );
            if let Some(title) = &options.default_title {
                action.insert("default_title".into(), json!(title));
            }
            if let Some(icon) = &options.default_icon {
                action.insert("default_icon".into(), icon.clone());
            }
            if let Some(style) = options.browser_style {
                action.insert("browser_style".into(), json!(style));
            }
            manifest.insert(key.into(), Value::Object(action));
        }
    }

    if let Some(entry) = of_type(EntrypointType::Options).next() {
        if let EntrypointOptions::Options(options) = &entry.options {
            let mut options_ui = Map::new();
            options_ui.insert("page".into(), json!(entry.bundle_path(out_dir, ".html")));
            if let Some(open_in_tab) = options.open_in_tab {
                options_ui.insert("open_in_tab".into(), json!(open_in_tab));
            }
            if browser.is_firefox() {
                if let Some(style) = options.browser_style {
                    options_ui.insert("browser_style".into(), json!(style));
                }
            } else if let Some(style) = options.chrome_style {
                options_ui.insert("chrome_style".into(), json!(style));
            }
            manifest.insert("options_ui".into(), Value::Object(options_ui));
        }
    }

    let sidepanels: Vec<&Entrypoint> = of_type(EntrypointType::Sidepanel).collect();
    let sidepanel = sidepanels
        .iter()
        .find(|e| e.name == "sidepanel")
        .or_else(|| sidepanels.first());
    if let Some(entry) = sidepanel {
        let page = entry.bundle_path(out_dir, ".html");
        if browser.is_firefox() {
            let mut sidebar = Map::new();
            sidebar.insert("default_panel".into(), json!(page));
            if let EntrypointOptions::Sidepanel(options) = &entry.options {
                if let Some(style) = options.browser_style {
                    sidebar.insert("browser_style".into(), json!(style));
                }
                if let Some(icon) = &options.default_icon {
                    sidebar.insert("default_icon".into(), icon.clone());
                }
                if let Some(title) = &options.default_title {
                    sidebar.insert("default_title".into(), json!(title));
                }
                if let Some(open) = options.open_at_install {
                    sidebar.insert("open_at_install".into(), json!(open));
                }
            }
            manifest.insert("sidebar_action".into(), Value::Object(sidebar));
        } else if config.is_mv3() {
            manifest.insert("side_panel".into(), json!({ "default_path": page }));
            add_permissions(manifest, ["sidePanel".to_string()]);
        } else {
            warnings.push(
                "Side panel not supported by Chromium using MV2, the sidepanel entrypoint is ignored"
                    .to_string(),
            );
        }
    }

    for kind in [
        EntrypointType::Newtab,
        EntrypointType::History,
        EntrypointType::Bookmarks,
    ] {
        let Some(entry) = of_type(kind).next() else {
            continue;
        };
        if browser.is_firefox() && kind != EntrypointType::Newtab {
            warnings.push(format!(
                "Firefox does not support overriding the {kind} page, the {} entrypoint is ignored",
                entry.name
            ));
            continue;
        }
        let page = entry.bundle_path(out_dir, ".html");
        with_object(manifest, "chrome_url_overrides", |overrides| {
            overrides.insert(kind.as_str().into(), json!(page));
        });
    }

    if let Some(entry) = of_type(EntrypointType::Devtools).next() {
        manifest.insert(
            "devtools_page".into(),
            json!(entry.bundle_path(out_dir, ".html")),
        );
    }

    let sandboxes: Vec<Value> = of_type(EntrypointType::Sandbox)
        .map(|e| json!(e.bundle_path(out_dir, ".html")))
        .collect();
    if !sandboxes.is_empty() {
        if browser.is_firefox() {
            warnings.push(
                "Sandboxed pages are not supported by Firefox, sandbox.pages is left out of the manifest"
                    .to_string(),
            );
        } else {
            with_object(manifest, "sandbox", |sandbox| {
                sandbox.insert("pages".into(), Value::Array(sandboxes));
            });
        }
    }

    content_scripts::add_content_scripts(manifest, config, entrypoints, output)
}

/// Let the reload client reach the dev server and reload tabs.
fn add_dev_permissions(manifest: &mut Manifest, config: &ResolvedConfig) {
    let host = format!("http://{}/*", config.dev.hostname);
    if config.is_mv3() {
        add_host_permissions(manifest, [host]);
        add_permissions(manifest, ["tabs".to_string(), "scripting".to_string()]);
    } else {
        add_permissions(manifest, [host, "tabs".to_string()]);
    }

    let origin = config.dev_server_origin();
    let existing = manifest.get("content_security_policy");
    if config.is_mv3() {
        let policy = |key: &str, default: &str| {
            existing
                .and_then(|csp| match csp {
                    Value::String(flat) if key == "extension_pages" => Some(flat.as_str()),
                    _ => csp.get(key).and_then(Value::as_str),
                })
                .unwrap_or(default)
                .to_string()
        };
        let mut pages = ContentSecurityPolicy::parse(&policy(
            "extension_pages",
            DEFAULT_MV3_EXTENSION_PAGES_CSP,
        ));
        pages.add("script-src", [origin.as_str()]);
        let csp = if config.browser.is_firefox() {
            json!(pages.to_string())
        } else {
            let mut sandbox = ContentSecurityPolicy::parse(&policy("sandbox", DEFAULT_MV3_SANDBOX_CSP));
            sandbox.add("script-src", [origin.as_str()]);
            json!({ "extension_pages": pages.to_string(), "sandbox": sandbox.to_string() })
        };
        manifest.insert("content_security_policy".into(), csp);
    } else {
        let mut csp = ContentSecurityPolicy::parse(
            existing.and_then(Value::as_str).unwrap_or(DEFAULT_MV2_CSP),
        );
        csp.add("script-src", [origin]);
        manifest.insert("content_security_policy".into(), json!(csp.to_string()));
    }
}

fn convert_to_mv2(manifest: &mut Manifest, config: &ResolvedConfig, warnings: &mut Vec<String>) {
    if let Some(Value::Array(resources)) = manifest.get_mut("web_accessible_resources") {
        if resources.iter().any(Value::is_object) {
            let mut flat: Vec<Value> = Vec::new();
            for item in resources.drain(..) {
                let paths = match item {
                    Value::Object(mut object) => match object.remove("resources") {
                        Some(Value::Array(paths)) => paths,
                        _ => Vec::new(),
                    },
                    other => vec![other],
                };
                for path in paths {
                    if !flat.contains(&path) {
                        flat.push(path);
                    }
                }
            }
            *resources = flat;
            warnings.push(
                "web_accessible_resources were converted from MV3 objects to MV2 strings".to_string(),
            );
        }
    }

    if let Some(action) = manifest.remove("action") {
        if !manifest.contains_key("browser_action") && !manifest.contains_key("page_action") {
            manifest.insert("browser_action".into(), action);
        }
    }

    let flattened = match manifest.get("content_security_policy") {
        Some(Value::Object(csp)) => Some(csp.get("extension_pages").cloned()),
        _ => None,
    };
    match flattened {
        Some(Some(pages)) => {
            manifest.insert("content_security_policy".into(), pages);
        }
        Some(None) => {
            manifest.remove("content_security_policy");
        }
        None => {}
    }

    if config.browser.is_firefox() {
        if let Some(Value::Array(hosts)) = manifest.remove("host_permissions") {
            add_permissions(
                manifest,
                hosts.into_iter().filter_map(|h| h.as_str().map(str::to_string)),
            );
        }
    }
}

fn validate_mv3(manifest: &Manifest) -> Result<()> {
    let strings: Vec<String> = manifest
        .get("web_accessible_resources")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|item| item.as_str().map(str::to_string))
        .collect();
    if strings.is_empty() {
        Ok(())
    } else {
        Err(Error::Mv2WebAccessibleResources { resources: strings })
    }
}

fn strip_keys(manifest: &mut Manifest, config: &ResolvedConfig) {
    let mut remove: Vec<&str> = match config.manifest_version {
        ManifestVersion::V2 => MV3_ONLY_KEYS.to_vec(),
        ManifestVersion::V3 => MV2_ONLY_KEYS.to_vec(),
    };
    if config.browser.is_firefox() {
        remove.extend(CHROMIUM_ONLY_KEYS);
        if config.manifest_version == ManifestVersion::V2 {
            remove.push("host_permissions");
        }
    } else {
        remove.extend(FIREFOX_ONLY_KEYS);
    }
    for key in remove {
        if manifest.remove(key).is_some() {
            debug!(key, "removed unsupported manifest key");
        }
    }
}

/// Run `update` on the object at `key`, replacing any non-object value.
fn with_object(
    manifest: &mut Manifest,
    key: &str,
    update: impl FnOnce(&mut Map<String, Value>),
) {
    let mut object = match manifest.remove(key) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    update(&mut object);
    manifest.insert(key.to_string(), Value::Object(object));
}

/// Append `items` to the array at `key`, creating it if needed.
fn push_array(manifest: &mut Manifest, key: &str, items: Vec<Value>) {
    let value = manifest
        .entry(key.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    match value {
        Value::Array(array) => array.extend(items),
        other => *other = Value::Array(items),
    }
}

fn add_unique(manifest: &mut Manifest, key: &str, items: impl IntoIterator<Item = String>) {
    let mut additions = Vec::new();
    let existing: Vec<Value> = manifest
        .get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    for item in items {
        let item = Value::String(item);
        if !existing.contains(&item) && !additions.contains(&item) {
            additions.push(item);
        }
    }
    if !additions.is_empty() {
        push_array(manifest, key, additions);
    }
}

fn add_permissions(manifest: &mut Manifest, items: impl IntoIterator<Item = String>) {
    add_unique(manifest, "permissions", items);
}

fn add_host_permissions(
    manifest: &mut Manifest,
    items: impl IntoIterator<Item = String>,
) {
    add_unique(manifest, "host_permissions", items);
}
