//! Decides how much work a batch of changed files requires.
//!
//! Classification is synchronous and performs no I/O, so it can run straight
//! from a file-watch callback.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use wext_config::ResolvedConfig;

use crate::entrypoints::{EntrypointType, to_slash};
use crate::grouping::EntrypointGroup;
use crate::output::{BuildOutput, BuildStepOutput, OutputFile, StepId};

/// What a batch of changed files requires.
#[derive(Debug, Clone)]
pub enum DevModeChange {
    /// Nothing built depends on the changed files.
    NoChange,
    /// Only HTML pages changed; reload those pages in place.
    HtmlReload {
        rebuild_groups: Vec<EntrypointGroup>,
        cached_output: BuildOutput,
    },
    /// Only content scripts are affected; re-inject them.
    ContentScriptReload {
        rebuild_groups: Vec<EntrypointGroup>,
        cached_output: BuildOutput,
    },
    /// Rebuild `rebuild_groups` and reload the whole extension.
    ExtensionReload {
        rebuild_groups: Vec<EntrypointGroup>,
        cached_output: BuildOutput,
    },
    /// Restart the browser only; nothing is rebuilt.
    BrowserRestart,
    /// Re-resolve the config and rebuild everything.
    FullRestart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    NoChange,
    HtmlReload,
    ContentScriptReload,
    ExtensionReload,
    BrowserRestart,
    FullRestart,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoChange => "no-change",
            Self::HtmlReload => "html-reload",
            Self::ContentScriptReload => "content-script-reload",
            Self::ExtensionReload => "extension-reload",
            Self::BrowserRestart => "browser-restart",
            Self::FullRestart => "full-restart",
        }
    }

    /// Restarts skip the incremental rebuild entirely.
    pub fn is_restart(self) -> bool {
        matches!(self, Self::BrowserRestart | Self::FullRestart)
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DevModeChange {
    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::NoChange => ChangeKind::NoChange,
            Self::HtmlReload { .. } => ChangeKind::HtmlReload,
            Self::ContentScriptReload { .. } => ChangeKind::ContentScriptReload,
            Self::ExtensionReload { .. } => ChangeKind::ExtensionReload,
            Self::BrowserRestart => ChangeKind::BrowserRestart,
            Self::FullRestart => ChangeKind::FullRestart,
        }
    }

    /// Groups to rebuild; empty for restarts and no-ops.
    pub fn rebuild_groups(&self) -> &[EntrypointGroup] {
        match self {
            Self::HtmlReload { rebuild_groups, .. }
            | Self::ContentScriptReload { rebuild_groups, .. }
            | Self::ExtensionReload { rebuild_groups, .. } => rebuild_groups,
            _ => &[],
        }
    }
}

/// Restart required by `changed`, if any.
///
/// The config file and anything under the modules directory need a full
/// restart; the browser runner config only a browser restart. A full restart
/// wins over a browser restart in the same batch.
pub fn detect_restart(config: &ResolvedConfig, changed: &[PathBuf]) -> Option<ChangeKind> {
    let is_config = |path: &Path| config.config_file.as_deref() == Some(path);
    if changed
        .iter()
        .any(|path| is_config(path) || path.starts_with(&config.modules_dir))
    {
        return Some(ChangeKind::FullRestart);
    }
    if changed
        .iter()
        .any(|path| path.as_path() == config.runner_config_file)
    {
        return Some(ChangeKind::BrowserRestart);
    }
    None
}

/// Classify `changed` against the output of the last build.
pub fn detect_dev_changes(
    config: &ResolvedConfig,
    changed: &[PathBuf],
    current: &BuildOutput,
) -> DevModeChange {
    match detect_restart(config, changed) {
        Some(ChangeKind::FullRestart) => return DevModeChange::FullRestart,
        Some(_) => return DevModeChange::BrowserRestart,
        None => {}
    }

    let changed_paths: Vec<String> = changed.iter().map(|p| to_slash(p)).collect();
    let effected: HashSet<StepId> = current
        .steps
        .iter()
        .filter(|step| {
            changed_paths
                .iter()
                .any(|path| step.chunks.iter().any(|chunk| is_chunk_effected(chunk, path)))
        })
        .map(BuildStepOutput::id)
        .collect();

    if effected.is_empty() {
        let public_changed = changed.iter().any(|p| p.starts_with(&config.public_dir));
        return if public_changed {
            DevModeChange::ExtensionReload {
                rebuild_groups: Vec::new(),
                cached_output: current.clone(),
            }
        } else {
            DevModeChange::NoChange
        };
    }

    let (changed_steps, unaffected): (Vec<BuildStepOutput>, Vec<BuildStepOutput>) = current
        .steps
        .iter()
        .cloned()
        .partition(|step| effected.contains(&step.id()));
    let rebuild_groups: Vec<EntrypointGroup> =
        changed_steps.iter().map(|s| s.entrypoints.clone()).collect();
    let cached_output = BuildOutput {
        manifest: current.manifest.clone(),
        public_assets: current.public_assets.clone(),
        steps: unaffected,
    };

    let html_only = changed_paths.iter().all(|path| path.ends_with(".html"));
    if html_only {
        return DevModeChange::HtmlReload {
            rebuild_groups,
            cached_output,
        };
    }

    let content_scripts_only = changed_steps
        .iter()
        .flat_map(|step| step.entrypoints.entrypoints())
        .all(|entry| entry.entrypoint_type() == EntrypointType::ContentScript);
    if content_scripts_only {
        return DevModeChange::ContentScriptReload {
            rebuild_groups,
            cached_output,
        };
    }

    DevModeChange::ExtensionReload {
        rebuild_groups,
        cached_output,
    }
}

fn is_chunk_effected(chunk: &OutputFile, changed_path: &str) -> bool {
    match chunk {
        OutputFile::Asset(asset) => {
            let collapsed = changed_path.replace("/index.html", ".html");
            ends_with_path(&collapsed, &asset.file_name)
        }
        OutputFile::Chunk(chunk) => {
            let changed = strip_query(changed_path);
            chunk
                .module_ids
                .iter()
                .any(|id| strip_query(id) == changed)
        }
    }
}

/// `path` ends with `suffix` at a `/` boundary.
fn ends_with_path(path: &str, suffix: &str) -> bool {
    match path.strip_suffix(suffix) {
        Some(rest) => rest.is_empty() || rest.ends_with('/'),
        None => false,
    }
}

fn strip_query(id: &str) -> &str {
    id.split_once('?').map_or(id, |(path, _)| path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entrypoints::{ContentScriptOptions, Entrypoint, EntrypointOptions};
    use wext_config::{Command, InlineConfig, UserConfig};

    fn config() -> ResolvedConfig {
        ResolvedConfig::resolve(
            Path::new("/root"),
            UserConfig::default(),
            Some(PathBuf::from("/root/wext.toml")),
            Command::Serve,
            InlineConfig::default(),
        )
        .unwrap()
    }

    fn entry(name: &str, options: EntrypointOptions) -> Entrypoint {
        Entrypoint {
            name: name.into(),
            input_path: PathBuf::from(format!("/root/entrypoints/{name}")),
            output_dir: PathBuf::from("/root/.output/chrome-mv3"),
            skipped: false,
            options,
        }
    }

    fn page_step(name: &str) -> BuildStepOutput {
        BuildStepOutput::new(
            EntrypointGroup::Shared(vec![entry(name, EntrypointOptions::UnlistedPage)]),
            vec![
                OutputFile::asset(format!("{name}.html")),
                OutputFile::chunk(
                    format!("chunks/{name}.js"),
                    vec![format!("/root/entrypoints/{name}/main.ts")],
                ),
            ],
        )
    }

    fn content_step(name: &str, modules: &[&str]) -> BuildStepOutput {
        BuildStepOutput::new(
            EntrypointGroup::Single(entry(
                name,
                EntrypointOptions::ContentScript(ContentScriptOptions::default()),
            )),
            vec![OutputFile::chunk(
                format!("content-scripts/{name}.js"),
                modules.iter().map(|m| m.to_string()).collect(),
            )],
        )
    }

    fn background_step() -> BuildStepOutput {
        BuildStepOutput::new(
            EntrypointGroup::Single(entry(
                "background",
                EntrypointOptions::Background(Default::default()),
            )),
            vec![OutputFile::chunk(
                "background.js",
                vec![
                    "/root/entrypoints/background.ts".into(),
                    "/root/utils/shared.ts".into(),
                ],
            )],
        )
    }

    fn output(steps: Vec<BuildStepOutput>) -> BuildOutput {
        BuildOutput {
            steps,
            ..Default::default()
        }
    }

    #[test]
    fn config_file_forces_full_restart() {
        let current = output(vec![page_step("page1")]);
        let change = detect_dev_changes(
            &config(),
            &[
                PathBuf::from("/root/page1.html"),
                PathBuf::from("/root/wext.toml"),
            ],
            &current,
        );
        assert_eq!(change.kind(), ChangeKind::FullRestart);
    }

    #[test]
    fn modules_dir_forces_full_restart() {
        let change = detect_dev_changes(
            &config(),
            &[PathBuf::from("/root/modules/analytics/index.ts")],
            &BuildOutput::default(),
        );
        assert_eq!(change.kind(), ChangeKind::FullRestart);
    }

    #[test]
    fn runner_config_restarts_browser() {
        let change = detect_dev_changes(
            &config(),
            &[PathBuf::from("/root/wext-runner.toml")],
            &BuildOutput::default(),
        );
        assert_eq!(change.kind(), ChangeKind::BrowserRestart);
    }

    #[test]
    fn html_change_reloads_only_its_page() {
        let page1 = page_step("page1");
        let page2 = page_step("page2");
        let current = output(vec![page1.clone(), page2.clone()]);

        let change = detect_dev_changes(&config(), &[PathBuf::from("/root/page1.html")], &current);
        let DevModeChange::HtmlReload {
            rebuild_groups,
            cached_output,
        } = change
        else {
            panic!("expected html-reload");
        };
        assert_eq!(rebuild_groups, vec![page1.entrypoints.clone()]);
        assert_eq!(cached_output.step_ids(), vec![page2.id()]);
    }

    #[test]
    fn index_html_collapses_to_page_name() {
        let current = output(vec![page_step("popup")]);
        let change = detect_dev_changes(
            &config(),
            &[PathBuf::from("/root/entrypoints/popup/index.html")],
            &current,
        );
        assert_eq!(change.kind(), ChangeKind::HtmlReload);
    }

    #[test]
    fn asset_match_respects_path_boundary() {
        let current = output(vec![page_step("page1")]);
        let change = detect_dev_changes(&config(), &[PathBuf::from("/root/mypage1.html")], &current);
        assert_eq!(change.kind(), ChangeKind::NoChange);
    }

    #[test]
    fn content_script_module_triggers_reinjection() {
        let overlay = content_step("overlay", &["/root/entrypoints/overlay.content.ts", "/root/utils/dom.ts"]);
        let current = output(vec![background_step(), overlay.clone()]);

        let change = detect_dev_changes(&config(), &[PathBuf::from("/root/utils/dom.ts")], &current);
        let DevModeChange::ContentScriptReload {
            rebuild_groups,
            cached_output,
        } = change
        else {
            panic!("expected content-script-reload");
        };
        assert_eq!(rebuild_groups, vec![overlay.entrypoints.clone()]);
        assert!(!cached_output.step_ids().contains(&overlay.id()));
        assert_eq!(cached_output.steps.len(), 1);
    }

    #[test]
    fn query_suffix_is_ignored_when_matching_modules() {
        let overlay = content_step("overlay", &["/root/entrypoints/overlay.css?inline"]);
        let current = output(vec![overlay]);
        let change = detect_dev_changes(
            &config(),
            &[PathBuf::from("/root/entrypoints/overlay.css")],
            &current,
        );
        assert_eq!(change.kind(), ChangeKind::ContentScriptReload);
    }

    #[test]
    fn shared_module_reloads_extension() {
        let current = output(vec![
            background_step(),
            content_step("overlay", &["/root/utils/shared.ts"]),
        ]);
        let change = detect_dev_changes(&config(), &[PathBuf::from("/root/utils/shared.ts")], &current);
        assert_eq!(change.kind(), ChangeKind::ExtensionReload);
        assert_eq!(change.rebuild_groups().len(), 2);
    }

    #[test]
    fn public_file_reloads_without_rebuilding() {
        let current = output(vec![background_step()]);
        let change = detect_dev_changes(&config(), &[PathBuf::from("/root/public/icon/16.png")], &current);
        let DevModeChange::ExtensionReload {
            rebuild_groups,
            cached_output,
        } = change
        else {
            panic!("expected extension-reload");
        };
        assert!(rebuild_groups.is_empty());
        assert_eq!(cached_output.step_ids(), current.step_ids());
    }

    #[test]
    fn unrelated_file_is_no_change() {
        let current = output(vec![background_step()]);
        let change = detect_dev_changes(&config(), &[PathBuf::from("/root/README.md")], &current);
        assert_eq!(change.kind(), ChangeKind::NoChange);
    }
}
