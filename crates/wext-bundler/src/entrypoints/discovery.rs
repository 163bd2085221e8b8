use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::Map;
use tracing::{debug, warn};
use walkdir::WalkDir;
use wext_config::ResolvedConfig;

use super::html::manifest_options;
use super::options::{BackgroundOptions, BrowserFilter, EntrypointOptions};
use super::patterns::{entrypoint_name, match_entrypoint};
use super::{Entrypoint, EntrypointType, VIRTUAL_BACKGROUND, output_dir_for, to_slash};
use crate::builder::Builder;
use crate::error::{Error, Result};

/// Result of scanning the entrypoints directory.
#[derive(Debug, Clone)]
pub struct Discovery {
    /// In discovery order (sorted by path relative to the entrypoints dir).
    pub entrypoints: Vec<Entrypoint>,
    pub warnings: Vec<String>,
}

struct Candidate {
    name: String,
    kind: EntrypointType,
    input_path: PathBuf,
}

/// Find and classify every entrypoint under `config.entrypoints_dir`.
pub async fn find_entrypoints(config: &ResolvedConfig, builder: &dyn Builder) -> Result<Discovery> {
    let candidates = scan(&config.entrypoints_dir)?;
    if candidates.is_empty() {
        return Err(Error::NoEntrypointsFound {
            dir: config.entrypoints_dir.clone(),
        });
    }
    check_duplicate_names(&candidates)?;

    let script_paths: Vec<PathBuf> = candidates
        .iter()
        .filter(|c| c.kind.is_script())
        .map(|c| c.input_path.clone())
        .collect();
    let mut script_options = if script_paths.is_empty() {
        Vec::new()
    } else {
        builder
            .import_entrypoints(&script_paths)
            .await
            .map_err(Error::ImportFailed)?
    }
    .into_iter();

    let mut warnings = Vec::new();
    let mut browser_skipped = Vec::new();
    let mut entrypoints = Vec::with_capacity(candidates.len() + 1);

    for candidate in candidates {
        let raw = if candidate.kind.is_script() {
            script_options.next().unwrap_or_default()
        } else if candidate.kind.is_html() {
            let html = tokio::fs::read_to_string(&candidate.input_path)
                .await
                .map_err(Error::io(&candidate.input_path))?;
            manifest_options(&html).map_err(|message| Error::InvalidEntrypointOptions {
                path: candidate.input_path.clone(),
                message,
            })?
        } else {
            Map::new()
        };

        let invalid = |message: String| Error::InvalidEntrypointOptions {
            path: candidate.input_path.clone(),
            message,
        };
        let options =
            EntrypointOptions::from_raw(candidate.kind, &raw, &config.browser).map_err(invalid)?;
        let filter = BrowserFilter::from_raw(&raw).map_err(invalid)?;

        let skipped = match &config.filter_entrypoints {
            Some(allowed) => !allowed.contains(&candidate.name),
            None => match (&filter.include, &filter.exclude) {
                (Some(_), Some(_)) => {
                    let message = format!(
                        "Entrypoint \"{}\" sets both include and exclude; it will not be built",
                        candidate.name
                    );
                    warn!("{}", message);
                    warnings.push(message);
                    true
                }
                (None, Some(exclude)) => {
                    let skip = exclude.iter().any(|b| b == config.browser.as_str());
                    if skip {
                        browser_skipped.push(candidate.name.clone());
                    }
                    skip
                }
                (Some(include), None) => {
                    let skip = !include.iter().any(|b| b == config.browser.as_str());
                    if skip {
                        browser_skipped.push(candidate.name.clone());
                    }
                    skip
                }
                (None, None) => false,
            },
        };

        debug!(
            name = %candidate.name,
            kind = %candidate.kind,
            skipped,
            "discovered entrypoint"
        );
        entrypoints.push(Entrypoint {
            output_dir: output_dir_for(candidate.kind, &config.out_dir),
            name: candidate.name,
            input_path: candidate.input_path,
            skipped,
            options,
        });
    }

    if !browser_skipped.is_empty() {
        warnings.push(format!(
            "Skipped entrypoints for {}: {}",
            config.browser,
            browser_skipped.join(", ")
        ));
    }

    if config.is_dev()
        && !entrypoints
            .iter()
            .any(|e| e.entrypoint_type() == EntrypointType::Background)
    {
        if let Some(taken) = entrypoints.iter().find(|e| e.name == "background") {
            return Err(Error::DuplicateEntrypointNames {
                duplicates: vec![(
                    taken.name.clone(),
                    vec![taken.input_path.clone(), PathBuf::from(VIRTUAL_BACKGROUND)],
                )],
            });
        }
        debug!("no background entrypoint, adding one for dev reloads");
        entrypoints.push(Entrypoint {
            name: "background".to_string(),
            input_path: PathBuf::from(VIRTUAL_BACKGROUND),
            output_dir: config.out_dir.clone(),
            skipped: false,
            options: EntrypointOptions::Background(BackgroundOptions::default()),
        });
    }

    Ok(Discovery {
        entrypoints,
        warnings,
    })
}

fn scan(entrypoints_dir: &Path) -> Result<Vec<Candidate>> {
    if !entrypoints_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(entrypoints_dir).min_depth(1).max_depth(3) {
        let entry = entry.map_err(|err| Error::Io {
            path: entrypoints_dir.to_path_buf(),
            source: err.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = to_slash(entry.path().strip_prefix(entrypoints_dir).unwrap_or(entry.path()));
        let Some(kind) = match_entrypoint(&relative) else {
            continue;
        };
        found.push((relative, kind, entry.into_path()));
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found
        .into_iter()
        .map(|(relative, kind, input_path)| Candidate {
            name: entrypoint_name(&relative),
            kind,
            input_path,
        })
        .collect())
}

fn check_duplicate_names(candidates: &[Candidate]) -> Result<()> {
    let mut by_name: IndexMap<&str, Vec<PathBuf>> = IndexMap::new();
    for candidate in candidates {
        by_name
            .entry(candidate.name.as_str())
            .or_default()
            .push(candidate.input_path.clone());
    }

    let duplicates: Vec<(String, Vec<PathBuf>)> = by_name
        .into_iter()
        .filter(|(_, paths)| paths.len() > 1)
        .map(|(name, paths)| (name.to_string(), paths))
        .collect();

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(Error::DuplicateEntrypointNames { duplicates })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StaticBuilder;
    use std::fs;
    use wext_config::{Command, InlineConfig, TargetBrowser, UserConfig};

    fn write(root: &Path, path: &str, contents: &str) {
        let path = root.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn content_script(root: &Path, name: &str, filter: &str) {
        write(
            root,
            &format!("entrypoints/{name}.content.ts"),
            &format!(
                "export default defineContentScript({{ matches: ['<all_urls>'], {filter} main() {{}} }});\n"
            ),
        );
    }

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "entrypoints/popup.html", "<html></html>");
        content_script(root, "everywhere", "");
        content_script(root, "not-firefox", "exclude: ['firefox'],");
        content_script(root, "chrome-only", "include: ['chrome'],");
        content_script(root, "confused", "include: ['firefox'], exclude: ['chrome'],");
        dir
    }

    fn config(
        root: &Path,
        browser: &str,
        command: Command,
        filter: Option<&[&str]>,
    ) -> ResolvedConfig {
        ResolvedConfig::resolve(
            root,
            UserConfig::default(),
            None,
            command,
            InlineConfig {
                browser: Some(TargetBrowser::new(browser)),
                filter_entrypoints: filter.map(|names| names.iter().map(|n| n.to_string()).collect()),
                ..Default::default()
            },
        )
        .unwrap()
    }

    async fn discover(config: &ResolvedConfig) -> Result<Discovery> {
        find_entrypoints(config, &StaticBuilder::new(config)).await
    }

    fn skipped(discovery: &Discovery) -> Vec<&str> {
        discovery
            .entrypoints
            .iter()
            .filter(|e| e.skipped)
            .map(|e| e.name.as_str())
            .collect()
    }

    #[tokio::test]
    async fn exclude_skips_only_the_listed_browser() {
        let dir = project();
        let chrome = discover(&config(dir.path(), "chrome", Command::Build, None))
            .await
            .unwrap();
        assert!(!skipped(&chrome).contains(&"not-firefox"));

        let firefox = discover(&config(dir.path(), "firefox", Command::Build, None))
            .await
            .unwrap();
        assert!(skipped(&firefox).contains(&"not-firefox"));
    }

    #[tokio::test]
    async fn include_and_exclude_together_warn_and_skip() {
        let dir = project();
        let discovery = discover(&config(dir.path(), "firefox", Command::Build, None))
            .await
            .unwrap();

        assert!(skipped(&discovery).contains(&"confused"));
        assert!(
            discovery
                .warnings
                .iter()
                .any(|w| w.contains("\"confused\" sets both include and exclude"))
        );
    }

    #[tokio::test]
    async fn browser_skips_are_summarized_in_one_warning() {
        let dir = project();
        let discovery = discover(&config(dir.path(), "firefox", Command::Build, None))
            .await
            .unwrap();

        assert_eq!(skipped(&discovery), vec!["chrome-only", "confused", "not-firefox"]);
        assert_eq!(
            discovery.warnings.last().map(String::as_str),
            Some("Skipped entrypoints for firefox: chrome-only, not-firefox")
        );
    }

    #[tokio::test]
    async fn filter_overrides_include_and_exclude() {
        let dir = project();
        let filter: &[&str] = &["not-firefox", "confused"];
        let discovery = discover(&config(dir.path(), "firefox", Command::Build, Some(filter)))
            .await
            .unwrap();

        assert_eq!(skipped(&discovery), vec!["chrome-only", "everywhere", "popup"]);
        assert!(discovery.warnings.is_empty());
    }

    #[tokio::test]
    async fn dev_background_is_added_when_missing() {
        let dir = project();
        let discovery = discover(&config(dir.path(), "chrome", Command::Serve, None))
            .await
            .unwrap();
        let background = discovery.entrypoints.last().unwrap();
        assert!(background.is_virtual());
        assert_eq!(background.name, "background");
    }

    #[tokio::test]
    async fn dev_background_name_must_be_free() {
        let dir = project();
        write(dir.path(), "entrypoints/background.html", "<html></html>");
        let err = discover(&config(dir.path(), "chrome", Command::Serve, None))
            .await
            .unwrap_err();

        let Error::DuplicateEntrypointNames { duplicates } = err else {
            panic!("expected duplicate names");
        };
        assert_eq!(duplicates[0].0, "background");
        assert_eq!(duplicates[0].1[1], PathBuf::from(VIRTUAL_BACKGROUND));
    }
}
