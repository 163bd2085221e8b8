//! Generated TypeScript declarations under `.wext/types`.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::PathBuf;

use tracing::debug;
use wext_config::ResolvedConfig;

use crate::entrypoints::{Entrypoint, EntrypointType};
use crate::error::{Error, Result};
use crate::public::PublicFile;

pub const PATHS_DECLARATION: &str = "types/paths.d.ts";

/// Write `paths.d.ts`, declaring every path reachable with `runtime.getURL`.
///
/// The file is only rewritten when its contents change.
pub async fn write_path_types(
    config: &ResolvedConfig,
    entrypoints: &[Entrypoint],
    public_files: &[PublicFile],
) -> Result<PathBuf> {
    let path = config.wext_dir.join(PATHS_DECLARATION);
    let contents = render_path_types(config, entrypoints, public_files);

    if tokio::fs::read_to_string(&path).await.ok().as_deref() == Some(contents.as_str()) {
        return Ok(path);
    }
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(Error::io(parent))?;
    }
    tokio::fs::write(&path, contents)
        .await
        .map_err(Error::io(&path))?;
    debug!(path = %path.display(), "wrote path types");
    Ok(path)
}

fn render_path_types(
    config: &ResolvedConfig,
    entrypoints: &[Entrypoint],
    public_files: &[PublicFile],
) -> String {
    let mut paths: BTreeSet<String> = public_files
        .iter()
        .map(|file| format!("/{}", file.relative_dest))
        .collect();
    for entry in entrypoints.iter().filter(|e| !e.skipped && !e.is_virtual()) {
        let kind = entry.entrypoint_type();
        if kind.is_html() || matches!(kind, EntrypointType::UnlistedScript | EntrypointType::ContentScript) {
            paths.insert(format!("/{}", entry.default_bundle_path(&config.out_dir)));
        }
    }

    let mut out = String::from("// Generated by wext. Do not edit.\nexport type PublicPath =\n  | \"/\"");
    for path in &paths {
        let _ = write!(out, "\n  | \"{}\"", path);
    }
    out.push_str(";\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entrypoints::{EntrypointOptions, output_dir_for};
    use crate::public::PublicFileSource;
    use wext_config::{Command, InlineConfig, UserConfig};

    fn entry(config: &ResolvedConfig, name: &str, options: EntrypointOptions) -> Entrypoint {
        Entrypoint {
            name: name.into(),
            input_path: PathBuf::from(format!("/ext/entrypoints/{name}")),
            output_dir: output_dir_for(options.entrypoint_type(), &config.out_dir),
            skipped: false,
            options,
        }
    }

    #[tokio::test]
    async fn declares_pages_scripts_and_public_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = ResolvedConfig::resolve(
            dir.path(),
            UserConfig::default(),
            None,
            Command::Build,
            InlineConfig::default(),
        )
        .unwrap();
        let entries = vec![
            entry(&config, "popup", EntrypointOptions::Popup(Default::default())),
            entry(&config, "injected", EntrypointOptions::UnlistedScript),
            entry(&config, "background", EntrypointOptions::Background(Default::default())),
        ];
        let public = vec![PublicFile {
            relative_dest: "icon/16.png".into(),
            source: PublicFileSource::Contents(vec![]),
        }];

        let path = write_path_types(&config, &entries, &public).await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "// Generated by wext. Do not edit.\nexport type PublicPath =\n  | \"/\"\n  | \"/icon/16.png\"\n  | \"/injected.js\"\n  | \"/popup.html\";\n"
        );
        assert!(path.ends_with(".wext/types/paths.d.ts"));
    }
}
