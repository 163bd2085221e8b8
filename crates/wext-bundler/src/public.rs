//! Public assets: static files copied byte-for-byte into the output.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::entrypoints::to_slash;
use crate::error::{Error, Result};
use crate::output::OutputAsset;

#[derive(Debug, Clone, PartialEq)]
pub enum PublicFileSource {
    Path(PathBuf),
    Contents(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublicFile {
    /// Destination relative to the output directory, `/`-separated.
    pub relative_dest: String,
    pub source: PublicFileSource,
}

/// List every file under `public_dir`, sorted by destination.
pub fn list_public_files(public_dir: &Path) -> Result<Vec<PublicFile>> {
    if !public_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(public_dir).follow_links(true) {
        let entry = entry.map_err(|err| Error::Io {
            path: public_dir.to_path_buf(),
            source: err.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(public_dir).unwrap_or(entry.path());
        files.push(PublicFile {
            relative_dest: to_slash(relative),
            source: PublicFileSource::Path(entry.path().to_path_buf()),
        });
    }
    files.sort_by(|a, b| a.relative_dest.cmp(&b.relative_dest));
    Ok(files)
}

/// Apply a hook delta to the user's public files.
///
/// Removals apply first. An added file whose destination is already taken by
/// a user file is dropped: the user's file wins.
pub fn apply_delta(
    mut files: Vec<PublicFile>,
    delta: crate::hooks::PublicAssetsDelta,
) -> Vec<PublicFile> {
    files.retain(|file| !delta.remove.contains(&file.relative_dest));
    for added in delta.add {
        if files.iter().any(|f| f.relative_dest == added.relative_dest) {
            debug!(dest = %added.relative_dest, "public file provided by the project, keeping it");
            continue;
        }
        files.push(added);
    }
    files
}

/// Copy `files` into `out_dir`.
pub async fn copy_public_files(files: &[PublicFile], out_dir: &Path) -> Result<Vec<OutputAsset>> {
    let mut assets = Vec::with_capacity(files.len());
    for file in files {
        let dest = out_dir.join(&file.relative_dest);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(Error::io(parent))?;
        }
        match &file.source {
            PublicFileSource::Path(src) => {
                tokio::fs::copy(src, &dest).await.map_err(Error::io(src))?;
            }
            PublicFileSource::Contents(contents) => {
                tokio::fs::write(&dest, contents)
                    .await
                    .map_err(Error::io(&dest))?;
            }
        }
        assets.push(OutputAsset {
            file_name: file.relative_dest.clone(),
        });
    }
    Ok(assets)
}
