//! File watcher for the dev loop.
//!
//! Watches the project root recursively. Changed paths are sent one by one
//! and grouped into batches by [`spawn_batcher`], so one save that touches
//! several files triggers one rebuild.

use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexSet;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::{CliError, Result};

pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    /// Watch `root`, skipping anything under `ignored` and hidden entries.
    pub fn new(root: PathBuf, ignored: Vec<PathBuf>) -> Result<(Self, mpsc::Receiver<PathBuf>)> {
        if !root.exists() {
            return Err(CliError::FileNotFound(root));
        }

        let (tx, rx) = mpsc::channel(256);
        let watch_root = root.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else { return };
            if !matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) {
                return;
            }
            for path in event.paths {
                if should_ignore(&path, &watch_root, &ignored) {
                    continue;
                }
                trace!(path = %path.display(), "file event");
                // Runs on notify's own thread, outside the runtime.
                let _ = tx.blocking_send(path);
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok((
            Self {
                _watcher: watcher,
                root,
            },
            rx,
        ))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Group paths arriving on `rx` into batches. A batch closes once no new
/// path has arrived for `window`. Paths are de-duplicated in arrival order.
pub fn spawn_batcher(
    mut rx: mpsc::Receiver<PathBuf>,
    window: Duration,
) -> mpsc::Receiver<Vec<PathBuf>> {
    let (tx, batches) = mpsc::channel(16);

    tokio::spawn(async move {
        while let Some(first) = rx.recv().await {
            let mut batch = IndexSet::new();
            batch.insert(first);
            let mut closed = false;

            loop {
                match tokio::time::timeout(window, rx.recv()).await {
                    Ok(Some(path)) => {
                        batch.insert(path);
                    }
                    Ok(None) => {
                        closed = true;
                        break;
                    }
                    Err(_) => break,
                }
            }

            if tx.send(batch.into_iter().collect()).await.is_err() || closed {
                return;
            }
        }
    });

    batches
}

/// Whether a changed path is irrelevant to the build.
fn should_ignore(path: &Path, root: &Path, ignored: &[PathBuf]) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return true;
    };
    if ignored.iter().any(|dir| path.starts_with(dir)) {
        return true;
    }
    relative.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .is_some_and(|name| name.starts_with('.') && name != "." && name != "..")
    })
}
