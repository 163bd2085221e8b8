//! Build output model.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::grouping::EntrypointGroup;
use crate::manifest::Manifest;

static NEXT_STEP_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a [`BuildStepOutput`].
///
/// Assigned once when a step is produced; clones carried forward into a
/// cached output keep it, so steps can be told apart across rebuilds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(u64);

impl StepId {
    fn next() -> Self {
        Self(NEXT_STEP_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    /// Path relative to the output directory, `/`-separated.
    pub file_name: String,
    /// Absolute paths of every source module in the chunk. May carry a
    /// `?query` import suffix.
    pub module_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputAsset {
    /// Path relative to the output directory, `/`-separated.
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFile {
    Chunk(OutputChunk),
    Asset(OutputAsset),
}

impl OutputFile {
    pub fn chunk(file_name: impl Into<String>, module_ids: Vec<String>) -> Self {
        Self::Chunk(OutputChunk {
            file_name: file_name.into(),
            module_ids,
        })
    }

    pub fn asset(file_name: impl Into<String>) -> Self {
        Self::Asset(OutputAsset {
            file_name: file_name.into(),
        })
    }

    pub fn file_name(&self) -> &str {
        match self {
            Self::Chunk(chunk) => &chunk.file_name,
            Self::Asset(asset) => &asset.file_name,
        }
    }
}

/// Files produced by building one group.
#[derive(Debug, Clone)]
pub struct BuildStepOutput {
    id: StepId,
    pub entrypoints: EntrypointGroup,
    pub chunks: Vec<OutputFile>,
}

impl BuildStepOutput {
    pub fn new(entrypoints: EntrypointGroup, chunks: Vec<OutputFile>) -> Self {
        Self {
            id: StepId::next(),
            entrypoints,
            chunks,
        }
    }

    pub fn id(&self) -> StepId {
        self.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    pub manifest: Manifest,
    pub public_assets: Vec<OutputAsset>,
    pub steps: Vec<BuildStepOutput>,
}

impl BuildOutput {
    /// Every emitted file name: public assets first, then step outputs.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.public_assets
            .iter()
            .map(|asset| asset.file_name.as_str())
            .chain(
                self.steps
                    .iter()
                    .flat_map(|step| step.chunks.iter().map(OutputFile::file_name)),
            )
    }

    pub fn step_ids(&self) -> Vec<StepId> {
        self.steps.iter().map(BuildStepOutput::id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entrypoints::{Entrypoint, EntrypointOptions};

    fn group() -> EntrypointGroup {
        EntrypointGroup::Single(Entrypoint {
            name: "injected".into(),
            input_path: "/ext/entrypoints/injected.ts".into(),
            output_dir: "/ext/.output/chrome-mv3".into(),
            skipped: false,
            options: EntrypointOptions::UnlistedScript,
        })
    }

    #[test]
    fn step_ids_are_unique_and_survive_clone() {
        let a = BuildStepOutput::new(group(), vec![]);
        let b = BuildStepOutput::new(group(), vec![]);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn file_names_list_assets_then_chunks() {
        let output = BuildOutput {
            manifest: Manifest::new(),
            public_assets: vec![OutputAsset {
                file_name: "icon/16.png".into(),
            }],
            steps: vec![BuildStepOutput::new(
                group(),
                vec![OutputFile::chunk("injected.js", vec![])],
            )],
        };
        assert_eq!(
            output.file_names().collect::<Vec<_>>(),
            vec!["icon/16.png", "injected.js"]
        );
    }
}
