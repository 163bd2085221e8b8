//! The bundler collaborator.
//!
//! The pipeline decides *what* to build; a [`Builder`] turns one
//! [`EntrypointGroup`] into emitted files and reports them as a
//! [`BuildStepOutput`]. It also loads the declared options of script
//! entrypoints without executing their main logic.

mod static_builder;

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::grouping::EntrypointGroup;
use crate::output::BuildStepOutput;

pub use static_builder::{StaticBuilder, dev_client_script};

/// Error reported by a [`Builder`].
#[derive(Debug, thiserror::Error)]
pub enum BuilderError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait Builder: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Build every entrypoint of `group` as one unit.
    async fn build(&self, group: &EntrypointGroup) -> Result<BuildStepOutput, BuilderError>;

    /// Load the declared options of each script, in the order given.
    async fn import_entrypoints(
        &self,
        paths: &[PathBuf],
    ) -> Result<Vec<Map<String, Value>>, BuilderError>;
}
