use std::path::{Path, PathBuf};

use crate::builder::BuilderError;

/// Error types for wext-bundler operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No entrypoints were discovered.
    #[error("No entrypoints found in {}", dir.display())]
    NoEntrypointsFound { dir: PathBuf },

    /// Two or more entrypoints derive the same name.
    #[error("Multiple entrypoints with the same name detected:\n{}", format_duplicates(.duplicates))]
    DuplicateEntrypointNames {
        duplicates: Vec<(String, Vec<PathBuf>)>,
    },

    /// The builder failed on a group; remaining groups were not built.
    #[error("Failed to build {entrypoints}: {source}")]
    BuildFailed {
        entrypoints: String,
        #[source]
        source: BuilderError,
    },

    /// Loading declared options from script entrypoints failed.
    #[error("Failed to load entrypoint options: {0}")]
    ImportFailed(#[source] BuilderError),

    /// MV2 has no API for registering content scripts at runtime.
    #[error("Content scripts with registration \"runtime\" are not supported in MV2: {}", names.join(", "))]
    RuntimeContentScriptMv2 { names: Vec<String> },

    /// MV3 manifests only accept `{ matches, resources }` objects.
    #[error("Non-MV3 web_accessible_resources detected: {}", resources.join(", "))]
    Mv2WebAccessibleResources { resources: Vec<String> },

    #[error("Manifest is missing required field '{0}'")]
    MissingManifestField(&'static str),

    #[error("Cannot convert version \"{version}\" to a valid extension version")]
    InvalidVersion { version: String },

    #[error("Invalid options in {}: {message}", path.display())]
    InvalidEntrypointOptions { path: PathBuf, message: String },

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// I/O error with the path it happened on.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] wext_config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for wext-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl AsRef<Path>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        move |source| Error::Io { path, source }
    }
}

fn format_duplicates(duplicates: &[(String, Vec<PathBuf>)]) -> String {
    duplicates
        .iter()
        .map(|(name, paths)| {
            let files = paths
                .iter()
                .map(|p| format!("    - {}", p.display()))
                .collect::<Vec<_>>()
                .join("\n");
            format!("  - {name}\n{files}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::NoEntrypointsFound { .. } => "NO_ENTRYPOINTS",
            Error::DuplicateEntrypointNames { .. } => "DUPLICATE_ENTRYPOINT_NAMES",
            Error::BuildFailed { .. } => "BUILD_FAILED",
            Error::ImportFailed(_) => "IMPORT_FAILED",
            Error::RuntimeContentScriptMv2 { .. } => "RUNTIME_CONTENT_SCRIPT_MV2",
            Error::Mv2WebAccessibleResources { .. } => "MV2_WEB_ACCESSIBLE_RESOURCES",
            Error::MissingManifestField(_) => "MISSING_MANIFEST_FIELD",
            Error::InvalidVersion { .. } => "INVALID_VERSION",
            Error::InvalidEntrypointOptions { .. } => "INVALID_ENTRYPOINT_OPTIONS",
            Error::Parse { .. } => "PARSE_ERROR",
            Error::Io { .. } => "IO_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Json(_) => "JSON_ERROR",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::NoEntrypointsFound { dir } => Some(Box::new(format!(
                "Add at least one entrypoint (for example background.ts or popup.html) to {}",
                dir.display()
            ))),
            Error::DuplicateEntrypointNames { .. } => Some(Box::new(
                "Entrypoint names must be unique across every entrypoint type. Rename one of the files listed above.",
            )),
            Error::RuntimeContentScriptMv2 { .. } => Some(Box::new(
                "Use registration: \"manifest\" or target manifest version 3.",
            )),
            Error::Mv2WebAccessibleResources { .. } => Some(Box::new(
                "MV3 requires web_accessible_resources entries of the form { \"matches\": [...], \"resources\": [...] }.",
            )),
            Error::MissingManifestField(field) => Some(Box::new(format!(
                "Set \"{field}\" in package.json or in the manifest section of your config."
            ))),
            Error::InvalidVersion { .. } => Some(Box::new(
                "Extension versions must start with one to four dot-separated integers, like 1.2.3.",
            )),
            Error::InvalidEntrypointOptions { .. } => Some(Box::new(
                "Entrypoint options must be static literal values.",
            )),
            _ => None,
        }
    }
}
