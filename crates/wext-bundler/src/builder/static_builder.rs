//! Builder that emits each entrypoint as-is, without resolving imports.
//!
//! - HTML pages are copied to `<name>.html`.
//! - Styles are copied to `<name>.css`.
//!
//! Every emitted file is reported as a chunk carrying its source path, so
//! dev-mode classification matches edits by module id.
//! - JavaScript is copied; TypeScript and JSX have their syntax lowered by
//!   `oxc_transformer`.
//!
//! In development the background script gets the reload client prepended,
//! and the synthesized background is the reload client alone.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{TransformOptions, Transformer};
use serde_json::{Map, Value};
use tracing::debug;
use wext_config::ResolvedConfig;

use super::{Builder, BuilderError};
use crate::entrypoints::literal::script_options;
use crate::entrypoints::{Entrypoint, EntrypointType, to_slash};
use crate::grouping::EntrypointGroup;
use crate::output::{BuildStepOutput, OutputFile};

const DEV_CLIENT: &str = include_str!("../../assets/dev-client.js");

/// Reload client connecting to `origin`.
pub fn dev_client_script(origin: &str) -> String {
    DEV_CLIENT.replace("__WEXT_DEV_ORIGIN__", origin)
}

#[derive(Debug, Clone)]
pub struct StaticBuilder {
    out_dir: PathBuf,
    /// Set in development.
    dev_client: Option<String>,
}

impl StaticBuilder {
    pub fn new(config: &ResolvedConfig) -> Self {
        Self {
            out_dir: config.out_dir.clone(),
            dev_client: config
                .is_dev()
                .then(|| dev_client_script(&config.dev_server_origin())),
        }
    }

    async fn build_entrypoint(&self, entry: &Entrypoint) -> Result<OutputFile, BuilderError> {
        let kind = entry.entrypoint_type();
        let file_name = entry.default_bundle_path(&self.out_dir);
        let dest = self.out_dir.join(&file_name);

        if entry.is_virtual() {
            let code = self.dev_client.clone().unwrap_or_default();
            write(&dest, code.as_bytes()).await?;
            return Ok(OutputFile::chunk(file_name, Vec::new()));
        }

        let module_id = to_slash(&entry.input_path);
        if kind.is_html() || kind.is_style() {
            copy(&entry.input_path, &dest).await?;
            return Ok(OutputFile::chunk(file_name, vec![module_id]));
        }

        let source = tokio::fs::read_to_string(&entry.input_path)
            .await
            .map_err(|source| BuilderError::Read {
                path: entry.input_path.clone(),
                source,
            })?;
        let mut code = if needs_transform(&entry.input_path) {
            strip_types(&source, &entry.input_path)?
        } else {
            source
        };
        if kind == EntrypointType::Background {
            if let Some(client) = &self.dev_client {
                code = format!("{client}\n{code}");
            }
        }
        write(&dest, code.as_bytes()).await?;
        Ok(OutputFile::chunk(file_name, vec![module_id]))
    }
}

#[async_trait]
impl Builder for StaticBuilder {
    fn name(&self) -> &str {
        "static"
    }

    async fn build(&self, group: &EntrypointGroup) -> Result<BuildStepOutput, BuilderError> {
        let mut chunks = Vec::with_capacity(group.entrypoints().len());
        for entry in group.entrypoints() {
            let file = self.build_entrypoint(entry).await?;
            debug!(entrypoint = %entry.name, file = %file.file_name(), "emitted");
            chunks.push(file);
        }
        Ok(BuildStepOutput::new(group.clone(), chunks))
    }

    async fn import_entrypoints(
        &self,
        paths: &[PathBuf],
    ) -> Result<Vec<Map<String, Value>>, BuilderError> {
        let mut options = Vec::with_capacity(paths.len());
        for path in paths {
            let source =
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| BuilderError::Read {
                        path: path.clone(),
                        source,
                    })?;
            let declared = script_options(&source, path).map_err(|message| BuilderError::Parse {
                path: path.clone(),
                message,
            })?;
            options.push(declared);
        }
        Ok(options)
    }
}

fn needs_transform(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("ts" | "tsx" | "jsx" | "mts" | "cts")
    )
}

/// Lower TypeScript and JSX syntax to plain JavaScript.
fn strip_types(source: &str, path: &Path) -> Result<String, BuilderError> {
    let parse_error = |message: String| BuilderError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let allocator = Allocator::default();
    let source_type = SourceType::from_path(path).map_err(|e| parse_error(format!("{e:?}")))?;
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        return Err(parse_error(join_errors(&ret.errors)));
    }

    let mut program = ret.program;
    let scoping = SemanticBuilder::new()
        .build(&program)
        .semantic
        .into_scoping();
    let transformed = Transformer::new(&allocator, path, &TransformOptions::default())
        .build_with_scoping(scoping, &mut program);
    if !transformed.errors.is_empty() {
        return Err(parse_error(join_errors(&transformed.errors)));
    }

    Ok(Codegen::new().build(&program).code)
}

fn join_errors<E: std::fmt::Display>(errors: &[E]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

async fn copy(from: &Path, to: &Path) -> Result<(), BuilderError> {
    ensure_parent(to).await?;
    tokio::fs::copy(from, to)
        .await
        .map_err(|source| BuilderError::Read {
            path: from.to_path_buf(),
            source,
        })?;
    Ok(())
}

async fn write(path: &Path, contents: &[u8]) -> Result<(), BuilderError> {
    ensure_parent(path).await?;
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| BuilderError::Write {
            path: path.to_path_buf(),
            source,
        })
}

async fn ensure_parent(path: &Path) -> Result<(), BuilderError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| BuilderError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_type_annotations() {
        let code = strip_types(
            "const answer: number = 42;\nexport function double(x: number): number { return x * 2; }\n",
            Path::new("math.ts"),
        )
        .unwrap();
        assert!(code.contains("const answer = 42"));
        assert!(!code.contains(": number"));
    }

    #[test]
    fn reports_syntax_errors() {
        let err = strip_types("const = ;", Path::new("broken.ts")).unwrap_err();
        assert!(matches!(err, BuilderError::Parse { .. }));
    }

    #[test]
    fn dev_client_has_origin_substituted() {
        let script = dev_client_script("http://localhost:3000");
        assert!(script.contains("http://localhost:3000"));
        assert!(!script.contains("__WEXT_DEV_ORIGIN__"));
    }
}
