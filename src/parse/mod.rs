//! Load phase: YAML text → `Document`, plus the petgraph view of its links.

pub mod graph;
pub mod types;

pub use graph::PipelineGraph;
pub use types::*;

use std::path::Path;

use crate::error::LoadError;

/// Parse pipeline YAML text into a `Document`.
pub fn parse(yaml: &str) -> Result<Document, LoadError> {
    let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    Document::from_value(value, Some(yaml.to_string()))
}

/// Read and parse a pipeline file.
pub fn load_file(path: &Path) -> Result<Document, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "loaded pipeline file");
    parse(&text)
}
