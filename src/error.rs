//! Phase tags for findings and the fatal error types that abort validation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The component that produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Load,
    Schema,
    Reference,
    Graph,
    Sequence,
    Policy,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Load => write!(f, "Load"),
            Phase::Schema => write!(f, "Schema"),
            Phase::Reference => write!(f, "Reference"),
            Phase::Graph => write!(f, "Graph"),
            Phase::Sequence => write!(f, "SequenceRule"),
            Phase::Policy => write!(f, "Policy"),
        }
    }
}

/// The input could not be turned into a `Document`. Validation never starts.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("document root must be a mapping, found {found}")]
    NotAMapping { found: &'static str },

    #[error("document is empty")]
    Empty,

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    /// Stable machine-readable code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            LoadError::Yaml(_) => "P001",
            LoadError::NotAMapping { .. } => "P002",
            LoadError::Empty => "P003",
            LoadError::Io { .. } => "P004",
        }
    }
}

/// A rules override file could not be read or applied.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("failed to read rules file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid rules file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid rules override: {0}")]
    Invalid(String),
}
