//! Error types for the token build pipeline.
//!
//! Every [`BuildError`] is fatal: the pipeline stops at the first one and no
//! artifact is written. Problems that only degrade a single value (a token
//! type with no rule for a target) are reported as
//! [`TransformWarning`](crate::transform::TransformWarning)s instead.

use std::path::PathBuf;

/// Fatal errors raised while loading, merging, resolving or emitting tokens.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// Two files of the same layer define one path with different values.
    #[error(
        "conflicting definitions for '{path}' in layer '{layer}': {first_file} and {second_file} disagree"
    )]
    DuplicateDefinitionConflict {
        path: String,
        layer: String,
        first_file: String,
        second_file: String,
    },

    /// A reference points at a path that no layer defines.
    #[error("token '{from}' references '{{{reference}}}', which does not exist")]
    UnresolvedReference { from: String, reference: String },

    /// Resolving a token requires resolving itself.
    #[error("cyclic reference detected: {}", .cycle.join(" -> "))]
    CyclicReference { cycle: Vec<String> },

    /// A source file is not valid JSON or not a valid token tree.
    #[error("malformed token source {file}: {message}")]
    MalformedSource { file: String, message: String },

    /// Two tokens map to the same identifier in one output.
    #[error("{format} output maps both '{first}' and '{second}' to '{name}'")]
    NameCollision {
        format: String,
        name: String,
        first: String,
        second: String,
    },

    /// Invalid build configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A custom template failed to compile or render.
    #[error("failed to render template '{name}': {message}")]
    Template { name: String, message: String },

    /// An output could not be serialized.
    #[error("failed to serialize {format} output: {message}")]
    Serialize { format: String, message: String },

    /// Reading sources or writing artifacts failed.
    #[error("I/O error on {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },
}

impl BuildError {
    pub(crate) fn malformed(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedSource {
            file: file.into(),
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Token paths named by this error, for diagnostics.
    pub fn token_paths(&self) -> Vec<&str> {
        match self {
            BuildError::DuplicateDefinitionConflict { path, .. } => vec![path.as_str()],
            BuildError::UnresolvedReference { from, reference } => {
                vec![from.as_str(), reference.as_str()]
            }
            BuildError::CyclicReference { cycle } => cycle.iter().map(String::as_str).collect(),
            BuildError::NameCollision { first, second, .. } => {
                vec![first.as_str(), second.as_str()]
            }
            _ => Vec::new(),
        }
    }
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;
