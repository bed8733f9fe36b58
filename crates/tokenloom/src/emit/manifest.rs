//! Output manifest.
//!
//! Every emitter records which token became which identifier in which file,
//! plus the transform warnings it produced. The manifest is an ordinary
//! value threaded through emission and returned with the build report, so
//! concurrent builds never share state.

use std::collections::BTreeMap;

use serde::Serialize;

use super::Format;
use crate::error::{BuildError, Result};
use crate::transform::TransformWarning;

/// Mapping and warnings of a single output file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRecord {
    pub file: String,
    pub format: Format,
    /// Token path → identifier in this output.
    pub tokens: BTreeMap<String, String>,
    pub warnings: Vec<TransformWarning>,
    /// Identifier → owner, for collision checks.
    #[serde(skip)]
    claimed: BTreeMap<String, String>,
}

impl OutputRecord {
    pub fn new(file: impl Into<String>, format: Format) -> Self {
        Self {
            file: file.into(),
            format,
            tokens: BTreeMap::new(),
            warnings: Vec::new(),
            claimed: BTreeMap::new(),
        }
    }

    /// Claims `identifier` for `owner`. Fails when another owner holds it.
    pub fn claim(&mut self, identifier: &str, owner: &str) -> Result<()> {
        match self.claimed.get(identifier) {
            Some(existing) if existing != owner => Err(BuildError::NameCollision {
                format: self.format.to_string(),
                name: identifier.to_string(),
                first: existing.clone(),
                second: owner.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.claimed
                    .insert(identifier.to_string(), owner.to_string());
                Ok(())
            }
        }
    }

    /// Records `path` → `identifier`, claiming the identifier.
    pub fn map(&mut self, path: &str, identifier: &str) -> Result<()> {
        self.claim(identifier, path)?;
        self.tokens.insert(path.to_string(), identifier.to_string());
        Ok(())
    }

    pub fn warn(&mut self, warning: TransformWarning) {
        if !self.warnings.contains(&warning) {
            tracing::warn!(output = %self.file, "{}", warning);
            self.warnings.push(warning);
        }
    }
}

/// Records of every output of one build, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutputManifest {
    pub outputs: Vec<OutputRecord>,
}

impl OutputManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: OutputRecord) {
        self.outputs.push(record);
    }

    pub fn get(&self, file: &str) -> Option<&OutputRecord> {
        self.outputs.iter().find(|r| r.file == file)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &TransformWarning> {
        self.outputs.iter().flat_map(|r| r.warnings.iter())
    }

    pub fn warning_count(&self) -> usize {
        self.outputs.iter().map(|r| r.warnings.len()).sum()
    }
}
