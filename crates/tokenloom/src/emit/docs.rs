//! Documentation catalogue.
//!
//! A JSON object grouped by tier. `ref`, `sys` and `cmp` are always
//! present; tokens under any other first segment get a group of their own.
//!
//! ```json
//! {
//!   "cmp": [],
//!   "ref": [ { "name": "white", "path": "ref.color.white", ... } ],
//!   "sys": [ { "name": "bg", "path": "sys.color.bg", "references": ["ref.color.white"], "chain": [...] } ]
//! }
//! ```

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::manifest::OutputRecord;
use super::{transformed_value, EmitContext};
use crate::config::OutputConfig;
use crate::error::{BuildError, Result};
use crate::naming::{css_variable_name, js_identifier};
use crate::token::{Deprecation, ReferenceHop, Token, TokenType};
use crate::transform::TransformOptions;

/// Tiers that always appear in the catalogue.
pub const TIERS: &[&str] = &["ref", "sys", "cmp"];

/// One catalogue entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentationEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecation>,
    pub original_value: Value,
    pub resolved_value: Value,
    /// Value after the output's transforms.
    pub value: Value,
    pub css_variable: String,
    pub js_property: String,
    pub json_path: String,
    pub references: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain: Option<Vec<ReferenceHop>>,
    /// Resolved value per theme that overrides this token.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub theme_values: BTreeMap<String, Value>,
}

impl DocumentationEntry {
    pub fn from_token(token: &Token, value: Value, css_prefix: Option<&str>) -> Self {
        Self {
            name: token.name().to_string(),
            path: token.path.clone(),
            token_type: token.token_type.clone(),
            description: token.description.clone(),
            deprecated: token.deprecated.clone(),
            original_value: token.value.clone(),
            resolved_value: token.resolved().clone(),
            value,
            css_variable: css_variable_name(&token.path, css_prefix),
            js_property: js_identifier(&token.path),
            json_path: token.path.clone(),
            references: token.references.clone(),
            chain: token
                .has_references()
                .then(|| token.reference_chain.clone()),
            theme_values: BTreeMap::new(),
        }
    }
}

/// Builds the tier-grouped catalogue.
pub fn catalogue(
    output: &OutputConfig,
    ctx: &EmitContext<'_>,
    options: &TransformOptions,
    record: &mut OutputRecord,
) -> Result<BTreeMap<String, Vec<DocumentationEntry>>> {
    let mut groups: BTreeMap<String, Vec<DocumentationEntry>> = TIERS
        .iter()
        .map(|tier| (tier.to_string(), Vec::new()))
        .collect();

    for token in ctx.selected(output) {
        let value = transformed_value(token, options, record);
        let mut entry = DocumentationEntry::from_token(token, value, ctx.css_prefix);
        record.map(&token.path, &entry.json_path)?;

        if output.themes {
            for theme in ctx.themes {
                if let Some(themed) = theme.tokens.get(&token.path) {
                    entry
                        .theme_values
                        .insert(theme.name.clone(), themed.resolved().clone());
                }
            }
        }
        groups.entry(token.tier().to_string()).or_default().push(entry);
    }
    Ok(groups)
}

pub fn emit_docs(
    output: &OutputConfig,
    ctx: &EmitContext<'_>,
    options: &TransformOptions,
    record: &mut OutputRecord,
) -> Result<String> {
    let groups = catalogue(output, ctx, options, record)?;
    let mut text = serde_json::to_string_pretty(&groups).map_err(|e| BuildError::Serialize {
        format: "docs".to_string(),
        message: e.to_string(),
    })?;
    text.push('\n');
    Ok(text)
}
