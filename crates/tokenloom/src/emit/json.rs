//! Nested JSON tree mirroring token paths.

use serde_json::{Map, Value};

use super::manifest::OutputRecord;
use super::{transformed_value, EmitContext};
use crate::config::OutputConfig;
use crate::error::{BuildError, Result};
use crate::transform::TransformOptions;

fn collision(prefix: &str, first: &str, second: &str) -> BuildError {
    BuildError::NameCollision {
        format: "json".to_string(),
        name: prefix.to_string(),
        first: first.to_string(),
        second: second.to_string(),
    }
}

/// Inserts `value` at `path`, failing when a leaf and a group meet.
fn insert(
    root: &mut Map<String, Value>,
    path: &str,
    value: Value,
    record: &OutputRecord,
) -> Result<()> {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return Ok(());
    };

    let mut node = root;
    for (depth, segment) in parents.iter().enumerate() {
        let prefix = segments[..=depth].join(".");
        let child = node
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        node = match child {
            Value::Object(map) => map,
            _ => return Err(collision(&prefix, &prefix, path)),
        };
    }

    if node.contains_key(*last) {
        let first = record
            .tokens
            .keys()
            .find(|p| p.starts_with(&format!("{}.", path)))
            .cloned()
            .unwrap_or_else(|| path.to_string());
        return Err(collision(path, &first, path));
    }
    node.insert(last.to_string(), value);
    Ok(())
}

pub fn emit_json(
    output: &OutputConfig,
    ctx: &EmitContext<'_>,
    options: &TransformOptions,
    record: &mut OutputRecord,
) -> Result<String> {
    let mut root = Map::new();
    for token in ctx.selected(output) {
        let value = transformed_value(token, options, record);
        insert(&mut root, &token.path, value, record)?;
        record.map(&token.path, &token.path)?;
    }

    let mut text = serde_json::to_string_pretty(&Value::Object(root)).map_err(|e| {
        BuildError::Serialize {
            format: "json".to_string(),
            message: e.to_string(),
        }
    })?;
    text.push('\n');
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::{Format, OutputManifest};
    use crate::store::TokenStore;
    use crate::token::{Token, TokenType};
    use serde_json::json;

    fn render(store: &TokenStore) -> Result<String> {
        let mut manifest = OutputManifest::new();
        crate::emit::emit(
            &OutputConfig::new(Format::Json, "tokens.json"),
            &EmitContext::new(store),
            &mut manifest,
        )
    }

    #[test]
    fn test_nested_tree() {
        let store = TokenStore::from_tokens([
            Token::new("sys.spacing.sm", TokenType::Dimension, json!({"value": 0.25, "unit": "rem"})),
            Token::new("sys.color.bg", TokenType::Color, json!("#fff")),
        ]);
        let text = render(&store).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            parsed,
            json!({"sys": {"color": {"bg": "#fff"}, "spacing": {"sm": 4}}})
        );
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn test_leaf_group_clash() {
        let store = TokenStore::from_tokens([
            Token::new("sys.color", TokenType::Color, json!("#000")),
            Token::new("sys.color.bg", TokenType::Color, json!("#fff")),
        ]);
        let err = render(&store).unwrap_err();
        assert_eq!(
            err,
            BuildError::NameCollision {
                format: "json".into(),
                name: "sys.color".into(),
                first: "sys.color".into(),
                second: "sys.color.bg".into(),
            }
        );
    }
}
