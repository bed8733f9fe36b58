//! JSON token tree parsing.
//!
//! A token file is a JSON object whose leaves are token objects and whose
//! inner nodes are plain groups:
//!
//! ```json
//! {
//!   "sys": {
//!     "color": {
//!       "$type": "color",
//!       "text": { "value": "{ref.color.neutral.10}", "description": "Body text" }
//!     },
//!     "spacing": {
//!       "sm": { "type": "dimension", "value": { "value": 4, "unit": "px" } }
//!     }
//!   }
//! }
//! ```
//!
//! A node is a token when it carries `value` or `$value`. Both the plain and
//! the `$`-prefixed spellings are accepted for `type`, `description` and
//! `deprecated`. A group's `$type` applies to every descendant token that
//! does not declare its own.

use serde_json::{Map, Value};

use crate::error::{BuildError, Result};
use crate::token::{Deprecation, TokenDefinition, TokenType};

/// Parses one token file into flat definitions.
///
/// `file` is only used in error messages.
pub fn parse_token_file(file: &str, content: &str) -> Result<Vec<TokenDefinition>> {
    let root: Value = serde_json::from_str(content)
        .map_err(|e| BuildError::malformed(file, format!("invalid JSON: {}", e)))?;
    parse_token_tree(file, &root)
}

/// Parses an already decoded JSON tree.
pub fn parse_token_tree(file: &str, root: &Value) -> Result<Vec<TokenDefinition>> {
    let Value::Object(map) = root else {
        return Err(BuildError::malformed(
            file,
            "the root of a token file must be an object",
        ));
    };
    if is_token(map) {
        return Err(BuildError::malformed(
            file,
            "the root of a token file must be a group, not a token",
        ));
    }

    let mut definitions = Vec::new();
    let mut path = Vec::new();
    walk_group(file, map, &mut path, None, &mut definitions)?;
    Ok(definitions)
}

fn is_token(node: &Map<String, Value>) -> bool {
    node.contains_key("$value") || node.contains_key("value")
}

fn field<'a>(node: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    node.get(&format!("${}", name)).or_else(|| node.get(name))
}

fn walk_group(
    file: &str,
    group: &Map<String, Value>,
    path: &mut Vec<String>,
    inherited: Option<&TokenType>,
    out: &mut Vec<TokenDefinition>,
) -> Result<()> {
    let group_type = match group.get("$type") {
        Some(Value::String(name)) => Some(TokenType::parse(name)),
        Some(other) => {
            return Err(BuildError::malformed(
                file,
                format!(
                    "group '{}' has a non-string $type: {}",
                    display_path(path),
                    other
                ),
            ))
        }
        None => inherited.cloned(),
    };

    for (key, child) in group {
        if key.starts_with('$') {
            continue;
        }
        validate_name(file, path, key)?;
        path.push(key.clone());

        match child {
            Value::Object(node) if is_token(node) => {
                out.push(parse_token(file, path, node, group_type.as_ref())?);
            }
            Value::Object(node) => {
                walk_group(file, node, path, group_type.as_ref(), out)?;
            }
            other => {
                return Err(BuildError::malformed(
                    file,
                    format!(
                        "expected a token or group at '{}', found {}",
                        display_path(path),
                        kind_of(other)
                    ),
                ));
            }
        }

        path.pop();
    }
    Ok(())
}

fn parse_token(
    file: &str,
    path: &[String],
    node: &Map<String, Value>,
    inherited: Option<&TokenType>,
) -> Result<TokenDefinition> {
    let full_path = display_path(path);
    let value = field(node, "value").cloned().unwrap_or(Value::Null);

    let token_type = match field(node, "type") {
        Some(Value::String(name)) => Some(TokenType::parse(name)),
        Some(other) => {
            return Err(BuildError::malformed(
                file,
                format!("token '{}' has a non-string type: {}", full_path, other),
            ))
        }
        None => inherited.cloned(),
    };

    let description = match field(node, "description") {
        Some(Value::String(text)) => Some(text.clone()),
        Some(Value::Null) | None => None,
        Some(other) => {
            return Err(BuildError::malformed(
                file,
                format!(
                    "token '{}' has a non-string description: {}",
                    full_path, other
                ),
            ))
        }
    };

    Ok(TokenDefinition {
        path: full_path,
        token_type,
        value,
        description,
        deprecated: field(node, "deprecated").and_then(Deprecation::from_value),
    })
}

fn validate_name(file: &str, path: &[String], key: &str) -> Result<()> {
    if key.is_empty() || key.contains(['.', '{', '}']) {
        let location = if path.is_empty() {
            "the root".to_string()
        } else {
            format!("'{}'", display_path(path))
        };
        return Err(BuildError::malformed(
            file,
            format!("invalid token name '{}' under {}", key, location),
        ));
    }
    Ok(())
}

fn display_path(path: &[String]) -> String {
    path.join(".")
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plain_and_dollar_fields() {
        let defs = parse_token_file(
            "base.json",
            r##"{
                "sys": {
                    "spacing": {
                        "sm": { "type": "dimension", "value": { "value": 4, "unit": "px" } }
                    },
                    "color": {
                        "text": { "$type": "color", "$value": "#000000", "$description": "Body" }
                    }
                }
            }"##,
        )
        .unwrap();

        assert_eq!(defs.len(), 2);
        let text = defs.iter().find(|d| d.path == "sys.color.text").unwrap();
        assert_eq!(text.token_type, Some(TokenType::Color));
        assert_eq!(text.value, json!("#000000"));
        assert_eq!(text.description.as_deref(), Some("Body"));

        let sm = defs.iter().find(|d| d.path == "sys.spacing.sm").unwrap();
        assert_eq!(sm.value, json!({"value": 4, "unit": "px"}));
    }

    #[test]
    fn test_group_type_is_inherited() {
        let defs = parse_token_file(
            "ref.json",
            r##"{ "ref": { "color": { "$type": "color", "red": { "value": "#f00" } } } }"##,
        )
        .unwrap();
        assert_eq!(defs[0].token_type, Some(TokenType::Color));
    }

    #[test]
    fn test_override_without_type_stays_untyped() {
        let defs =
            parse_token_file("dark.json", r##"{ "sys": { "bg": { "value": "#111" } } }"##).unwrap();
        assert_eq!(defs[0].token_type, None);
    }

    #[test]
    fn test_deprecated_field() {
        let defs = parse_token_file(
            "a.json",
            r#"{ "a": { "b": { "type": "color", "value": "red", "deprecated": "use a.c" } } }"#,
        )
        .unwrap();
        assert_eq!(
            defs[0].deprecated,
            Some(Deprecation::Reason("use a.c".to_string()))
        );
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = parse_token_file("broken.json", "{ not json").unwrap_err();
        assert!(matches!(err, BuildError::MalformedSource { ref file, .. } if file == "broken.json"));
    }

    #[test]
    fn test_non_object_root_is_malformed() {
        assert!(parse_token_file("list.json", "[1, 2]").is_err());
    }

    #[test]
    fn test_bare_leaf_is_malformed() {
        let err = parse_token_file("a.json", r#"{ "sys": { "color": "red" } }"#).unwrap_err();
        assert!(err.to_string().contains("sys.color"));
        assert!(err.to_string().contains("a string"));
    }

    #[test]
    fn test_dotted_names_are_rejected() {
        let err = parse_token_file(
            "a.json",
            r#"{ "sys": { "a.b": { "type": "color", "value": "red" } } }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid token name 'a.b'"));
    }
}
