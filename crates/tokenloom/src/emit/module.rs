//! Flat JS / TS modules.
//!
//! ```js
//! export const tokens = {
//!   /** Page background */
//!   sysColorBg: "#ffffff",
//!   sysSpacingSm: 4,
//! };
//!
//! export default tokens;
//! ```
//!
//! The TS flavour adds `as const` and an exported `Tokens` type.

use serde_json::Value;

use super::manifest::OutputRecord;
use super::{transformed_value, EmitContext, Format, HEADER};
use crate::config::OutputConfig;
use crate::error::{BuildError, Result};
use crate::naming::js_identifier;
use crate::token::Token;
use crate::transform::TransformOptions;

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn write_key(out: &mut String, key: &str) -> Result<()> {
    if is_identifier(key) {
        out.push_str(key);
        Ok(())
    } else {
        write_string(out, key)
    }
}

fn write_string(out: &mut String, s: &str) -> Result<()> {
    let quoted = serde_json::to_string(s).map_err(|e| BuildError::Serialize {
        format: "js".to_string(),
        message: e.to_string(),
    })?;
    out.push_str(&quoted);
    Ok(())
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

/// Writes a JS literal. Scalar arrays stay on one line.
fn write_value(out: &mut String, value: &Value, indent: usize) -> Result<()> {
    match value {
        Value::String(s) => write_string(out, s)?,
        Value::Array(items) if items.iter().all(is_scalar) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item, indent)?;
            }
            out.push(']');
        }
        Value::Array(items) => {
            out.push_str("[\n");
            for item in items {
                out.push_str(&" ".repeat(indent + 2));
                write_value(out, item, indent + 2)?;
                out.push_str(",\n");
            }
            out.push_str(&" ".repeat(indent));
            out.push(']');
        }
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Object(map) => {
            out.push_str("{\n");
            for (key, item) in map {
                out.push_str(&" ".repeat(indent + 2));
                write_key(out, key)?;
                out.push_str(": ");
                write_value(out, item, indent + 2)?;
                out.push_str(",\n");
            }
            out.push_str(&" ".repeat(indent));
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
    Ok(())
}

/// JSDoc lines for a token: description and deprecation.
fn doc_lines(token: &Token) -> Vec<String> {
    let mut lines: Vec<String> = token
        .description
        .iter()
        .flat_map(|d| d.lines())
        .map(|line| line.replace("*/", "*\\/"))
        .collect();
    if let Some(deprecation) = &token.deprecated {
        lines.push(match deprecation.reason() {
            Some(reason) => format!("@deprecated {}", reason.replace("*/", "*\\/")),
            None => "@deprecated".to_string(),
        });
    }
    lines
}

fn write_doc(out: &mut String, token: &Token) {
    match doc_lines(token).as_slice() {
        [] => {}
        [line] => out.push_str(&format!("  /** {} */\n", line)),
        lines => {
            out.push_str("  /**\n");
            for line in lines {
                out.push_str(&format!("   * {}\n", line));
            }
            out.push_str("   */\n");
        }
    }
}

pub fn emit_module(
    output: &OutputConfig,
    ctx: &EmitContext<'_>,
    options: &TransformOptions,
    record: &mut OutputRecord,
) -> Result<String> {
    let typescript = output.format == Format::Ts;
    let mut out = String::new();
    if ctx.header {
        out.push_str(&format!("/**\n * {}\n */\n\n", HEADER));
    }

    out.push_str("export const tokens = {\n");
    for token in ctx.selected(output) {
        let name = js_identifier(&token.path);
        record.map(&token.path, &name)?;
        let value = transformed_value(token, options, record);

        write_doc(&mut out, token);
        out.push_str("  ");
        out.push_str(&name);
        out.push_str(": ");
        write_value(&mut out, &value, 2)?;
        out.push_str(",\n");
    }
    out.push('}');

    if typescript {
        out.push_str(" as const;\n\nexport type Tokens = typeof tokens;\n");
    } else {
        out.push_str(";\n");
    }
    out.push_str("\nexport default tokens;\n");
    Ok(out)
}
