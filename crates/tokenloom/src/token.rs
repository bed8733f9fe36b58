//! Token types: definitions as read from sources and merged tokens.
//!
//! A [`TokenDefinition`] is what a single source file says about a path. The
//! [`TokenStore`](crate::store::TokenStore) merges definitions from all layers
//! into [`Token`]s, and the resolver fills in their resolved values and
//! reference metadata.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// The declared type of a token.
///
/// This is a closed set: every transform and emitter matches on it
/// exhaustively. Type names that are not recognized are kept verbatim in
/// [`TokenType::Other`] and passed through untransformed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenType {
    Color,
    Dimension,
    FontFamily,
    FontWeight,
    Typography,
    Shadow,
    Duration,
    CubicBezier,
    Other(String),
}

impl TokenType {
    /// Parses a `type` / `$type` field.
    pub fn parse(name: &str) -> Self {
        match name {
            "color" => TokenType::Color,
            "dimension" => TokenType::Dimension,
            "fontFamily" | "fontFamilies" => TokenType::FontFamily,
            "fontWeight" | "fontWeights" => TokenType::FontWeight,
            "typography" => TokenType::Typography,
            "shadow" | "boxShadow" => TokenType::Shadow,
            "duration" => TokenType::Duration,
            "cubicBezier" => TokenType::CubicBezier,
            other => TokenType::Other(other.to_string()),
        }
    }

    /// Canonical type name, as written in token sources.
    pub fn as_str(&self) -> &str {
        match self {
            TokenType::Color => "color",
            TokenType::Dimension => "dimension",
            TokenType::FontFamily => "fontFamily",
            TokenType::FontWeight => "fontWeight",
            TokenType::Typography => "typography",
            TokenType::Shadow => "shadow",
            TokenType::Duration => "duration",
            TokenType::CubicBezier => "cubicBezier",
            TokenType::Other(name) => name,
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TokenType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TokenType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(TokenType::parse(&name))
    }
}

/// Deprecation marker: either a bare flag or a reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Deprecation {
    Flag(bool),
    Reason(String),
}

impl Deprecation {
    /// Reads a `deprecated` field. `false` means not deprecated.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(true) => Some(Deprecation::Flag(true)),
            Value::String(reason) => Some(Deprecation::Reason(reason.clone())),
            _ => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Deprecation::Reason(reason) => Some(reason),
            Deprecation::Flag(_) => None,
        }
    }
}

/// A token as defined by one source file, before merging.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenDefinition {
    pub path: String,
    /// Explicit or group-inherited type. Overrides may omit it.
    pub token_type: Option<TokenType>,
    pub value: Value,
    pub description: Option<String>,
    pub deprecated: Option<Deprecation>,
}

impl TokenDefinition {
    pub fn new(path: impl Into<String>, token_type: TokenType, value: Value) -> Self {
        Self {
            path: path.into(),
            token_type: Some(token_type),
            value,
            description: None,
            deprecated: None,
        }
    }

    /// A definition without a type, as theme overrides usually are.
    pub fn untyped(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            token_type: None,
            value,
            description: None,
            deprecated: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_deprecation(mut self, deprecation: Deprecation) -> Self {
        self.deprecated = Some(deprecation);
        self
    }
}

/// One step of a reference chain: `from` points at `to`, whose resolved
/// value is `value`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceHop {
    pub from: String,
    pub to: String,
    pub value: Value,
}

/// Where a merged token's winning definition came from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Origin {
    pub layer: String,
    pub file: String,
}

/// A merged token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub path: String,
    pub token_type: TokenType,
    /// Raw value, possibly containing `{reference}` strings.
    pub value: Value,
    /// Fully dereferenced value, populated by [`resolve`](crate::resolve::resolve).
    pub resolved_value: Option<Value>,
    pub description: Option<String>,
    pub deprecated: Option<Deprecation>,
    /// Paths referenced directly by the raw value, in scan order.
    pub references: Vec<String>,
    /// Every hop needed to resolve this token, direct hops first.
    pub reference_chain: Vec<ReferenceHop>,
    pub origin: Origin,
}

impl Token {
    pub fn new(path: impl Into<String>, token_type: TokenType, value: Value) -> Self {
        Self {
            path: path.into(),
            token_type,
            value,
            resolved_value: None,
            description: None,
            deprecated: None,
            references: Vec::new(),
            reference_chain: Vec::new(),
            origin: Origin::default(),
        }
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    /// First path segment (`ref`, `sys`, `cmp`, ...).
    pub fn tier(&self) -> &str {
        self.path.split('.').next().unwrap_or(&self.path)
    }

    /// The resolved value, or the raw value for an unresolved store.
    pub fn resolved(&self) -> &Value {
        self.resolved_value.as_ref().unwrap_or(&self.value)
    }

    pub fn has_references(&self) -> bool {
        !self.references.is_empty()
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_type_round_trip_names() {
        for name in [
            "color",
            "dimension",
            "fontFamily",
            "fontWeight",
            "typography",
            "shadow",
            "duration",
            "cubicBezier",
        ] {
            assert_eq!(TokenType::parse(name).as_str(), name);
        }
        assert_eq!(
            TokenType::parse("opacity"),
            TokenType::Other("opacity".to_string())
        );
        assert_eq!(TokenType::parse("boxShadow"), TokenType::Shadow);
    }

    #[test]
    fn test_token_path_helpers() {
        let token = Token::new(
            "sys.color.action.primary.default",
            TokenType::Color,
            json!("#000"),
        );
        assert_eq!(token.name(), "default");
        assert_eq!(token.tier(), "sys");
        assert_eq!(token.resolved(), &json!("#000"));
    }

    #[test]
    fn test_deprecation_from_value() {
        assert_eq!(
            Deprecation::from_value(&json!(true)),
            Some(Deprecation::Flag(true))
        );
        assert_eq!(Deprecation::from_value(&json!(false)), None);
        assert_eq!(
            Deprecation::from_value(&json!("use sys.color.text")).and_then(|d| d
                .reason()
                .map(String::from)),
            Some("use sys.color.text".to_string())
        );
    }
}
