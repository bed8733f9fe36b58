//! Layered token store.
//!
//! Layers are merged in ascending [`LayerKind`] priority. Within one layer,
//! files are applied in lexicographic order of their names, so the merged
//! store never depends on the order in which files were discovered or read.
//!
//! ```text
//! reference  ->  semantic  ->  component  ->  theme
//! (lowest)                                   (highest)
//! ```
//!
//! A path defined by two layers silently takes the higher layer's value. A
//! path defined twice within the same layer must agree, otherwise the
//! priority is ambiguous and the merge fails.

use std::collections::btree_map::{self, BTreeMap};
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BuildError, Result};
use crate::token::{Deprecation, Origin, Token, TokenDefinition, TokenType};
use crate::util::values_equal;

/// Priority tier of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Reference,
    Semantic,
    Component,
    Theme,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Reference => "reference",
            LayerKind::Semantic => "semantic",
            LayerKind::Component => "component",
            LayerKind::Theme => "theme",
        }
    }
}

/// Definitions read from one file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    /// Normalized name; determines the application order within a layer.
    pub name: String,
    pub definitions: Vec<TokenDefinition>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, definitions: Vec<TokenDefinition>) -> Self {
        Self {
            name: name.into(),
            definitions,
        }
    }
}

/// A named set of source files sharing one priority.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    pub kind: LayerKind,
    pub files: Vec<SourceFile>,
}

impl Layer {
    pub fn new(name: impl Into<String>, kind: LayerKind, files: Vec<SourceFile>) -> Self {
        Self {
            name: name.into(),
            kind,
            files,
        }
    }

    /// Number of definitions across all files.
    pub fn definition_count(&self) -> usize {
        self.files.iter().map(|f| f.definitions.len()).sum()
    }
}

/// A token under construction. Its type may still be missing until a
/// lower layer (or a sibling file) supplies it.
struct Pending {
    token_type: Option<TokenType>,
    value: Value,
    description: Option<String>,
    deprecated: Option<Deprecation>,
    origin: Origin,
}

/// The merged path → token mapping, ordered by path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStore {
    tokens: BTreeMap<String, Token>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges layers into a flat store.
    ///
    /// Performs no I/O. The result is the same for any permutation of the
    /// files inside each layer.
    pub fn merge(layers: &[Layer]) -> Result<Self> {
        let mut ordered: Vec<&Layer> = layers.iter().collect();
        ordered.sort_by_key(|layer| layer.kind);

        let mut pending: BTreeMap<String, Pending> = BTreeMap::new();

        for layer in ordered {
            let mut files: Vec<&SourceFile> = layer.files.iter().collect();
            files.sort_by(|a, b| a.name.cmp(&b.name));

            // path -> (file, definition) of the first definition in this layer
            let mut seen: HashMap<&str, (&str, &TokenDefinition)> = HashMap::new();

            for file in files {
                for def in &file.definitions {
                    if let Some((first_file, first)) = seen.get(def.path.as_str()) {
                        if conflicts(first, def) {
                            return Err(BuildError::DuplicateDefinitionConflict {
                                path: def.path.clone(),
                                layer: layer.name.clone(),
                                first_file: first_file.to_string(),
                                second_file: file.name.clone(),
                            });
                        }
                    } else {
                        seen.insert(def.path.as_str(), (file.name.as_str(), def));
                    }

                    let origin = Origin {
                        layer: layer.name.clone(),
                        file: file.name.clone(),
                    };
                    apply(&mut pending, def, origin);
                }
            }
        }

        let mut tokens = BTreeMap::new();
        for (path, entry) in pending {
            let Some(token_type) = entry.token_type else {
                return Err(BuildError::malformed(
                    entry.origin.file,
                    format!("token '{}' has no type in any layer", path),
                ));
            };
            let mut token = Token::new(path.clone(), token_type, entry.value);
            token.description = entry.description;
            token.deprecated = entry.deprecated;
            token.origin = entry.origin;
            tokens.insert(path, token);
        }

        Ok(Self { tokens })
    }

    /// Builds a store from already merged tokens.
    pub fn from_tokens(tokens: impl IntoIterator<Item = Token>) -> Self {
        Self {
            tokens: tokens.into_iter().map(|t| (t.path.clone(), t)).collect(),
        }
    }

    pub fn get(&self, path: &str) -> Option<&Token> {
        self.tokens.get(path)
    }

    pub(crate) fn get_mut(&mut self, path: &str) -> Option<&mut Token> {
        self.tokens.get_mut(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.tokens.contains_key(path)
    }

    /// Tokens in lexicographic path order.
    pub fn iter(&self) -> btree_map::Values<'_, String, Token> {
        self.tokens.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.tokens.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl<'a> IntoIterator for &'a TokenStore {
    type Item = &'a Token;
    type IntoIter = btree_map::Values<'a, String, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.values()
    }
}

/// Two same-layer definitions conflict when their values differ or they
/// declare different types.
fn conflicts(first: &TokenDefinition, second: &TokenDefinition) -> bool {
    if !values_equal(&first.value, &second.value) {
        return true;
    }
    matches!(
        (&first.token_type, &second.token_type),
        (Some(a), Some(b)) if a != b
    )
}

fn apply(pending: &mut BTreeMap<String, Pending>, def: &TokenDefinition, origin: Origin) {
    match pending.get_mut(&def.path) {
        Some(existing) => {
            if def.token_type.is_some() {
                existing.token_type = def.token_type.clone();
            }
            if def.description.is_some() {
                existing.description = def.description.clone();
            }
            if def.deprecated.is_some() {
                existing.deprecated = def.deprecated.clone();
            }
            existing.value = def.value.clone();
            existing.origin = origin;
        }
        None => {
            pending.insert(
                def.path.clone(),
                Pending {
                    token_type: def.token_type.clone(),
                    value: def.value.clone(),
                    description: def.description.clone(),
                    deprecated: def.deprecated.clone(),
                    origin,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn color(path: &str, value: &str) -> TokenDefinition {
        TokenDefinition::new(path, TokenType::Color, json!(value))
    }

    fn layer(name: &str, kind: LayerKind, files: Vec<(&str, Vec<TokenDefinition>)>) -> Layer {
        Layer::new(
            name,
            kind,
            files
                .into_iter()
                .map(|(n, defs)| SourceFile::new(n, defs))
                .collect(),
        )
    }

    // =========================================================================
    // Priority
    // =========================================================================

    #[test]
    fn test_higher_layer_wins() {
        let store = TokenStore::merge(&[
            layer(
                "theme",
                LayerKind::Theme,
                vec![("dark.json", vec![color("sys.bg", "#000")])],
            ),
            layer(
                "semantic",
                LayerKind::Semantic,
                vec![("sys.json", vec![color("sys.bg", "#fff")])],
            ),
        ])
        .unwrap();

        let bg = store.get("sys.bg").unwrap();
        assert_eq!(bg.value, json!("#000"));
        assert_eq!(bg.origin.layer, "theme");
        assert_eq!(bg.origin.file, "dark.json");
    }

    #[test]
    fn test_override_inherits_type_and_description() {
        let store = TokenStore::merge(&[
            layer(
                "semantic",
                LayerKind::Semantic,
                vec![(
                    "sys.json",
                    vec![color("sys.bg", "#fff").with_description("Page background")],
                )],
            ),
            layer(
                "dark",
                LayerKind::Theme,
                vec![(
                    "dark.json",
                    vec![TokenDefinition::untyped("sys.bg", json!("#000"))],
                )],
            ),
        ])
        .unwrap();

        let bg = store.get("sys.bg").unwrap();
        assert_eq!(bg.token_type, TokenType::Color);
        assert_eq!(bg.description.as_deref(), Some("Page background"));
        assert_eq!(bg.value, json!("#000"));
    }

    #[test]
    fn test_untyped_token_is_malformed() {
        let err = TokenStore::merge(&[layer(
            "dark",
            LayerKind::Theme,
            vec![(
                "dark.json",
                vec![TokenDefinition::untyped("sys.new", json!("#000"))],
            )],
        )])
        .unwrap_err();
        assert!(matches!(err, BuildError::MalformedSource { ref file, .. } if file == "dark.json"));
    }

    // =========================================================================
    // Same-layer collisions
    // =========================================================================

    #[test]
    fn test_same_layer_conflict() {
        let err = TokenStore::merge(&[layer(
            "reference",
            LayerKind::Reference,
            vec![
                ("b.json", vec![color("ref.red", "#f00")]),
                ("a.json", vec![color("ref.red", "#e00")]),
            ],
        )])
        .unwrap_err();

        assert_eq!(
            err,
            BuildError::DuplicateDefinitionConflict {
                path: "ref.red".into(),
                layer: "reference".into(),
                first_file: "a.json".into(),
                second_file: "b.json".into(),
            }
        );
    }

    #[test]
    fn test_same_layer_identical_redefinition_is_allowed() {
        let store = TokenStore::merge(&[layer(
            "reference",
            LayerKind::Reference,
            vec![
                ("a.json", vec![color("ref.red", "#f00")]),
                (
                    "b.json",
                    vec![color("ref.red", "#f00").with_description("Red")],
                ),
            ],
        )])
        .unwrap();

        let red = store.get("ref.red").unwrap();
        assert_eq!(red.origin.file, "b.json");
        assert_eq!(red.description.as_deref(), Some("Red"));
    }

    #[test]
    fn test_same_layer_type_mismatch_conflicts() {
        let err = TokenStore::merge(&[layer(
            "reference",
            LayerKind::Reference,
            vec![
                ("a.json", vec![color("ref.x", "4")]),
                (
                    "b.json",
                    vec![TokenDefinition::new(
                        "ref.x",
                        TokenType::Dimension,
                        json!("4"),
                    )],
                ),
            ],
        )])
        .unwrap_err();
        assert!(matches!(err, BuildError::DuplicateDefinitionConflict { .. }));
    }

    #[test]
    fn test_cross_layer_collision_is_silent() {
        let store = TokenStore::merge(&[
            layer(
                "reference",
                LayerKind::Reference,
                vec![("a.json", vec![color("x.y", "#111")])],
            ),
            layer(
                "semantic",
                LayerKind::Semantic,
                vec![("b.json", vec![color("x.y", "#222")])],
            ),
        ])
        .unwrap();
        assert_eq!(store.get("x.y").unwrap().value, json!("#222"));
    }

    // =========================================================================
    // Ordering
    // =========================================================================

    #[test]
    fn test_file_order_does_not_matter() {
        let files = vec![
            ("b.json", vec![color("ref.b", "#bbb"), color("ref.shared", "#000")]),
            ("a.json", vec![color("ref.a", "#aaa"), color("ref.shared", "#000")]),
        ];
        let mut reversed = files.clone();
        reversed.reverse();

        let one = TokenStore::merge(&[layer("r", LayerKind::Reference, files)]).unwrap();
        let two = TokenStore::merge(&[layer("r", LayerKind::Reference, reversed)]).unwrap();
        assert_eq!(one, two);
        assert_eq!(one.paths().collect::<Vec<_>>(), vec!["ref.a", "ref.b", "ref.shared"]);
    }

    #[test]
    fn test_empty_store() {
        let store = TokenStore::merge(&[]).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }
}
