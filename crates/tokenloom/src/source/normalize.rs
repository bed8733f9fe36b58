//! Legacy font-weight key migration.
//!
//! Older token sets keyed font weights numerically (`ref.font.weight.400`).
//! Before merging, those keys are renamed to their semantic names
//! (`ref.font.weight.regular`), together with untyped overrides of the same
//! paths and every reference to them. Running the pass twice changes
//! nothing the second time.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;

use crate::resolve::rewrite_references;
use crate::store::Layer;
use crate::token::TokenType;

/// Numeric weight key → semantic name.
static LEGACY_FONT_WEIGHTS: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        ("100", "thin"),
        ("200", "extra-light"),
        ("300", "light"),
        ("400", "regular"),
        ("500", "medium"),
        ("600", "semi-bold"),
        ("700", "bold"),
        ("800", "extra-bold"),
        ("900", "black"),
    ])
});

/// Semantic name for a legacy numeric key.
pub fn semantic_weight_name(key: &str) -> Option<&'static str> {
    LEGACY_FONT_WEIGHTS.get(key).copied()
}

fn migrated_path(path: &str) -> Option<String> {
    let (parent, last) = path.rsplit_once('.')?;
    let name = semantic_weight_name(last)?;
    Some(format!("{}.{}", parent, name))
}

/// Renames legacy font-weight keys across all layers.
///
/// Returns the applied `(old, new)` renames in path order.
pub fn normalize_layers(layers: &mut [Layer]) -> Vec<(String, String)> {
    let renames: BTreeMap<String, String> = layers
        .iter()
        .flat_map(|layer| layer.files.iter())
        .flat_map(|file| file.definitions.iter())
        .filter(|def| def.token_type == Some(TokenType::FontWeight))
        .filter_map(|def| migrated_path(&def.path).map(|new| (def.path.clone(), new)))
        .collect();

    if renames.is_empty() {
        return Vec::new();
    }

    let lookup: HashMap<String, String> = renames
        .iter()
        .map(|(old, new)| (old.clone(), new.clone()))
        .collect();

    for def in layers
        .iter_mut()
        .flat_map(|layer| layer.files.iter_mut())
        .flat_map(|file| file.definitions.iter_mut())
    {
        if let Some(new) = lookup.get(&def.path) {
            def.path = new.clone();
        }
        rewrite_references(&mut def.value, &lookup);
    }

    for (old, new) in &renames {
        tracing::debug!(from = %old, to = %new, "migrated legacy font-weight key");
    }
    renames.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{LayerKind, SourceFile};
    use crate::token::TokenDefinition;
    use serde_json::json;

    fn layers() -> Vec<Layer> {
        vec![
            Layer::new(
                "reference",
                LayerKind::Reference,
                vec![SourceFile::new(
                    "ref.json",
                    vec![
                        TokenDefinition::new("ref.font.weight.400", TokenType::FontWeight, json!(400)),
                        TokenDefinition::new("ref.font.weight.700", TokenType::FontWeight, json!(700)),
                        TokenDefinition::new("ref.spacing.400", TokenType::Dimension, json!(32)),
                    ],
                )],
            ),
            Layer::new(
                "semantic",
                LayerKind::Semantic,
                vec![SourceFile::new(
                    "sys.json",
                    vec![
                        TokenDefinition::new(
                            "sys.typography.body",
                            TokenType::Typography,
                            json!({ "fontWeight": "{ref.font.weight.400}", "fontSize": "{ref.spacing.400}" }),
                        ),
                        TokenDefinition::untyped("ref.font.weight.700", json!(650)),
                    ],
                )],
            ),
        ]
    }

    #[test]
    fn test_lookup_table() {
        assert_eq!(semantic_weight_name("400"), Some("regular"));
        assert_eq!(semantic_weight_name("600"), Some("semi-bold"));
        assert_eq!(semantic_weight_name("450"), None);
    }

    #[test]
    fn test_normalize_renames_keys_overrides_and_references() {
        let mut layers = layers();
        let renames = normalize_layers(&mut layers);
        assert_eq!(
            renames,
            vec![
                ("ref.font.weight.400".to_string(), "ref.font.weight.regular".to_string()),
                ("ref.font.weight.700".to_string(), "ref.font.weight.bold".to_string()),
            ]
        );

        let reference = &layers[0].files[0].definitions;
        assert_eq!(reference[0].path, "ref.font.weight.regular");
        assert_eq!(reference[1].path, "ref.font.weight.bold");
        // only font weights are migrated
        assert_eq!(reference[2].path, "ref.spacing.400");

        let semantic = &layers[1].files[0].definitions;
        assert_eq!(
            semantic[0].value,
            json!({ "fontWeight": "{ref.font.weight.regular}", "fontSize": "{ref.spacing.400}" })
        );
        assert_eq!(semantic[1].path, "ref.font.weight.bold");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut layers = layers();
        normalize_layers(&mut layers);
        let once = layers.clone();
        assert!(normalize_layers(&mut layers).is_empty());
        assert_eq!(layers, once);
    }
}
