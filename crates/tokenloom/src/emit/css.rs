//! CSS custom properties.
//!
//! ```css
//! /**
//!  * Generated by tokenloom. Do not edit directly.
//!  */
//!
//! :root {
//!   --sys-color-bg: #ffffff;
//!   --sys-spacing-sm: 4px;
//! }
//!
//! [data-theme="dark"] {
//!   --sys-color-bg: #121212;
//! }
//!
//! @media (prefers-color-scheme: dark) {
//!   :root {
//!     --sys-color-bg: #121212;
//!   }
//! }
//! ```
//!
//! With `output_references`, a token whose value is exactly one reference to
//! another emitted token is written as `var(--target)` instead of a literal.
//! Inside a theme block the link is only kept when `--target` still yields
//! the themed value there: the target is overridden in the same block, or
//! its base value is what the theme resolves to.

use std::collections::BTreeSet;

use serde_json::Value;

use super::manifest::OutputRecord;
use super::{selected_themes, transformed_value, EmitContext, TypographyMode, HEADER};
use crate::config::OutputConfig;
use crate::error::Result;
use crate::naming::css_variable_name;
use crate::resolve::whole_reference;
use crate::token::{Token, TokenType};
use crate::transform::{typography_properties, TransformOptions, TYPOGRAPHY_PROPERTIES};
use crate::util::{format_number, values_equal};

/// CSS text of a transformed value.
pub fn css_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
        Value::Bool(b) => b.to_string(),
        Value::Null => "initial".to_string(),
        other => other.to_string(),
    }
}

struct Declarations<'a> {
    output: &'a OutputConfig,
    ctx: &'a EmitContext<'a>,
    options: &'a TransformOptions,
    /// Paths written to the base block, valid `var()` targets.
    emitted: BTreeSet<&'a str>,
}

impl Declarations<'_> {
    fn name(&self, path: &str) -> String {
        css_variable_name(path, self.ctx.css_prefix)
    }

    /// The emitted token a `var()` should point at, if any.
    ///
    /// `overrides` holds the paths written to the theme block being built,
    /// `None` for the base block.
    fn reference_target(
        &self,
        token: &Token,
        overrides: Option<&BTreeSet<&str>>,
    ) -> Option<&Token> {
        if !self.output.output_references {
            return None;
        }
        let path = token.value.as_str().and_then(whole_reference)?;
        if !self.emitted.contains(path) {
            return None;
        }
        let target = self.ctx.tokens.get(path)?;
        match overrides {
            Some(overrides)
                if !overrides.contains(path)
                    && !values_equal(target.resolved(), token.resolved()) =>
            {
                None
            }
            _ => Some(target),
        }
    }

    fn write(
        &self,
        token: &Token,
        overrides: Option<&BTreeSet<&str>>,
        record: &mut OutputRecord,
        lines: &mut Vec<(String, String)>,
    ) -> Result<()> {
        let name = self.name(&token.path);
        record.map(&token.path, &name)?;

        let target = self.reference_target(token, overrides);
        if let Some(target) = target {
            lines.push((name.clone(), format!("var({})", self.name(&target.path))));
        }

        if token.token_type == TokenType::Typography {
            return self.write_typography(token, target, &name, record, lines);
        }
        if target.is_none() {
            let value = transformed_value(token, self.options, record);
            lines.push((name, css_text(&value)));
        }
        Ok(())
    }

    fn write_typography(
        &self,
        token: &Token,
        target: Option<&Token>,
        name: &str,
        record: &mut OutputRecord,
        lines: &mut Vec<(String, String)>,
    ) -> Result<()> {
        if self.output.typography == TypographyMode::Initial {
            if target.is_none() {
                lines.push((name.to_string(), "initial".to_string()));
            }
            return Ok(());
        }

        if let Some(target) = target.filter(|t| t.token_type == TokenType::Typography) {
            let target_name = self.name(&target.path);
            for (key, css_name) in TYPOGRAPHY_PROPERTIES {
                if target.resolved().get(*key).is_some() {
                    let property = format!("{}-{}", name, css_name);
                    record.claim(&property, &format!("{} ({})", token.path, css_name))?;
                    lines.push((property, format!("var({}-{})", target_name, css_name)));
                }
            }
            return Ok(());
        }

        let shorthand = transformed_value(token, self.options, record);
        if target.is_none() {
            lines.push((name.to_string(), css_text(&shorthand)));
        }
        // unusable values were already reported by the shorthand transform
        let Ok(properties) = typography_properties(token.resolved(), self.options) else {
            return Ok(());
        };
        for (css_name, value) in properties {
            let property = format!("{}-{}", name, css_name);
            record.claim(&property, &format!("{} ({})", token.path, css_name))?;
            lines.push((property, value));
        }
        Ok(())
    }
}

fn write_block(out: &mut String, selector: &str, lines: &[(String, String)], indent: &str) {
    out.push_str(&format!("{}{} {{\n", indent, selector));
    for (name, value) in lines {
        out.push_str(&format!("{}  {}: {};\n", indent, name, value));
    }
    out.push_str(&format!("{}}}\n", indent));
}

pub fn emit_css(
    output: &OutputConfig,
    ctx: &EmitContext<'_>,
    options: &TransformOptions,
    record: &mut OutputRecord,
) -> Result<String> {
    let tokens = ctx.selected(output);
    let decls = Declarations {
        output,
        ctx,
        options,
        emitted: tokens.iter().map(|t| t.path.as_str()).collect(),
    };

    let mut out = String::new();
    if ctx.header {
        out.push_str(&format!("/**\n * {}\n */\n\n", HEADER));
    }

    let mut lines = Vec::new();
    for token in &tokens {
        decls.write(token, None, record, &mut lines)?;
    }
    write_block(&mut out, &output.selector, &lines, "");

    for (theme, theme_tokens) in selected_themes(output, ctx) {
        let overrides: BTreeSet<&str> = theme_tokens.iter().map(|t| t.path.as_str()).collect();
        let mut lines = Vec::new();
        for token in &theme_tokens {
            decls.write(token, Some(&overrides), record, &mut lines)?;
        }
        out.push('\n');
        write_block(&mut out, &theme.selector, &lines, "");

        if let Some(media) = &theme.media {
            out.push('\n');
            out.push_str(&format!("@media {} {{\n", media));
            write_block(&mut out, &output.selector, &lines, "  ");
            out.push_str("}\n");
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::{Format, OutputManifest};
    use crate::resolve::resolve;
    use crate::store::TokenStore;
    use crate::theme::ThemeOverrides;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn store(tokens: &[(&str, TokenType, Value)]) -> TokenStore {
        resolve(TokenStore::from_tokens(
            tokens
                .iter()
                .map(|(p, t, v)| Token::new(*p, t.clone(), v.clone())),
        ))
        .unwrap()
    }

    fn render(output: &OutputConfig, ctx: &EmitContext<'_>) -> String {
        let mut manifest = OutputManifest::new();
        crate::emit::emit(output, ctx, &mut manifest).unwrap()
    }

    // =========================================================================
    // Base block
    // =========================================================================

    #[test]
    fn test_spacing_in_single_root_block() {
        let tokens = store(&[
            ("sys.spacing.sm", TokenType::Dimension, json!({"value": 4, "unit": "px"})),
            ("sys.spacing.lg", TokenType::Dimension, json!({"value": 16, "unit": "px"})),
        ]);
        let css = render(
            &OutputConfig::new(Format::Css, "tokens.css"),
            &EmitContext::new(&tokens).with_header(false),
        );
        assert_eq!(
            css,
            ":root {\n  --sys-spacing-lg: 16px;\n  --sys-spacing-sm: 4px;\n}\n"
        );
        assert_eq!(css.matches(":root {").count(), 1);
    }

    #[test]
    fn test_header_and_prefix() {
        let tokens = store(&[("sys.color.bg", TokenType::Color, json!("#fff"))]);
        let css = render(
            &OutputConfig::new(Format::Css, "tokens.css"),
            &EmitContext::new(&tokens).with_css_prefix(Some("acme")),
        );
        assert!(css.starts_with("/**\n * Generated by tokenloom. Do not edit directly.\n */\n\n"));
        assert!(css.contains("  --acme-sys-color-bg: #fff;\n"));
    }

    #[test]
    fn test_output_references() {
        let tokens = store(&[
            ("ref.color.white", TokenType::Color, json!("#ffffff")),
            ("sys.color.bg", TokenType::Color, json!("{ref.color.white}")),
            ("sys.color.border", TokenType::Other("border".into()), json!("1px solid {ref.color.white}")),
        ]);
        let mut output = OutputConfig::new(Format::Css, "tokens.css");
        output.output_references = true;
        let css = render(&output, &EmitContext::new(&tokens).with_header(false));
        assert!(css.contains("  --sys-color-bg: var(--ref-color-white);\n"));
        // only whole references become var()
        assert!(css.contains("  --sys-color-border: 1px solid #ffffff;\n"));

        // targets outside the output fall back to literals
        output.filter.tiers = vec!["sys".into()];
        let css = render(&output, &EmitContext::new(&tokens).with_header(false));
        assert!(css.contains("  --sys-color-bg: #ffffff;\n"));
    }

    // =========================================================================
    // Typography
    // =========================================================================

    fn typography_store() -> TokenStore {
        store(&[(
            "sys.type.body",
            TokenType::Typography,
            json!({"fontFamily": ["Inter", "sans-serif"], "fontSize": 14, "fontWeight": 400, "lineHeight": 1.5}),
        )])
    }

    #[test]
    fn test_typography_expand() {
        let tokens = typography_store();
        let css = render(
            &OutputConfig::new(Format::Css, "tokens.css"),
            &EmitContext::new(&tokens).with_header(false),
        );
        assert_eq!(
            css,
            ":root {\n\
             \x20 --sys-type-body: 400 14px/1.5 Inter, sans-serif;\n\
             \x20 --sys-type-body-font-family: Inter, sans-serif;\n\
             \x20 --sys-type-body-font-size: 14px;\n\
             \x20 --sys-type-body-font-weight: 400;\n\
             \x20 --sys-type-body-line-height: 1.5;\n\
             }\n"
        );
    }

    #[test]
    fn test_typography_initial() {
        let tokens = typography_store();
        let mut output = OutputConfig::new(Format::Css, "tokens.css");
        output.typography = TypographyMode::Initial;
        let css = render(&output, &EmitContext::new(&tokens).with_header(false));
        assert_eq!(css, ":root {\n  --sys-type-body: initial;\n}\n");
    }

    // =========================================================================
    // Themes
    // =========================================================================

    #[test]
    fn test_theme_block_and_media_mirror() {
        let tokens = store(&[
            ("sys.color.bg", TokenType::Color, json!("#ffffff")),
            ("sys.spacing.sm", TokenType::Dimension, json!(4)),
        ]);
        let dark = store(&[("sys.color.bg", TokenType::Color, json!("#121212"))]);
        let themes = vec![
            ThemeOverrides {
                name: "dark".into(),
                selector: "[data-theme=\"dark\"]".into(),
                media: Some("(prefers-color-scheme: dark)".into()),
                tokens: dark.iter().map(|t| (t.path.clone(), t.clone())).collect(),
            },
            ThemeOverrides {
                name: "empty".into(),
                selector: "[data-theme=\"empty\"]".into(),
                media: None,
                tokens: BTreeMap::new(),
            },
        ];
        let css = render(
            &OutputConfig::new(Format::Css, "tokens.css"),
            &EmitContext::new(&tokens).with_header(false).with_themes(&themes),
        );
        assert_eq!(
            css,
            ":root {\n\
             \x20 --sys-color-bg: #ffffff;\n\
             \x20 --sys-spacing-sm: 4px;\n\
             }\n\
             \n\
             [data-theme=\"dark\"] {\n\
             \x20 --sys-color-bg: #121212;\n\
             }\n\
             \n\
             @media (prefers-color-scheme: dark) {\n\
             \x20 :root {\n\
             \x20   --sys-color-bg: #121212;\n\
             \x20 }\n\
             }\n"
        );

        let mut output = OutputConfig::new(Format::Css, "tokens.css");
        output.themes = false;
        let css = render(&output, &EmitContext::new(&tokens).with_themes(&themes));
        assert!(!css.contains("data-theme"));
    }

    fn referencing_theme(
        base: &[(&str, TokenType, Value)],
        themed: &[(&str, TokenType, Value)],
    ) -> String {
        let tokens = store(base);
        let dark = store(themed);
        let overrides: BTreeMap<String, Token> = dark
            .iter()
            .filter(|t| t.path.starts_with("sys."))
            .filter(|t| tokens.get(&t.path).map(|b| b.resolved()) != Some(t.resolved()))
            .map(|t| (t.path.clone(), t.clone()))
            .collect();
        let themes = vec![ThemeOverrides {
            name: "dark".into(),
            selector: "[data-theme=\"dark\"]".into(),
            media: None,
            tokens: overrides,
        }];
        let mut output = OutputConfig::new(Format::Css, "tokens.css");
        output.output_references = true;
        render(&output, &EmitContext::new(&tokens).with_header(false).with_themes(&themes))
    }

    #[test]
    fn test_theme_reference_to_overridden_primitive_is_literal() {
        let css = referencing_theme(
            &[
                ("ref.color.surface", TokenType::Color, json!("#ffffff")),
                ("sys.color.bg", TokenType::Color, json!("{ref.color.surface}")),
            ],
            &[
                ("ref.color.surface", TokenType::Color, json!("#111111")),
                ("sys.color.bg", TokenType::Color, json!("{ref.color.surface}")),
            ],
        );
        assert!(css.contains("  --sys-color-bg: var(--ref-color-surface);\n"));
        assert!(css.ends_with("[data-theme=\"dark\"] {\n  --sys-color-bg: #111111;\n}\n"));
    }

    #[test]
    fn test_theme_reference_keeps_var_when_base_value_matches() {
        let css = referencing_theme(
            &[
                ("ref.color.black", TokenType::Color, json!("#000000")),
                ("ref.color.white", TokenType::Color, json!("#ffffff")),
                ("sys.color.bg", TokenType::Color, json!("{ref.color.white}")),
            ],
            &[
                ("ref.color.black", TokenType::Color, json!("#000000")),
                ("ref.color.white", TokenType::Color, json!("#ffffff")),
                ("sys.color.bg", TokenType::Color, json!("{ref.color.black}")),
            ],
        );
        assert!(css.ends_with("[data-theme=\"dark\"] {\n  --sys-color-bg: var(--ref-color-black);\n}\n"));
    }

    #[test]
    fn test_theme_reference_to_overridden_sibling_keeps_var() {
        let css = referencing_theme(
            &[
                ("sys.color.accent", TokenType::Color, json!("#0055ff")),
                ("sys.color.link", TokenType::Color, json!("{sys.color.accent}")),
            ],
            &[
                ("sys.color.accent", TokenType::Color, json!("#66aaff")),
                ("sys.color.link", TokenType::Color, json!("{sys.color.accent}")),
            ],
        );
        assert!(css.ends_with(
            "[data-theme=\"dark\"] {\n  --sys-color-accent: #66aaff;\n  --sys-color-link: var(--sys-color-accent);\n}\n"
        ));
    }

    #[test]
    fn test_theme_typography_reference_to_overridden_primitive_expands() {
        let body = json!({"fontFamily": "Inter", "fontSize": 14});
        let large = json!({"fontFamily": "Inter", "fontSize": 18});
        let css = referencing_theme(
            &[
                ("ref.type.body", TokenType::Typography, body.clone()),
                ("sys.type.body", TokenType::Typography, json!("{ref.type.body}")),
            ],
            &[
                ("ref.type.body", TokenType::Typography, large),
                ("sys.type.body", TokenType::Typography, json!("{ref.type.body}")),
            ],
        );
        let (_, theme_block) = css.split_once("[data-theme=\"dark\"]").unwrap();
        assert!(theme_block.contains("  --sys-type-body-font-size: 18px;\n"));
        assert!(!theme_block.contains("var("));
    }

    // =========================================================================
    // Collisions
    // =========================================================================

    #[test]
    fn test_name_collision_is_fatal() {
        let tokens = store(&[
            ("sys.fontSize", TokenType::Dimension, json!(4)),
            ("sys.font-size", TokenType::Dimension, json!(4)),
        ]);
        let mut manifest = OutputManifest::new();
        let err = crate::emit::emit(
            &OutputConfig::new(Format::Css, "tokens.css"),
            &EmitContext::new(&tokens),
            &mut manifest,
        )
        .unwrap_err();
        assert!(matches!(err, crate::error::BuildError::NameCollision { ref name, .. } if name == "--sys-font-size"));
    }

    #[test]
    fn test_css_text() {
        assert_eq!(css_text(&json!(600)), "600");
        assert_eq!(css_text(&json!("bold")), "bold");
        assert_eq!(css_text(&json!({"a": 1})), r#"{"a":1}"#);
    }
}
