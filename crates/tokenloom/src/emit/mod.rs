//! Format emitters.
//!
//! Every emitter turns the resolved store (plus theme overrides) into one
//! text artifact. Output is deterministic: tokens are visited in path order
//! and nothing time- or environment-dependent is written, so the same input
//! always yields byte-identical files.
//!
//! | Format | Artifact |
//! |--------|----------|
//! | `css` | custom properties, theme blocks, media mirrors |
//! | `js` / `ts` | flat `export const tokens = {...}` module |
//! | `json` | nested tree mirroring token paths |
//! | `docs` | tier-grouped documentation catalogue |
//! | `template` | user-supplied minijinja template |

pub mod css;
pub mod docs;
pub mod json;
pub mod manifest;
pub mod module;
pub mod template;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::OutputConfig;
use crate::error::Result;
use crate::store::TokenStore;
use crate::theme::ThemeOverrides;
use crate::token::{Token, TokenType};
use crate::transform::{transform, Platform, TransformOptions};

pub use manifest::{OutputManifest, OutputRecord};

/// Generated-file notice written at the top of CSS and JS artifacts.
pub const HEADER: &str = "Generated by tokenloom. Do not edit directly.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Css,
    Js,
    Ts,
    Json,
    Docs,
    Template,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Css => "css",
            Format::Js => "js",
            Format::Ts => "ts",
            Format::Json => "json",
            Format::Docs => "docs",
            Format::Template => "template",
        }
    }

    /// Value representation used unless the output overrides it.
    pub fn default_platform(&self) -> Platform {
        match self {
            Format::Css => Platform::Css,
            Format::Js | Format::Ts => Platform::Js,
            Format::Json | Format::Docs | Format::Template => Platform::Json,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the CSS emitter writes typography tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypographyMode {
    /// The `font` shorthand plus one property per typography field.
    #[default]
    Expand,
    /// A single `initial` value: the token is not usable directly.
    Initial,
}

/// Restricts which tokens an output contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenFilter {
    /// First path segments to keep. Empty keeps every tier.
    pub tiers: Vec<String>,
    /// Types to keep. Empty keeps every type.
    pub types: Vec<TokenType>,
    pub include_deprecated: bool,
}

impl Default for TokenFilter {
    fn default() -> Self {
        Self {
            tiers: Vec::new(),
            types: Vec::new(),
            include_deprecated: true,
        }
    }
}

impl TokenFilter {
    pub fn matches(&self, token: &Token) -> bool {
        (self.tiers.is_empty() || self.tiers.iter().any(|t| t == token.tier()))
            && (self.types.is_empty() || self.types.contains(&token.token_type))
            && (self.include_deprecated || !token.is_deprecated())
    }
}

/// Everything an emitter reads, besides its own output settings.
#[derive(Debug, Clone, Copy)]
pub struct EmitContext<'a> {
    pub tokens: &'a TokenStore,
    pub themes: &'a [ThemeOverrides],
    pub base_font_size: f64,
    /// Global CSS custom property prefix.
    pub css_prefix: Option<&'a str>,
    pub header: bool,
}

impl<'a> EmitContext<'a> {
    pub fn new(tokens: &'a TokenStore) -> Self {
        Self {
            tokens,
            themes: &[],
            base_font_size: 16.0,
            css_prefix: None,
            header: true,
        }
    }

    pub fn with_themes(mut self, themes: &'a [ThemeOverrides]) -> Self {
        self.themes = themes;
        self
    }

    pub fn with_css_prefix(mut self, prefix: Option<&'a str>) -> Self {
        self.css_prefix = prefix;
        self
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    pub fn with_base_font_size(mut self, size: f64) -> Self {
        self.base_font_size = size;
        self
    }

    /// Base tokens kept by the output's filter, in path order.
    pub fn selected(&self, output: &OutputConfig) -> Vec<&'a Token> {
        self.tokens
            .iter()
            .filter(|t| output.filter.matches(t))
            .collect()
    }
}

/// Renders one output and appends its record to the manifest.
pub fn emit(
    output: &OutputConfig,
    ctx: &EmitContext<'_>,
    manifest: &mut OutputManifest,
) -> Result<String> {
    let options = output.transform_options(ctx.base_font_size);
    let mut record = OutputRecord::new(output.file.clone(), output.format);

    let text = match output.format {
        Format::Css => css::emit_css(output, ctx, &options, &mut record)?,
        Format::Js | Format::Ts => module::emit_module(output, ctx, &options, &mut record)?,
        Format::Json => json::emit_json(output, ctx, &options, &mut record)?,
        Format::Docs => docs::emit_docs(output, ctx, &options, &mut record)?,
        Format::Template => template::emit_template(output, ctx, &options, &mut record)?,
    };

    tracing::debug!(
        file = %output.file,
        format = %output.format,
        tokens = record.tokens.len(),
        warnings = record.warnings.len(),
        "emitted output"
    );
    manifest.push(record);
    Ok(text)
}

/// Transforms a token, recording any warning.
pub(crate) fn transformed_value(
    token: &Token,
    options: &TransformOptions,
    record: &mut OutputRecord,
) -> Value {
    let out = transform(token, options);
    if let Some(warning) = out.warning {
        record.warn(warning);
    }
    out.value
}

/// Theme overrides kept by the output's filter, skipping empty sets.
pub(crate) fn selected_themes<'a>(
    output: &OutputConfig,
    ctx: &EmitContext<'a>,
) -> Vec<(&'a ThemeOverrides, Vec<&'a Token>)> {
    if !output.themes {
        return Vec::new();
    }
    ctx.themes
        .iter()
        .map(|theme| {
            let tokens: Vec<&Token> = theme
                .tokens
                .values()
                .filter(|t| output.filter.matches(t))
                .collect();
            (theme, tokens)
        })
        .filter(|(_, tokens)| !tokens.is_empty())
        .collect()
}
