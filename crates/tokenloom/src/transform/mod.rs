//! Per-platform value transforms.
//!
//! [`transform`] is a pure function of a token's resolved value, its type and
//! the target options. Dispatch is an exhaustive match on [`TokenType`], so a
//! new token type does not compile until every platform has a rule for it.
//!
//! | Type | CSS | JS / JSON |
//! |------|-----|-----------|
//! | color | `rgb()`/`rgba()` | `#rrggbb[aa]` |
//! | dimension | `16px` (rem converted) | `16` |
//! | fontFamily | `Inter, 'Helvetica Neue'` | array |
//! | fontWeight | as-is | as-is |
//! | typography | `font` shorthand | object, dimensions as numbers |
//! | shadow | `box-shadow` text | `box-shadow` text or native object |
//! | duration | `200ms` | milliseconds |
//! | cubicBezier | `cubic-bezier(...)` | array |
//!
//! When a rule cannot handle a value, the raw value passes through and a
//! [`TransformWarning`] is attached. Warnings never fail a build.

pub mod color;
pub mod composite;
pub mod dimension;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::token::{Token, TokenType};

pub use color::Rgba;
pub use composite::{typography_properties, typography_shorthand, TYPOGRAPHY_PROPERTIES};
pub use dimension::Measure;

/// Value representation family of an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Css,
    Js,
    Json,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Platform::Css => "css",
            Platform::Js => "js",
            Platform::Json => "json",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorFormat {
    Hex,
    Rgb,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowStyle {
    /// A `box-shadow` string on every platform.
    #[default]
    Css,
    /// `{shadowColor, shadowOffset, shadowOpacity, shadowRadius}` for JS/JSON.
    Native,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransformOptions {
    pub platform: Platform,
    /// Pixels per `rem`.
    pub base_font_size: f64,
    pub color_format: ColorFormat,
    /// Convert `rem` dimensions to `px` in CSS.
    pub rem_to_px: bool,
    pub shadow_style: ShadowStyle,
}

impl TransformOptions {
    pub fn css() -> Self {
        Self::for_platform(Platform::Css)
    }

    pub fn js() -> Self {
        Self::for_platform(Platform::Js)
    }

    pub fn json() -> Self {
        Self::for_platform(Platform::Json)
    }

    /// Platform defaults: `rgb()` colors for CSS, hex elsewhere.
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            platform,
            base_font_size: 16.0,
            color_format: match platform {
                Platform::Css => ColorFormat::Rgb,
                Platform::Js | Platform::Json => ColorFormat::Hex,
            },
            rem_to_px: true,
            shadow_style: ShadowStyle::default(),
        }
    }

    pub fn with_base_font_size(mut self, size: f64) -> Self {
        self.base_font_size = size;
        self
    }

    pub fn with_color_format(mut self, format: ColorFormat) -> Self {
        self.color_format = format;
        self
    }

    pub fn with_rem_to_px(mut self, enabled: bool) -> Self {
        self.rem_to_px = enabled;
        self
    }

    pub fn with_shadow_style(mut self, style: ShadowStyle) -> Self {
        self.shadow_style = style;
        self
    }
}

/// A value that could not be transformed and was passed through raw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformWarning {
    pub path: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub platform: Platform,
    pub reason: String,
}

impl fmt::Display for TransformWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unsupported {} value for {} token '{}': {}; passing the raw value through",
            self.platform, self.token_type, self.path, self.reason
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transformed {
    pub value: Value,
    pub warning: Option<TransformWarning>,
}

/// Transforms a token's resolved value for one platform.
pub fn transform(token: &Token, options: &TransformOptions) -> Transformed {
    let value = token.resolved();
    let result = match &token.token_type {
        TokenType::Color => color::transform_color(value, options.color_format),
        TokenType::Dimension => dimension::transform_dimension(value, options),
        TokenType::FontFamily => composite::transform_font_family(value, options),
        TokenType::FontWeight => Ok(value.clone()),
        TokenType::Typography => composite::transform_typography(value, options),
        TokenType::Shadow => composite::transform_shadow(value, options),
        TokenType::Duration => dimension::transform_duration(value, options),
        TokenType::CubicBezier => dimension::transform_cubic_bezier(value, options),
        TokenType::Other(name) => transform_other(name, value, options),
    };

    match result {
        Ok(value) => Transformed {
            value,
            warning: None,
        },
        Err(reason) => Transformed {
            value: value.clone(),
            warning: Some(TransformWarning {
                path: token.path.clone(),
                token_type: token.token_type.clone(),
                platform: options.platform,
                reason,
            }),
        },
    }
}

fn transform_other(name: &str, value: &Value, options: &TransformOptions) -> Result<Value, String> {
    match (options.platform, value) {
        (Platform::Css, Value::Array(_) | Value::Object(_)) => {
            Err(format!("no CSS rule for structured '{}' values", name))
        }
        _ => Ok(value.clone()),
    }
}
