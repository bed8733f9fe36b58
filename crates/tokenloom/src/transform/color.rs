//! Color values.
//!
//! Structured colors use the `srgb` object form with normalized components:
//!
//! ```json
//! { "colorSpace": "srgb", "components": [1, 0, 0], "alpha": 0.5 }
//! ```
//!
//! | Format | Opaque | Translucent |
//! |--------|--------|-------------|
//! | [`ColorFormat::Rgb`] | `rgb(255, 0, 0)` | `rgba(255, 0, 0, 0.5)` |
//! | [`ColorFormat::Hex`] | `#ff0000` | `#ff000080` |
//!
//! Color strings are passed through untouched. They are only parsed (with
//! `cssparser`) when a shadow needs its alpha channel split off.

use cssparser::{ParseError, Parser, ParserInput, Token};
use serde_json::Value;

use super::ColorFormat;
use crate::util::format_number;

/// A color with normalized channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub alpha: f64,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        alpha: 0.0,
    };

    pub fn new(r: f64, g: f64, b: f64, alpha: f64) -> Self {
        Self { r, g, b, alpha }
    }

    /// Reads an `{colorSpace, components, alpha?}` object.
    pub fn from_object(value: &Value) -> Result<Self, String> {
        let Value::Object(map) = value else {
            return Err("expected a color string or a colorSpace object".to_string());
        };

        match map.get("colorSpace").and_then(Value::as_str) {
            Some("srgb") => {}
            Some(other) => return Err(format!("unsupported color space '{}'", other)),
            None => return Err("color object without colorSpace".to_string()),
        }

        let components: Vec<f64> = map
            .get("components")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_f64).collect())
            .unwrap_or_default();
        let [r, g, b] = components[..] else {
            return Err("srgb colors need exactly three numeric components".to_string());
        };

        let alpha = match map.get("alpha") {
            None | Some(Value::Null) => 1.0,
            Some(v) => v
                .as_f64()
                .ok_or_else(|| "color alpha must be a number".to_string())?,
        };

        Ok(Self::new(r, g, b, alpha))
    }

    /// Parses `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa` (without the `#`).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digit = |i: usize, len: usize| -> Option<f64> {
            let part = hex.get(i * len..i * len + len)?;
            let n = u8::from_str_radix(part, 16).ok()?;
            let n = if len == 1 { n * 17 } else { n };
            Some(n as f64 / 255.0)
        };
        let (len, count) = match hex.len() {
            3 => (1, 3),
            4 => (1, 4),
            6 => (2, 3),
            8 => (2, 4),
            _ => return None,
        };
        let alpha = if count == 4 { digit(3, len)? } else { 1.0 };
        Some(Self::new(digit(0, len)?, digit(1, len)?, digit(2, len)?, alpha))
    }

    fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b].map(to_byte)
    }

    pub fn is_opaque(&self) -> bool {
        self.alpha >= 1.0
    }

    /// `#rrggbb`, plus an `aa` suffix when alpha < 1.
    pub fn to_hex(&self) -> String {
        let [r, g, b] = self.channels();
        let mut out = format!("#{:02x}{:02x}{:02x}", r, g, b);
        if !self.is_opaque() {
            out.push_str(&format!("{:02x}", to_byte(self.alpha)));
        }
        out
    }

    /// `#rrggbb`, dropping alpha.
    pub fn to_opaque_hex(&self) -> String {
        Rgba { alpha: 1.0, ..*self }.to_hex()
    }

    /// `rgb(r, g, b)` or `rgba(r, g, b, a)` when alpha < 1.
    pub fn to_rgb(&self) -> String {
        let [r, g, b] = self.channels();
        if self.is_opaque() {
            format!("rgb({}, {}, {})", r, g, b)
        } else {
            format!(
                "rgba({}, {}, {}, {})",
                r,
                g,
                b,
                format_number(self.alpha.clamp(0.0, 1.0))
            )
        }
    }

    pub fn format(&self, format: ColorFormat) -> String {
        match format {
            ColorFormat::Hex => self.to_hex(),
            ColorFormat::Rgb => self.to_rgb(),
        }
    }
}

fn to_byte(channel: f64) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Transforms a resolved color value.
pub fn transform_color(value: &Value, format: ColorFormat) -> Result<Value, String> {
    match value {
        Value::String(_) => Ok(value.clone()),
        other => Rgba::from_object(other).map(|c| Value::String(c.format(format))),
    }
}

/// Parses a color value of either form.
pub fn parse_color_value(value: &Value) -> Option<Rgba> {
    match value {
        Value::String(s) => parse_css_color(s),
        other => Rgba::from_object(other).ok(),
    }
}

/// Parses a CSS color string: hex, `rgb()`/`rgba()` or `transparent`.
///
/// Named colors other than `transparent` are not recognized.
pub fn parse_css_color(css: &str) -> Option<Rgba> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let color = parse_color(&mut parser).ok()?;
    parser.expect_exhausted().ok()?;
    Some(color)
}

fn parse_color<'i, 't>(input: &mut Parser<'i, 't>) -> Result<Rgba, ParseError<'i, ()>> {
    let token = input.next()?.clone();

    match token {
        Token::Hash(val) | Token::IDHash(val) => {
            Rgba::from_hex(val.as_ref()).ok_or_else(|| input.new_custom_error::<(), ()>(()))
        }
        Token::Ident(name) if name.eq_ignore_ascii_case("transparent") => Ok(Rgba::TRANSPARENT),
        Token::Function(name)
            if name.eq_ignore_ascii_case("rgb") || name.eq_ignore_ascii_case("rgba") =>
        {
            input.parse_nested_block(|args| parse_rgb_arguments(args))
        }
        _ => Err(input.new_custom_error::<(), ()>(())),
    }
}

/// Accepts both `rgb(255, 0, 0, 0.5)` and `rgb(255 0 0 / 50%)`.
fn parse_rgb_arguments<'i, 't>(input: &mut Parser<'i, 't>) -> Result<Rgba, ParseError<'i, ()>> {
    // (number, is_percentage)
    let mut parts: Vec<(f64, bool)> = Vec::with_capacity(4);

    while !input.is_exhausted() {
        match input.next()?.clone() {
            Token::Number { value, .. } => parts.push((value as f64, false)),
            Token::Percentage { unit_value, .. } => parts.push((unit_value as f64, true)),
            Token::Comma | Token::Delim('/') => {}
            _ => return Err(input.new_custom_error::<(), ()>(())),
        }
    }

    let channel = |(n, percent): (f64, bool)| if percent { n } else { n / 255.0 };
    match parts[..] {
        [r, g, b] => Ok(Rgba::new(channel(r), channel(g), channel(b), 1.0)),
        [r, g, b, (alpha, _)] => Ok(Rgba::new(channel(r), channel(g), channel(b), alpha)),
        _ => Err(input.new_custom_error::<(), ()>(())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn srgb(components: [f64; 3], alpha: f64) -> Value {
        json!({ "colorSpace": "srgb", "components": components, "alpha": alpha })
    }

    // =========================================================================
    // Structured colors
    // =========================================================================

    #[test]
    fn test_opaque_red_has_no_alpha() {
        let red = srgb([1.0, 0.0, 0.0], 1.0);
        assert_eq!(
            transform_color(&red, ColorFormat::Hex).unwrap(),
            json!("#ff0000")
        );
        assert_eq!(
            transform_color(&red, ColorFormat::Rgb).unwrap(),
            json!("rgb(255, 0, 0)")
        );
    }

    #[test]
    fn test_translucent_red_keeps_alpha() {
        let red = srgb([1.0, 0.0, 0.0], 0.5);
        assert_eq!(
            transform_color(&red, ColorFormat::Hex).unwrap(),
            json!("#ff000080")
        );
        assert_eq!(
            transform_color(&red, ColorFormat::Rgb).unwrap(),
            json!("rgba(255, 0, 0, 0.5)")
        );
    }

    #[test]
    fn test_missing_alpha_is_opaque() {
        let value = json!({ "colorSpace": "srgb", "components": [0, 0.5, 1] });
        assert_eq!(
            transform_color(&value, ColorFormat::Hex).unwrap(),
            json!("#0080ff")
        );
    }

    #[test]
    fn test_strings_pass_through() {
        assert_eq!(
            transform_color(&json!("#ABCDEF"), ColorFormat::Rgb).unwrap(),
            json!("#ABCDEF")
        );
    }

    #[test]
    fn test_unsupported_color_space() {
        let value = json!({ "colorSpace": "display-p3", "components": [1, 0, 0] });
        let err = transform_color(&value, ColorFormat::Hex).unwrap_err();
        assert!(err.contains("display-p3"));
    }

    #[test]
    fn test_wrong_component_count() {
        let value = json!({ "colorSpace": "srgb", "components": [1, 0] });
        assert!(transform_color(&value, ColorFormat::Hex).is_err());
    }

    // =========================================================================
    // CSS color strings
    // =========================================================================

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(parse_css_color("#f00"), Some(Rgba::new(1.0, 0.0, 0.0, 1.0)));
        assert_eq!(parse_css_color("#ff0000").map(|c| c.to_hex()), Some("#ff0000".into()));
        let translucent = parse_css_color("#00000080").unwrap();
        assert!((translucent.alpha - 128.0 / 255.0).abs() < 1e-9);
        assert_eq!(translucent.to_opaque_hex(), "#000000");
    }

    #[test]
    fn test_parse_rgb_functions() {
        let legacy = parse_css_color("rgba(0, 0, 0, 0.25)").unwrap();
        assert_eq!(legacy.alpha, 0.25);
        assert_eq!(legacy.to_opaque_hex(), "#000000");

        let modern = parse_css_color("rgb(255 128 0 / 50%)").unwrap();
        assert_eq!(modern.to_hex(), "#ff800080");

        assert_eq!(parse_css_color("rgb(255, 0, 0)").map(|c| c.to_rgb()), Some("rgb(255, 0, 0)".into()));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(parse_css_color("rebeccapurple"), None);
        assert_eq!(parse_css_color("#12345"), None);
        assert_eq!(parse_css_color("rgb(1, 2)"), None);
        assert_eq!(parse_css_color("transparent"), Some(Rgba::TRANSPARENT));
    }
}
