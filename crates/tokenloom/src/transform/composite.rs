//! Font families and the composite types: typography and shadow.

use serde_json::{Map, Value};

use super::color::{parse_color_value, transform_color};
use super::dimension::{dimension_css, dimension_number, Measure};
use super::{Platform, ShadowStyle, TransformOptions};
use crate::util::{format_number, number_value};

/// Typography properties in shorthand order, with their CSS names.
pub const TYPOGRAPHY_PROPERTIES: &[(&str, &str)] = &[
    ("fontFamily", "font-family"),
    ("fontSize", "font-size"),
    ("fontWeight", "font-weight"),
    ("lineHeight", "line-height"),
    ("letterSpacing", "letter-spacing"),
];

// =============================================================================
// Font family
// =============================================================================

fn quote_family(family: &str) -> String {
    if family.chars().any(char::is_whitespace) && !family.starts_with(['\'', '"']) {
        format!("'{}'", family)
    } else {
        family.to_string()
    }
}

/// CSS font stack: entries joined with `, `, quoted when they contain spaces.
pub fn font_family_css(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(quote_family)
                    .ok_or_else(|| "font family entries must be strings".to_string())
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|families| families.join(", ")),
        _ => Err("expected a font family string or array".to_string()),
    }
}

pub fn transform_font_family(value: &Value, options: &TransformOptions) -> Result<Value, String> {
    match options.platform {
        Platform::Css => font_family_css(value).map(Value::String),
        Platform::Js | Platform::Json => match value {
            Value::String(_) | Value::Array(_) => Ok(value.clone()),
            _ => Err("expected a font family string or array".to_string()),
        },
    }
}

// =============================================================================
// Typography
// =============================================================================

fn scalar_css(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => n.as_f64().map(format_number),
        _ => None,
    }
}

/// CSS text of one typography property.
fn typography_property_css(
    name: &str,
    value: &Value,
    options: &TransformOptions,
) -> Result<String, String> {
    let invalid = || format!("invalid typography {}", name);
    match name {
        "fontFamily" => font_family_css(value),
        "fontSize" | "letterSpacing" => Measure::parse(value, "px")
            .map(|m| dimension_css(&m, options))
            .or_else(|| value.as_str().map(String::from))
            .ok_or_else(invalid),
        // unitless line heights stay unitless
        "lineHeight" => match value {
            Value::Object(_) => Measure::parse(value, "px")
                .map(|m| dimension_css(&m, options))
                .ok_or_else(invalid),
            _ => scalar_css(value).ok_or_else(invalid),
        },
        _ => scalar_css(value).ok_or_else(invalid),
    }
}

/// Per-property CSS values, in shorthand order: `(css-name, value)`.
pub fn typography_properties(
    value: &Value,
    options: &TransformOptions,
) -> Result<Vec<(&'static str, String)>, String> {
    let Value::Object(map) = value else {
        return Err("expected a typography object".to_string());
    };
    let mut out = Vec::new();
    for (key, css_name) in TYPOGRAPHY_PROPERTIES {
        if let Some(v) = map.get(*key) {
            out.push((*css_name, typography_property_css(key, v, options)?));
        }
    }
    Ok(out)
}

/// `font` shorthand: `[weight] size[/lineHeight] family`.
pub fn typography_shorthand(value: &Value, options: &TransformOptions) -> Result<String, String> {
    let Value::Object(map) = value else {
        return Err("expected a typography object".to_string());
    };
    let css = |key: &str| -> Result<Option<String>, String> {
        map.get(key)
            .map(|v| typography_property_css(key, v, options))
            .transpose()
    };

    let size = css("fontSize")?.ok_or("typography needs a fontSize")?;
    let family = css("fontFamily")?.ok_or("typography needs a fontFamily")?;

    let mut parts = Vec::new();
    if let Some(weight) = css("fontWeight")? {
        parts.push(weight);
    }
    match css("lineHeight")? {
        Some(line_height) => parts.push(format!("{}/{}", size, line_height)),
        None => parts.push(size),
    }
    parts.push(family);
    Ok(parts.join(" "))
}

fn typography_object(value: &Value, options: &TransformOptions) -> Result<Value, String> {
    let Value::Object(map) = value else {
        return Err("expected a typography object".to_string());
    };
    let mut out = Map::new();
    for (key, v) in map {
        let converted = match key.as_str() {
            "fontSize" | "letterSpacing" | "lineHeight" => match Measure::parse(v, "px") {
                Some(m) if !v.is_string() || m.unit != "%" => {
                    number_value(dimension_number(&m, options))
                }
                _ => v.clone(),
            },
            _ => v.clone(),
        };
        out.insert(key.clone(), converted);
    }
    Ok(Value::Object(out))
}

pub fn transform_typography(value: &Value, options: &TransformOptions) -> Result<Value, String> {
    if let Value::String(_) = value {
        return Ok(value.clone());
    }
    match options.platform {
        Platform::Css => typography_shorthand(value, options).map(Value::String),
        Platform::Js | Platform::Json => typography_object(value, options),
    }
}

// =============================================================================
// Shadow
// =============================================================================

fn shadow_layers(value: &Value) -> Result<Vec<&Map<String, Value>>, String> {
    let invalid = || "expected a shadow object or an array of shadow objects".to_string();
    match value {
        Value::Object(map) => Ok(vec![map]),
        Value::Array(items) if !items.is_empty() => items
            .iter()
            .map(|item| item.as_object().ok_or_else(invalid))
            .collect(),
        _ => Err(invalid()),
    }
}

fn shadow_measure(layer: &Map<String, Value>, key: &str) -> Result<Measure, String> {
    match layer.get(key) {
        None | Some(Value::Null) => Ok(Measure::new(0.0, "px")),
        Some(v) => Measure::parse(v, "px").ok_or_else(|| format!("invalid shadow {}", key)),
    }
}

fn shadow_layer_css(layer: &Map<String, Value>, options: &TransformOptions) -> Result<String, String> {
    let mut parts = Vec::new();
    if layer.get("inset").and_then(Value::as_bool) == Some(true) {
        parts.push("inset".to_string());
    }
    for key in ["offsetX", "offsetY", "blur", "spread"] {
        parts.push(dimension_css(&shadow_measure(layer, key)?, options));
    }
    let color = layer
        .get("color")
        .ok_or_else(|| "shadow layer without color".to_string())?;
    match transform_color(color, options.color_format)? {
        Value::String(s) => parts.push(s),
        other => parts.push(other.to_string()),
    }
    Ok(parts.join(" "))
}

/// CSS `box-shadow` text: layers joined with `, `.
pub fn shadow_css(value: &Value, options: &TransformOptions) -> Result<String, String> {
    shadow_layers(value)?
        .into_iter()
        .map(|layer| shadow_layer_css(layer, options))
        .collect::<Result<Vec<_>, _>>()
        .map(|layers| layers.join(", "))
}

/// Single-layer native shadow structure, built from the first layer.
///
/// Opacity moves out of the color; the radius approximates CSS blur as
/// `blur / 2`.
pub fn shadow_native(value: &Value, options: &TransformOptions) -> Result<Value, String> {
    let layers = shadow_layers(value)?;
    let layer = layers[0];

    let color = layer.get("color").cloned().unwrap_or(Value::Null);
    let (shadow_color, opacity) = match parse_color_value(&color) {
        Some(rgba) => (Value::String(rgba.to_opaque_hex()), rgba.alpha),
        None => (color, 1.0),
    };
    let x = dimension_number(&shadow_measure(layer, "offsetX")?, options);
    let y = dimension_number(&shadow_measure(layer, "offsetY")?, options);
    let blur = dimension_number(&shadow_measure(layer, "blur")?, options);

    let mut offset = Map::new();
    offset.insert("width".into(), number_value(x));
    offset.insert("height".into(), number_value(y));

    let mut out = Map::new();
    out.insert("shadowColor".into(), shadow_color);
    out.insert("shadowOffset".into(), Value::Object(offset));
    out.insert("shadowOpacity".into(), number_value(opacity));
    out.insert("shadowRadius".into(), number_value(blur / 2.0));
    Ok(Value::Object(out))
}

pub fn transform_shadow(value: &Value, options: &TransformOptions) -> Result<Value, String> {
    if let Value::String(_) = value {
        return Ok(value.clone());
    }
    match (options.platform, options.shadow_style) {
        (Platform::Css, _) | (_, ShadowStyle::Css) => shadow_css(value, options).map(Value::String),
        (Platform::Js | Platform::Json, ShadowStyle::Native) => shadow_native(value, options),
    }
}
