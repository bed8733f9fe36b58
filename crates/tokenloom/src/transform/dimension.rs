//! Dimensions, durations and easing curves.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::{Platform, TransformOptions};
use crate::util::{format_number, number_value};

static MEASURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(-?(?:\d+\.?\d*|\.\d+))\s*([a-zA-Z%]*)\s*$").expect("measure pattern is valid")
});

/// A number with a unit: `{ "value": 4, "unit": "px" }`, `4`, or `"4px"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    pub value: f64,
    pub unit: String,
}

impl Measure {
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }

    /// Reads any of the accepted forms. Bare numbers take `default_unit`.
    pub fn parse(value: &Value, default_unit: &str) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Self::new(n.as_f64()?, default_unit)),
            Value::String(s) => {
                let caps = MEASURE.captures(s)?;
                let number: f64 = caps[1].parse().ok()?;
                let unit = match &caps[2] {
                    "" => default_unit,
                    unit => unit,
                };
                Some(Self::new(number, unit))
            }
            Value::Object(map) => {
                let number = map.get("value")?.as_f64()?;
                let unit = map
                    .get("unit")
                    .and_then(Value::as_str)
                    .unwrap_or(default_unit);
                Some(Self::new(number, unit))
            }
            _ => None,
        }
    }

    fn css(&self) -> String {
        format!("{}{}", format_number(self.value), self.unit)
    }
}

/// CSS text for a dimension, converting `rem` when enabled.
pub fn dimension_css(measure: &Measure, options: &TransformOptions) -> String {
    if measure.unit == "rem" && options.rem_to_px {
        Measure::new(measure.value * options.base_font_size, "px").css()
    } else {
        measure.css()
    }
}

/// Bare number for a dimension, with `rem` pre-multiplied.
pub fn dimension_number(measure: &Measure, options: &TransformOptions) -> f64 {
    match measure.unit.as_str() {
        "rem" => measure.value * options.base_font_size,
        _ => measure.value,
    }
}

pub fn transform_dimension(value: &Value, options: &TransformOptions) -> Result<Value, String> {
    let Some(measure) = Measure::parse(value, "px") else {
        return match value {
            // keywords and expressions (`auto`, `calc(...)`) are valid as-is
            Value::String(_) => Ok(value.clone()),
            _ => Err("expected a {value, unit} object, a number or a string".to_string()),
        };
    };
    Ok(match options.platform {
        Platform::Css => Value::String(dimension_css(&measure, options)),
        Platform::Js | Platform::Json => number_value(dimension_number(&measure, options)),
    })
}

/// Durations: CSS keeps the unit, JS and JSON get milliseconds.
pub fn transform_duration(value: &Value, options: &TransformOptions) -> Result<Value, String> {
    let measure = Measure::parse(value, "ms")
        .ok_or_else(|| "expected a {value, unit} duration".to_string())?;
    let millis = match measure.unit.as_str() {
        "ms" => measure.value,
        "s" => measure.value * 1000.0,
        other => return Err(format!("unknown duration unit '{}'", other)),
    };
    Ok(match options.platform {
        Platform::Css => Value::String(measure.css()),
        Platform::Js | Platform::Json => number_value(millis),
    })
}

/// `[x1, y1, x2, y2]` easing curves.
pub fn transform_cubic_bezier(value: &Value, options: &TransformOptions) -> Result<Value, String> {
    if let Value::String(_) = value {
        return Ok(value.clone());
    }
    let points: Vec<f64> = value
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_f64).collect())
        .unwrap_or_default();
    if points.len() != 4 {
        return Err("expected four control point coordinates".to_string());
    }
    Ok(match options.platform {
        Platform::Css => Value::String(format!(
            "cubic-bezier({})",
            points
                .iter()
                .map(|p| format_number(*p))
                .collect::<Vec<_>>()
                .join(", ")
        )),
        Platform::Js | Platform::Json => Value::Array(points.into_iter().map(number_value).collect()),
    })
}
