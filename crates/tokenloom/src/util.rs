//! Numeric formatting and value comparison helpers shared by the pipeline.

use serde_json::Value;

/// Decimal places kept when formatting computed numbers.
const PRECISION: f64 = 1_000_000.0;

/// Rounds away floating point noise (`0.1 * 3`) so output stays stable.
pub fn round(n: f64) -> f64 {
    let scaled = n * PRECISION;
    if !scaled.is_finite() {
        return n;
    }
    scaled.round() / PRECISION
}

/// Formats a number the way CSS and JS expect it: integers without a
/// fractional part, everything else in shortest round-trip form.
pub fn format_number(n: f64) -> String {
    let n = round(n);
    if n.fract() == 0.0 && n.abs() < 1e15 {
        // -0.0 would otherwise print as "-0"
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Converts a number into a JSON value, preferring integers.
///
/// `serde_json` serializes `16.0_f64` as `16.0`; generated modules should
/// read `16`.
pub fn number_value(n: f64) -> Value {
    let n = round(n);
    if n.fract() == 0.0 && n.abs() < 1e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Structural equality that treats `16` and `16.0` as the same number.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}
