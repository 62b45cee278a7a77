//! Total conversions from raw export values to numbers

use serde_json::Value;

use crate::models::Row;

/// Convert a raw field value into a finite number, defaulting to zero
pub fn coerce(value: Option<&Value>) -> f64 {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };

    if number.is_finite() {
        number
    } else {
        0.0
    }
}

/// Read a logical metric that the upstream has published under several names.
///
/// Candidates are tried in order and the first non-zero value wins. When no
/// candidate is non-zero, the first candidate that is present decides (and is
/// zero); when none is present the result is zero.
pub fn pick_first_non_zero(row: &Row, candidates: &[&str]) -> f64 {
    for name in candidates {
        let value = coerce(row.get(*name));
        if value != 0.0 {
            return value;
        }
    }

    candidates
        .iter()
        .find_map(|name| row.get(*name))
        .map(|value| coerce(Some(value)))
        .unwrap_or(0.0)
}
