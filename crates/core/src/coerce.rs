//! Lenient coercion of untrusted JSON values.
//!
//! Cart documents, product listings and order responses all arrive as loosely
//! shaped JSON. These helpers turn arbitrary [`Value`]s into the scalar types
//! the domain model needs without ever failing: anything that cannot be
//! interpreted becomes "absent" (or `NaN` for numbers) and the caller picks the
//! default.

use serde_json::Value;

/// A JSON path expressed as a sequence of object keys.
pub type Path<'a> = &'a [&'a str];

/// Coerce a value to a number the way a browser `Number(...)` call would.
///
/// - `null` → `0`
/// - booleans → `0` / `1`
/// - numbers → themselves
/// - strings → trimmed and parsed (empty string is `0`), `NaN` when unparseable
/// - arrays and objects → `NaN`
#[must_use]
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

/// Coerce an optional value to a finite number, or `fallback`.
#[must_use]
pub fn finite_or(value: Option<&Value>, fallback: f64) -> f64 {
    value
        .map(to_number)
        .filter(|n| n.is_finite())
        .unwrap_or(fallback)
}

/// Render a scalar value as a string.
///
/// Returns `None` for missing values, `null`, arrays and objects. Integral
/// floating-point numbers render without a trailing `.0`, so an id of `7.0`
/// and `7` compare equal.
#[must_use]
pub fn scalar_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.as_f64().map_or_else(
            || n.to_string(),
            |f| {
                if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 {
                    format!("{f:.0}")
                } else {
                    n.to_string()
                }
            },
        )),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Scalar string, or the empty string when absent.
#[must_use]
pub fn string_or_empty(value: Option<&Value>) -> String {
    scalar_string(value).unwrap_or_default()
}

/// Browser truthiness of a JSON value.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Follow a path of object keys.
#[must_use]
pub fn lookup<'a>(root: &'a Value, path: Path<'_>) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, key| node.get(key))
}

/// Return the first candidate path whose value is present and not `null`.
#[must_use]
pub fn first_defined<'a>(root: &'a Value, candidates: &[Path<'_>]) -> Option<&'a Value> {
    candidates
        .iter()
        .filter_map(|path| lookup(root, path))
        .find(|v| !v.is_null())
}

/// Return the first candidate path whose value is truthy.
#[must_use]
pub fn first_truthy<'a>(root: &'a Value, candidates: &[Path<'_>]) -> Option<&'a Value> {
    candidates
        .iter()
        .filter_map(|path| lookup(root, path))
        .find(|v| is_truthy(v))
}

/// Return the first candidate path holding an array.
#[must_use]
pub fn first_array<'a>(root: &'a Value, candidates: &[Path<'_>]) -> Option<&'a Vec<Value>> {
    candidates
        .iter()
        .filter_map(|path| lookup(root, path))
        .find_map(Value::as_array)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_to_number_like_browser() {
        assert!((to_number(&json!(null)) - 0.0).abs() < f64::EPSILON);
        assert!((to_number(&json!(true)) - 1.0).abs() < f64::EPSILON);
        assert!((to_number(&json!(" 4.5 ")) - 4.5).abs() < f64::EPSILON);
        assert!((to_number(&json!("")) - 0.0).abs() < f64::EPSILON);
        assert!(to_number(&json!("abc")).is_nan());
        assert!(to_number(&json!({"a": 1})).is_nan());
    }

    #[test]
    fn test_scalar_string() {
        assert_eq!(scalar_string(Some(&json!(7))), Some("7".to_string()));
        assert_eq!(scalar_string(Some(&json!(7.0))), Some("7".to_string()));
        assert_eq!(scalar_string(Some(&json!(7.5))), Some("7.5".to_string()));
        assert_eq!(scalar_string(Some(&json!("p1"))), Some("p1".to_string()));
        assert_eq!(scalar_string(Some(&json!(null))), None);
        assert_eq!(scalar_string(Some(&json!([1]))), None);
        assert_eq!(scalar_string(None), None);
    }

    #[test]
    fn test_first_defined_skips_null() {
        let v = json!({"id": null, "order": {"id": 12}});
        let found = first_defined(&v, &[&["id"], &["order", "id"]]);
        assert_eq!(found, Some(&json!(12)));
    }

    #[test]
    fn test_first_truthy_skips_empty_string() {
        let v = json!({"image": "", "thumbnail": "t.png"});
        let found = first_truthy(&v, &[&["image"], &["thumbnail"]]);
        assert_eq!(found, Some(&json!("t.png")));
    }

    #[test]
    fn test_first_array() {
        let v = json!({"data": {"data": [1, 2]}});
        let found = first_array(&v, &[&["data"], &["data", "data"]]);
        assert_eq!(found.map(Vec::len), Some(2));
    }
}
