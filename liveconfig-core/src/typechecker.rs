//! Coercion of raw external input into the kind an attribute already holds.
//!
//! Raw input is text (a CLI argument, a form field). Tuples and lists are
//! written comma-separated, optionally wrapped in `()` or `[]`:
//! `"(1, 2, 3)"`, `"[a, 'b c']"`, `"4,5"`.

use tracing::warn;

use crate::error::CoercionError;
use crate::types::{TrackedObject, Value, ValueKind};

const TRUTHY: [&str; 6] = ["true", "t", "yes", "y", "on", "1"];
const FALSY: [&str; 6] = ["false", "f", "no", "n", "off", "0"];

/// A coercion entry: `(raw, current value) -> new value of the same kind`.
pub type Coercer = fn(&str, &Value) -> Result<Value, CoercionError>;

/// Coercion table keyed by the kind of the value being replaced.
pub fn coercer_for(kind: ValueKind) -> Coercer {
    match kind {
        ValueKind::Bool => bool_entry,
        ValueKind::Int => int_entry,
        ValueKind::Float => float_entry,
        ValueKind::Str => str_entry,
        ValueKind::Tuple => tuple_entry,
        ValueKind::List => list_entry,
        ValueKind::Null | ValueKind::Opaque => unsupported_entry,
    }
}

fn bool_entry(raw: &str, _: &Value) -> Result<Value, CoercionError> {
    coerce_bool(raw).map(Value::Bool)
}

fn int_entry(raw: &str, _: &Value) -> Result<Value, CoercionError> {
    coerce_int(raw).map(Value::Int)
}

fn float_entry(raw: &str, _: &Value) -> Result<Value, CoercionError> {
    coerce_float(raw).map(Value::Float)
}

fn str_entry(raw: &str, _: &Value) -> Result<Value, CoercionError> {
    Ok(Value::Str(raw.to_owned()))
}

fn tuple_entry(raw: &str, current: &Value) -> Result<Value, CoercionError> {
    tuple_from(raw, current).map(Value::Tuple)
}

fn list_entry(raw: &str, current: &Value) -> Result<Value, CoercionError> {
    list_from(raw, current).map(Value::List)
}

fn unsupported_entry(_: &str, current: &Value) -> Result<Value, CoercionError> {
    Err(CoercionError::Unsupported(current.kind()))
}

/// Coerce `raw` into a value of the same kind as `current`.
pub fn coerce(raw: &str, current: &Value) -> Result<Value, CoercionError> {
    coercer_for(current.kind())(raw, current)
}

/// Case-insensitive boolean tokens; anything unrecognised is an error.
pub fn coerce_bool(raw: &str) -> Result<bool, CoercionError> {
    let token = raw.trim().to_ascii_lowercase();
    if TRUTHY.contains(&token.as_str()) {
        Ok(true)
    } else if FALSY.contains(&token.as_str()) {
        Ok(false)
    } else {
        Err(CoercionError::Bool(raw.to_owned()))
    }
}

/// Base-10 `i64`; overflow is an error.
pub fn coerce_int(raw: &str) -> Result<i64, CoercionError> {
    raw.trim().parse().map_err(|source| CoercionError::Int {
        raw: raw.to_owned(),
        source,
    })
}

/// Finite `f64`; `inf` and `NaN` are rejected.
pub fn coerce_float(raw: &str) -> Result<f64, CoercionError> {
    let value: f64 = raw.trim().parse().map_err(|source| CoercionError::Float {
        raw: raw.to_owned(),
        source,
    })?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CoercionError::NonFinite(raw.to_owned()))
    }
}

/// Parse `raw` as a tuple shaped like the tuple currently at `attr`.
///
/// Arity and per-position kinds come from the current value. Returns `None`
/// (with a warning) when the input does not fit.
pub fn coerce_tuple(raw: &str, owner: &TrackedObject, attr: &str) -> Option<Value> {
    let current = owner.get(attr)?;
    match tuple_from(raw, current) {
        Ok(items) => Some(Value::Tuple(items)),
        Err(e) => {
            warn!("failed to parse tuple for '{attr}': {e}");
            None
        }
    }
}

/// Parse `raw` as a list whose elements take the kind of the first element
/// currently at `attr`. Length is free. Returns `None` (with a warning) on an
/// element that does not fit.
pub fn coerce_list(raw: &str, owner: &TrackedObject, attr: &str) -> Option<Value> {
    let current = owner.get(attr)?;
    match list_from(raw, current) {
        Ok(items) => Some(Value::List(items)),
        Err(e) => {
            warn!("failed to parse list for '{attr}': {e}");
            None
        }
    }
}

fn tuple_from(raw: &str, current: &Value) -> Result<Vec<Value>, CoercionError> {
    let template = current.as_slice().unwrap_or_default();
    let parts = split_elements(raw);
    if parts.len() != template.len() {
        return Err(CoercionError::Arity {
            expected: template.len(),
            found: parts.len(),
        });
    }
    parts
        .iter()
        .zip(template)
        .enumerate()
        .map(|(index, (part, like))| coerce_element(part, like, index))
        .collect()
}

fn list_from(raw: &str, current: &Value) -> Result<Vec<Value>, CoercionError> {
    let first = current.as_slice().and_then(<[Value]>::first);
    split_elements(raw)
        .iter()
        .enumerate()
        .map(|(index, part)| match first {
            Some(like) => coerce_element(part, like, index),
            None => Ok(Value::Str(unquote(part).to_owned())),
        })
        .collect()
}

fn coerce_element(part: &str, like: &Value, index: usize) -> Result<Value, CoercionError> {
    let result = match like.kind() {
        ValueKind::Str => Ok(Value::Str(unquote(part).to_owned())),
        ValueKind::Tuple | ValueKind::List => Err(CoercionError::Unsupported(like.kind())),
        _ => coerce(part, like),
    };
    result.map_err(|source| CoercionError::Element {
        index,
        source: Box::new(source),
    })
}

/// Strip one pair of enclosing brackets and split on commas. A single
/// trailing comma (`"(1,)"`) is ignored.
fn split_elements(raw: &str) -> Vec<&str> {
    let trimmed = raw.trim();
    let inner = ["()", "[]"]
        .iter()
        .find_map(|pair| {
            let (open, close) = pair.split_at(1);
            trimmed.strip_prefix(open)?.strip_suffix(close)
        })
        .unwrap_or(trimmed);

    if inner.trim().is_empty() {
        return Vec::new();
    }
    let mut parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() > 1 && parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    parts
}

fn unquote(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("true", true)]
    #[case("TRUE", true)]
    #[case(" yes ", true)]
    #[case("On", true)]
    #[case("1", true)]
    #[case("false", false)]
    #[case("No", false)]
    #[case("off", false)]
    #[case("0", false)]
    fn bool_tokens(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(coerce_bool(raw), Ok(expected));
    }

    #[rstest]
    #[case("")]
    #[case("maybe")]
    #[case("2")]
    #[case("truee")]
    fn bool_rejects_unknown_tokens(#[case] raw: &str) {
        assert!(matches!(coerce_bool(raw), Err(CoercionError::Bool(_))));
    }

    #[test]
    fn int_parsing() {
        assert_eq!(coerce_int("42"), Ok(42));
        assert_eq!(coerce_int(" -7 "), Ok(-7));
        assert!(coerce_int("4.2").is_err());
        assert!(coerce_int("abc").is_err());
        assert!(coerce_int("99999999999999999999").is_err());
    }

    #[test]
    fn tuple_keeps_arity_and_positional_kinds() {
        let obj = TrackedObject::new("Player").with(
            "pos",
            Value::Tuple(vec![Value::Int(0), Value::Float(0.0), Value::Str("n".into())]),
        );
        let got = coerce_tuple("(3, 1.5, 'east')", &obj, "pos");
        assert_eq!(
            got,
            Some(Value::Tuple(vec![
                Value::Int(3),
                Value::Float(1.5),
                Value::Str("east".into())
            ]))
        );
        assert_eq!(coerce_tuple("(3, 1.5)", &obj, "pos"), None);
        assert_eq!(coerce_tuple("(x, 1.5, east)", &obj, "pos"), None);
    }

    #[test]
    fn tuple_arity_error_reports_counts() {
        let current = Value::Tuple(vec![Value::Int(0); 3]);
        assert_eq!(
            coerce("1,2", &current),
            Err(CoercionError::Arity { expected: 3, found: 2 })
        );
    }

    #[test]
    fn list_follows_first_element_kind_and_any_length() {
        let obj = TrackedObject::new("Player").with("scores", vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(
            coerce_list("[4, 5, 6, 7]", &obj, "scores"),
            Some(Value::List(vec![Value::Int(4), Value::Int(5), Value::Int(6), Value::Int(7)]))
        );
        assert_eq!(coerce_list("[]", &obj, "scores"), Some(Value::List(vec![])));
        assert_eq!(coerce_list("[4, five]", &obj, "scores"), None);
    }

    #[test]
    fn list_without_template_takes_strings() {
        let current = Value::List(vec![]);
        assert_eq!(
            coerce("a, \"b\"", &current),
            Ok(Value::List(vec![Value::Str("a".into()), Value::Str("b".into())]))
        );
    }

    #[test]
    fn single_element_tuple_with_trailing_comma() {
        let current = Value::Tuple(vec![Value::Bool(false)]);
        assert_eq!(coerce("(yes,)", &current), Ok(Value::Tuple(vec![Value::Bool(true)])));
    }

    #[test]
    fn direct_coercions() {
        assert_eq!(coerce("2.5", &Value::Float(0.0)), Ok(Value::Float(2.5)));
        assert_eq!(coerce("  hi ", &Value::Str(String::new())), Ok(Value::Str("  hi ".into())));
        assert_eq!(
            coerce("x", &Value::Null),
            Err(CoercionError::Unsupported(ValueKind::Null))
        );
        assert!(coerce("x", &Value::Opaque("<obj>".into())).is_err());
    }

    #[rstest]
    #[case("inf")]
    #[case("-infinity")]
    #[case("NaN")]
    #[case("1e999")]
    fn float_rejects_non_finite(#[case] raw: &str) {
        assert_eq!(coerce_float(raw), Err(CoercionError::NonFinite(raw.to_owned())));
        assert!(coerce(raw, &Value::Float(9.81)).is_err());
    }

    #[test]
    fn nested_containers_are_not_coercible() {
        let current = Value::List(vec![Value::Tuple(vec![Value::Int(1)])]);
        assert!(matches!(coerce("[1]", &current), Err(CoercionError::Element { index: 0, .. })));
    }
}
