//! Turn raw strings into typed JSON values for one field.
//!
//! - Int and Float parse locale-independently. An Int field rejects
//!   fractional input; a Float field accepts integer-looking input.
//! - Str passes through untouched.
//! - Bool accepts `true/yes/on/1` and `false/no/off/0` in any case and
//!   rejects everything else.
//! - Lists split on `,` (optionally wrapped in `[...]`), trimming items and
//!   dropping empty ones, so `""` is an empty list.
//! - Maps split on `,` (optionally wrapped in `{...}`), then each pair on the
//!   first `:` or `=`.
//! - Optional scalars treat `null` (any case) and `None` as unset.
//! - A custom parser receives the raw string verbatim; its failures come back
//!   in the same [`CoercionError`] shape as built-in ones.
//!
//! Elements containing a literal `,` cannot be expressed; there is no escape
//! syntax.

use serde_json::{Map, Number, Value};

use crate::error::CoercionError;
use crate::schema::FieldDescriptor;
use crate::types::{FieldType, RawValue};

const ITEM_SEPARATOR: char = ',';
const PAIR_SEPARATORS: [char; 2] = [':', '='];

/// Coerce `raw` into the declared type of `descriptor`.
///
/// `path` is the dotted field path, used only for error reporting.
pub fn coerce(
    raw: &RawValue,
    descriptor: &FieldDescriptor,
    path: &str,
) -> Result<Value, CoercionError> {
    let declared = descriptor.declared_type();

    if let Some(custom) = descriptor.custom_coercer() {
        let joined = raw.joined();
        return custom(&joined)
            .map_err(|reason| CoercionError::new(path, joined, declared.to_string(), reason));
    }

    let value = coerce_type(raw, declared)
        .map_err(|f| CoercionError::new(path, f.raw, f.expected, f.reason))?;
    descriptor
        .check(&value)
        .map_err(|reason| CoercionError::new(path, raw.joined(), declared.to_string(), reason))?;
    Ok(value)
}

/// Where coercion went wrong, before the field path is attached. For
/// containers `raw` is the offending item, not the whole input.
#[derive(Debug)]
struct Failure {
    raw: String,
    expected: String,
    reason: String,
}

impl Failure {
    fn new(raw: &str, expected: impl ToString, reason: impl Into<String>) -> Self {
        Failure {
            raw: raw.to_string(),
            expected: expected.to_string(),
            reason: reason.into(),
        }
    }
}

fn coerce_type(raw: &RawValue, ty: &FieldType) -> Result<Value, Failure> {
    match ty {
        FieldType::List(item) => {
            let mut values = Vec::new();
            for chunk in raw.items() {
                for token in split_items(chunk, '[', ']') {
                    values.push(coerce_simple(token, item)?);
                }
            }
            Ok(Value::Array(values))
        }
        FieldType::Map(key, value) => {
            let mut map = Map::new();
            for chunk in raw.items() {
                for token in split_items(chunk, '{', '}') {
                    let (k, v) = split_pair(token)?;
                    let k = map_key(coerce_simple(k, key)?);
                    map.insert(k, coerce_simple(v, value)?);
                }
            }
            Ok(Value::Object(map))
        }
        FieldType::Record(record) => Err(Failure::new(
            &raw.joined(),
            ty,
            format!("{} is a nested record and has no raw form", record.type_name),
        )),
        simple => coerce_simple(raw.last().unwrap_or(""), simple),
    }
}

/// A scalar, or an Optional wrapping one.
fn coerce_simple(raw: &str, ty: &FieldType) -> Result<Value, Failure> {
    match ty {
        FieldType::Optional(_) if is_null(raw) => Ok(Value::Null),
        FieldType::Optional(inner) => coerce_simple(raw, inner),
        FieldType::Int => parse_int(raw).map(Value::Number),
        FieldType::Float => parse_float(raw).map(Value::Number),
        FieldType::Str => Ok(Value::String(raw.to_string())),
        FieldType::Bool => parse_bool(raw).map(Value::Bool),
        other => Err(Failure::new(raw, other, "not a scalar type")),
    }
}

fn parse_int(raw: &str) -> Result<Number, Failure> {
    let text = raw.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Ok(Number::from(i));
    }
    if let Ok(u) = text.parse::<u64>() {
        return Ok(Number::from(u));
    }
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    let reason = if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        "integer out of range"
    } else if text.parse::<f64>().is_ok_and(|f| f.is_finite() && f.fract() != 0.0) {
        "fractional value for an integer field"
    } else {
        "not a valid integer"
    };
    Err(Failure::new(raw, FieldType::Int, reason))
}

fn parse_float(raw: &str) -> Result<Number, Failure> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| Failure::new(raw, FieldType::Float, e.to_string()))?;
    Number::from_f64(value).ok_or_else(|| Failure::new(raw, FieldType::Float, "value is not finite"))
}

fn parse_bool(raw: &str) -> Result<bool, Failure> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(Failure::new(
            raw,
            FieldType::Bool,
            "expected one of true/yes/on/1 or false/no/off/0",
        )),
    }
}

fn is_null(raw: &str) -> bool {
    let text = raw.trim();
    text.eq_ignore_ascii_case("null") || text == "None"
}

fn split_items(raw: &str, open: char, close: char) -> Vec<&str> {
    let mut text = raw.trim();
    if let Some(inner) = text.strip_prefix(open).and_then(|t| t.strip_suffix(close)) {
        text = inner;
    }
    text.split(ITEM_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

fn split_pair(token: &str) -> Result<(&str, &str), Failure> {
    match token.find(PAIR_SEPARATORS) {
        Some(at) => Ok((token[..at].trim(), token[at + 1..].trim())),
        None => Err(Failure::new(
            token,
            "key=value or key:value",
            "missing ':' or '=' separator",
        )),
    }
}

/// JSON object keys are strings; integer keys keep their decimal form and
/// deserialize back into integer-keyed maps.
fn map_key(key: Value) -> String {
    match key {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Render a typed value back into the raw form the coercer accepts.
///
/// Used for help text, so empty containers render as `[]` and `{}` rather
/// than an invisible empty string.
pub fn to_raw(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) if items.is_empty() => "[]".to_string(),
        Value::Array(items) => items.iter().map(to_raw).collect::<Vec<_>>().join(","),
        Value::Object(map) if map.is_empty() => "{}".to_string(),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}={}", to_raw(v)))
            .collect::<Vec<_>>()
            .join(","),
    }
}
