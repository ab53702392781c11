use super::TokenError;
use crate::expression::{ExpressionResolver, Resolved};
use crate::json::Match;
use crate::version::DottedVersion;
use serde_json::Value;

/// Resolve a matched value; opaque expressions are kept as their raw text.
pub fn resolve(value: &Value, resolver: &ExpressionResolver<'_>) -> Result<Value, TokenError> {
    Ok(resolver.resolve_value(value)?.into_value())
}

/// Resolve every match and flatten arrays into their elements.
pub fn resolve_items(
    found: &[Match<'_>],
    resolver: &ExpressionResolver<'_>,
) -> Result<Vec<Value>, TokenError> {
    let mut items = Vec::new();
    for m in found {
        match resolve(m.value, resolver)? {
            Value::Array(elements) => {
                for element in &elements {
                    items.push(resolve(element, resolver)?);
                }
            }
            other => items.push(other),
        }
    }
    Ok(items)
}

pub fn as_bool(value: &Value) -> Result<bool, TokenError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(false),
        other => Err(TokenError::coercion("a boolean", other)),
    }
}

pub fn as_i64(value: &Value) -> Result<i64, TokenError> {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| TokenError::coercion("an integer", value))
}

pub fn as_text(value: &Value) -> Result<String, TokenError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(TokenError::coercion("a string", other)),
    }
}

pub fn as_version(value: &Value) -> Result<DottedVersion, TokenError> {
    as_text(value)?
        .parse::<DottedVersion>()
        .map_err(|_| TokenError::coercion("a dotted version", value))
}

pub fn text_eq(a: &str, b: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a.eq_ignore_ascii_case(b)
    }
}

/// JSON equality where strings compare case-insensitively and numbers by value.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.eq_ignore_ascii_case(y),
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::String(s), Value::Bool(v)) | (Value::Bool(v), Value::String(s)) => {
            s.eq_ignore_ascii_case(&v.to_string())
        }
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            s.trim() == n.to_string()
        }
        _ => a == b,
    }
}
