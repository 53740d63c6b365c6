//! Text-to-value coercion for captured fields.
//!
//! A captured field becomes an integer only when the integer formats back
//! to exactly the same text. Leading zeros, signs that do not survive
//! formatting, decimals, dotted addresses and placeholder tokens such as
//! `-` or `***` therefore stay strings.

use serde_json::Value;

/// Coerces a captured field into a JSON value.
///
/// # Examples
///
/// ```
/// use netlog_core::coerce;
/// use serde_json::Value;
///
/// assert_eq!(coerce("12"), Value::from(12));
/// assert_eq!(coerce("012"), Value::from("012"));
/// assert_eq!(coerce("1.5"), Value::from("1.5"));
/// assert_eq!(coerce("-"), Value::from("-"));
/// ```
pub fn coerce(raw: &str) -> Value {
    match coerce_int(raw) {
        Some(n) => Value::from(n),
        None => Value::String(raw.to_string()),
    }
}

/// Returns the integer value of `raw` when it round-trips exactly.
pub fn coerce_int(raw: &str) -> Option<i64> {
    let n = raw.parse::<i64>().ok()?;
    (n.to_string() == raw).then_some(n)
}

/// Coerces an optional capture, mapping an absent capture to `null`.
pub fn coerce_opt(raw: Option<&str>) -> Value {
    raw.map_or(Value::Null, coerce)
}
