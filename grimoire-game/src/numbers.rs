//! Lenient numeric parsing used at the data boundary.
//!
//! Character sheets and reference records come from hand-edited forms and
//! partially migrated documents. Everything here degrades to zero instead of
//! failing, so the rules engine itself only ever sees well-formed numbers.

use num_traits::cast::cast;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Clamp an i64 into the i32 range.
#[must_use]
pub fn clamp_i64_to_i32(value: i64) -> i32 {
    let clamped = value.clamp(i64::from(i32::MIN), i64::from(i32::MAX));
    cast::<i64, i32>(clamped).unwrap_or(0)
}

/// Truncate a f64 toward zero into the i32 range, returning 0 for non-finite values.
#[must_use]
pub fn truncate_f64_to_i32(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    let min = cast::<i32, f64>(i32::MIN).unwrap_or(f64::MIN);
    let max = cast::<i32, f64>(i32::MAX).unwrap_or(f64::MAX);
    cast::<f64, i32>(value.trunc().clamp(min, max)).unwrap_or(0)
}

fn split_sign(raw: &str) -> (bool, &str) {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix('-') {
        (true, rest)
    } else {
        (false, trimmed.strip_prefix('+').unwrap_or(trimmed))
    }
}

/// Parse the leading integer of a string (`"12abc"` → 12), 0 when there is none.
#[must_use]
pub fn lenient_i32(raw: &str) -> i32 {
    let (negative, digits) = split_sign(raw);
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let Ok(magnitude) = digits[..end].parse::<i64>() else {
        return 0;
    };
    clamp_i64_to_i32(if negative { -magnitude } else { magnitude })
}

/// Parse the leading decimal number of a string (`"12.5g"` → 12.5), 0 when there is none.
#[must_use]
pub fn lenient_f64(raw: &str) -> f64 {
    let (negative, body) = split_sign(raw);
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (idx, ch) in body.char_indices() {
        if ch.is_ascii_digit() {
            seen_digit = true;
            end = idx + 1;
        } else if ch == '.' && !seen_dot {
            seen_dot = true;
            end = idx + 1;
        } else {
            break;
        }
    }
    if !seen_digit {
        return 0.0;
    }
    let parsed = body[..end].trim_end_matches('.').parse::<f64>().unwrap_or(0.0);
    if negative { -parsed } else { parsed }
}

#[must_use]
pub fn value_to_i32(value: &Value) -> i32 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(clamp_i64_to_i32)
            .or_else(|| n.as_f64().map(truncate_f64_to_i32))
            .unwrap_or(0),
        Value::String(s) => lenient_i32(s),
        _ => 0,
    }
}

#[must_use]
pub fn value_to_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(|f| cast::<f64, i64>(f.trunc())))
            .unwrap_or(0),
        Value::String(s) => i64::from(lenient_i32(s)),
        _ => 0,
    }
}

#[must_use]
pub fn value_to_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => lenient_f64(s),
        _ => 0.0,
    }
}

#[must_use]
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Read booleans, numbers (non-zero is true) and `"true"`/`"false"` text.
/// `None` when the value says nothing usable.
#[must_use]
pub fn value_to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f.abs() > f64::EPSILON),
        Value::String(s) => match s.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Deserialize any JSON scalar as a flag, defaulting to `false`.
///
/// # Errors
///
/// Only fails when the underlying input is not valid JSON.
pub fn deserialize_lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_bool(&Value::deserialize(deserializer)?).unwrap_or(false))
}

/// Deserialize any JSON scalar as an i32, defaulting to 0.
///
/// # Errors
///
/// Only fails when the underlying input is not valid JSON.
pub fn deserialize_lenient_i32<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_i32(&Value::deserialize(deserializer)?))
}

/// Deserialize any JSON scalar as an i64, defaulting to 0.
///
/// # Errors
///
/// Only fails when the underlying input is not valid JSON.
pub fn deserialize_lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_i64(&Value::deserialize(deserializer)?))
}

/// Deserialize any JSON scalar as a f64, defaulting to 0.
///
/// # Errors
///
/// Only fails when the underlying input is not valid JSON.
pub fn deserialize_lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_f64(&Value::deserialize(deserializer)?))
}

/// Deserialize strings and numbers as text, anything else as an empty string.
///
/// # Errors
///
/// Only fails when the underlying input is not valid JSON.
pub fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(&Value::deserialize(deserializer)?))
}

/// Treat an explicit `null` like a missing field.
///
/// # Errors
///
/// Fails when a non-null value does not match `T`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Smallest `<prefix>-<n>` (n ≥ 1) not already taken.
#[must_use]
pub fn next_sequential_id<'a, I>(prefix: &str, taken: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let highest = taken
        .into_iter()
        .filter_map(|id| id.strip_prefix(prefix)?.strip_prefix('-')?.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("{prefix}-{}", highest.saturating_add(1))
}
