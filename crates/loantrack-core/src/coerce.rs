//! Lenient coercion of backend JSON values into canonical Rust types.
//!
//! The LoanTrack backend serialises its decimal columns as JSON numbers on
//! some endpoints and as decimal strings on others, and older records can
//! carry nulls or empty strings where a value is expected. Everything that
//! crosses the wire goes through the helpers in this module exactly once;
//! downstream arithmetic never sees anything but a finite [`Decimal`].
//!
//! Invalid or missing values degrade to `0` (or `None` for optional
//! fields). They never panic and never produce an error.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Coerce a JSON value into a decimal amount.
///
/// - numbers keep their exact textual value (`0.1` stays `0.1`)
/// - strings are trimmed and parsed as plain or scientific notation
/// - everything else, including an absent value, is `0`
pub fn coerce_decimal(value: Option<&Value>) -> Decimal {
    match value {
        Some(Value::Number(n)) => number_to_decimal(n),
        Some(Value::String(s)) => parse_decimal(s).unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

/// Integral view of [`coerce_decimal`], truncated toward zero.
///
/// Values outside the `i64` range collapse to `0`.
pub fn coerce_count(value: Option<&Value>) -> i64 {
    coerce_decimal(value).trunc().to_i64().unwrap_or(0)
}

/// Like [`coerce_count`] but keeps "absent" distinct from zero.
pub fn coerce_opt_int(value: Option<&Value>) -> Option<i64> {
    match value {
        Some(Value::Number(n)) => number_to_decimal(n).trunc().to_i64(),
        Some(Value::String(s)) => parse_decimal(s)?.trunc().to_i64(),
        _ => None,
    }
}

/// Coerce a JSON value into a calendar date.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and naive
/// `YYYY-MM-DDTHH:MM:SS[.fff]` timestamps. The date is taken as written:
/// the time-of-day and any UTC offset are dropped, not applied.
pub fn coerce_date(value: Option<&Value>) -> Option<NaiveDate> {
    match value {
        Some(Value::String(s)) => parse_date(s),
        _ => None,
    }
}

/// Coerce a JSON value into a non-empty string. Numbers are rendered.
pub fn coerce_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Coerce a JSON value into a boolean. Only `true` and `"true"` are true.
pub fn coerce_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Sum of `amounts`, clamped at the bounds of [`Decimal`] instead of
/// overflowing.
pub fn saturating_sum(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts
        .into_iter()
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

fn number_to_decimal(n: &serde_json::Number) -> Decimal {
    if let Some(i) = n.as_i64() {
        return Decimal::from(i);
    }
    if let Some(d) = parse_decimal(&n.to_string()) {
        return d;
    }
    n.as_f64().and_then(Decimal::from_f64).unwrap_or(Decimal::ZERO)
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.date_naive());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts.date());
    }
    None
}

// ── serde adapters ──
//
// For use with `#[serde(default, deserialize_with = "...")]` on wire structs.

pub fn decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(coerce_decimal(value.as_ref()))
}

pub fn opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(v) => Some(coerce_decimal(Some(&v))),
    })
}

pub fn count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(coerce_count(value.as_ref()))
}

pub fn date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(coerce_date(value.as_ref()))
}

pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(coerce_string(value.as_ref()).unwrap_or_default())
}

pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(coerce_string(value.as_ref()))
}

/// A list of strings; anything that is not an array is empty, and
/// elements that are not strings or numbers are skipped.
pub fn strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| coerce_string(Some(v)))
            .collect(),
        _ => Vec::new(),
    })
}

/// An enum label parsed through its `From<String>`; absent or non-string
/// values fall back to the enum's default.
pub fn label<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<String> + Default,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(coerce_string(value.as_ref())
        .map(T::from)
        .unwrap_or_default())
}

pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(coerce_bool(value.as_ref()))
}
