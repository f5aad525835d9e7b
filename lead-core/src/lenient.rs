//! Lenient deserializers for backend JSON
//!
//! The backend serializes Postgres aggregates inconsistently: counts and
//! money arrive either as JSON numbers or as numeric strings, and absent
//! values as `null`. Every model field goes through one of these helpers so
//! that arithmetic downstream never sees a string.
//!
//! Use together with `#[serde(default)]` so missing keys also normalize.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

/// Any defaultable value; an explicit `null` becomes `T::default()`.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Integer from number, numeric string or null (0).
pub fn int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_int(&value).unwrap_or(0))
}

/// Optional integer; null or unparseable becomes `None`.
pub fn opt_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_int(&value))
}

/// Float from number, numeric string or null (0.0).
pub fn float<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_float(&value).unwrap_or(0.0))
}

/// Decimal from number, numeric string or null (zero).
pub fn decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_decimal(&value).unwrap_or(Decimal::ZERO))
}

/// Optional decimal; null or unparseable becomes `None`.
pub fn opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_decimal(&value))
}

/// Optional text; numbers are rendered, empty strings and null become `None`.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Text that is never absent; null and non-scalars become empty.
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_string(deserializer)?.unwrap_or_default())
}

/// Boolean from `true`/`false`, `1`/`0`, `"t"`/`"true"`/`"yes"`; anything else is false.
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "t" | "1" | "yes"
        ),
        _ => false,
    })
}

/// List of strings; nulls inside the array are dropped, a null array is empty.
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// List of integer ids; entries that do not parse are dropped.
pub fn int_list<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items.iter().filter_map(value_to_int).collect(),
        _ => Vec::new(),
    })
}

/// Timestamp from RFC 3339 or `YYYY-MM-DD HH:MM:SS[.f]` (UTC assumed).
pub fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => parse_timestamp(&s),
        _ => None,
    })
}

/// Parse an integer the way the dashboard always has: fractional part
/// truncated, otherwise the leading numeric prefix (`"12abc"` is 12).
pub fn parse_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n);
    }
    if let Some(f) = trimmed.parse::<f64>().ok().filter(|f| f.is_finite()) {
        return Some(f.trunc() as i64);
    }

    let sign_len = usize::from(trimmed.starts_with(['-', '+']));
    let digits = trimmed[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    trimmed[..sign_len + digits].parse::<i64>().ok()
}

/// Parse a timestamp string, `None` when no known layout matches.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
        .map(|naive| naive.and_utc())
}

fn value_to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => parse_int(s),
        _ => None,
    }
}

fn value_to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn value_to_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "int")]
        count: i64,
        #[serde(default, deserialize_with = "float")]
        seconds: f64,
        #[serde(default, deserialize_with = "decimal")]
        revenue: Decimal,
        #[serde(default, deserialize_with = "timestamp")]
        seen: Option<DateTime<Utc>>,
        #[serde(default, deserialize_with = "string_list")]
        names: Vec<String>,
        #[serde(default, deserialize_with = "opt_string")]
        label: Option<String>,
    }

    #[test]
    fn test_numeric_strings_are_parsed() {
        let row: Row = serde_json::from_value(serde_json::json!({
            "count": "6",
            "seconds": "-12.5",
            "revenue": "14.50",
            "seen": "2024-03-15T10:00:00.000Z",
            "names": ["Ana", null, "Luis"],
            "label": 42
        }))
        .unwrap();

        assert_eq!(row.count, 6);
        assert_eq!(row.seconds, -12.5);
        assert_eq!(row.revenue, Decimal::new(1450, 2));
        assert!(row.seen.is_some());
        assert_eq!(row.names, vec!["Ana", "Luis"]);
        assert_eq!(row.label.as_deref(), Some("42"));
    }

    #[test]
    fn test_missing_and_null_default_to_zero() {
        let row: Row = serde_json::from_value(serde_json::json!({
            "count": null,
            "seconds": "not a number",
            "seen": "yesterday-ish"
        }))
        .unwrap();

        assert_eq!(row.count, 0);
        assert_eq!(row.seconds, 0.0);
        assert_eq!(row.revenue, Decimal::ZERO);
        assert!(row.seen.is_none());
        assert!(row.names.is_empty());
        assert!(row.label.is_none());
    }

    #[test]
    fn test_parse_int_truncates_fraction() {
        assert_eq!(parse_int("6.9"), Some(6));
        assert_eq!(parse_int(" 12 "), Some(12));
        assert_eq!(parse_int("abc"), None);
    }

    #[test]
    fn test_parse_int_takes_numeric_prefix() {
        assert_eq!(parse_int("12abc"), Some(12));
        assert_eq!(parse_int("-7 leads"), Some(-7));
        assert_eq!(parse_int("-"), None);
    }

    #[derive(Debug, Deserialize)]
    struct Flags {
        #[serde(default, deserialize_with = "flag")]
        active: bool,
        #[serde(default, deserialize_with = "string")]
        name: String,
    }

    #[test]
    fn test_flag_and_string_tolerate_junk() {
        let parsed: Flags =
            serde_json::from_value(serde_json::json!({"active": null, "name": null})).unwrap();
        assert!(!parsed.active);
        assert_eq!(parsed.name, "");

        let parsed: Flags =
            serde_json::from_value(serde_json::json!({"active": "t", "name": 42})).unwrap();
        assert!(parsed.active);
        assert_eq!(parsed.name, "42");

        let parsed: Flags = serde_json::from_value(serde_json::json!({"active": 1})).unwrap();
        assert!(parsed.active);
    }

    #[test]
    fn test_postgres_timestamp_layout() {
        let ts = parse_timestamp("2024-03-15 08:30:00.123").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-15T08:30:00.123+00:00");
    }
}
