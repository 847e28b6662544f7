//! Scalar values at the decoding boundary and typed values produced by coercion.
//!
//! [`ScalarValue`] is the closed shape every raw JSON value is reduced to before
//! the engine sees it; [`TypedValue`] is what coercion against a schema yields.
//! The number, date, and boolean parsers here are shared by inference and
//! coercion so both sides agree on what "numeric-like" or "date-like" means.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, TimeZone, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ScalarValue {
    /// Reduces a decoded JSON value to a scalar. Arrays and objects are kept as
    /// their compact JSON text.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => ScalarValue::Null,
            JsonValue::Bool(b) => ScalarValue::Bool(*b),
            JsonValue::Number(n) => n.as_f64().map_or(ScalarValue::Null, ScalarValue::Number),
            JsonValue::String(s) => ScalarValue::Text(s.clone()),
            other => ScalarValue::Text(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// Null, or text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            ScalarValue::Null => true,
            ScalarValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn stringify(&self) -> Option<String> {
        match self {
            ScalarValue::Null => None,
            ScalarValue::Bool(b) => Some(b.to_string()),
            ScalarValue::Number(n) => Some(format_number(*n)),
            ScalarValue::Text(s) => Some(s.clone()),
        }
    }

    /// Finite numeric reading of the value, accepting numeric strings.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScalarValue::Number(n) if n.is_finite() => Some(*n),
            ScalarValue::Text(s) => parse_finite_number(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            ScalarValue::Null => JsonValue::Null,
            ScalarValue::Bool(b) => JsonValue::Bool(*b),
            ScalarValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            ScalarValue::Text(s) => JsonValue::String(s.clone()),
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Bool(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Number(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Number(value as f64)
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        ScalarValue::Number(f64::from(value))
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Text(value)
    }
}

impl<T> From<Option<T>> for ScalarValue
where
    T: Into<ScalarValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(ScalarValue::Null, Into::into)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Date(DateTime<Utc>),
    Boolean(bool),
    Option(String),
}

impl TypedValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TypedValue::Integer(i) => Some(*i as f64),
            TypedValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl Serialize for TypedValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            TypedValue::Null => serializer.serialize_none(),
            TypedValue::Text(s) | TypedValue::Option(s) => serializer.serialize_str(s),
            TypedValue::Integer(i) => serializer.serialize_i64(*i),
            TypedValue::Float(f) => serializer.serialize_f64(*f),
            TypedValue::Date(d) => serializer.serialize_str(&format_date(d)),
            TypedValue::Boolean(b) => serializer.serialize_bool(*b),
        }
    }
}

/// Renders a number the way JSON prints it: integral values carry no fraction,
/// and magnitudes below 1e-6 or from 1e21 up switch to exponent form (`1e-7`,
/// `1e+21`).
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if value.is_finite() && (magnitude < 1e-6 || magnitude >= 1e21) {
        let rendered = format!("{value:e}");
        return match rendered.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => rendered,
        };
    }
    value.to_string()
}

pub fn format_date(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses trimmed text as a finite number. Hex, octal, and binary literals with
/// a `0x`/`0o`/`0b` prefix are accepted; empty text never is.
pub fn parse_finite_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_ascii_lowercase();
    for (prefix, radix) in [("0x", 16), ("0o", 8), ("0b", 2)] {
        if let Some(digits) = lowered.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix).ok().map(|n| n as f64);
        }
    }
    // Rust accepts these spellings but JSON-style numbers do not.
    if lowered.contains("inf") || lowered.contains("nan") {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Parses a calendar date or date-time. Values without an offset are read as UTC.
/// Precision stops at milliseconds, matching what [`format_date`] emits.
pub fn parse_date_time(value: &str) -> Option<DateTime<Utc>> {
    parse_date_time_exact(value).map(|parsed| parsed.trunc_subsecs(3))
}

fn parse_date_time_exact(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(parsed.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, fmt) {
            return parsed.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

/// Interprets a number as milliseconds since the Unix epoch.
pub fn date_from_epoch_millis(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let millis = value.trunc();
    if millis < i64::MIN as f64 || millis >= i64::MAX as f64 {
        return None;
    }
    Utc.timestamp_millis_opt(millis as i64).single()
}

/// Strict boolean literal: only "true" and "false", trimmed and case-insensitive.
pub fn parse_boolean_literal(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Boolean token accepted during coercion, which also admits "1" and "0".
pub fn parse_boolean_token(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Trimmed, lower-cased form used for categorical values.
pub fn normalize_token(value: &str) -> String {
    value.trim().to_lowercase()
}

pub fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
