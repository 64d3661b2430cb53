use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{EtlError, Result};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Tokens the raw export uses in place of a missing value. Matched exactly.
pub const SENTINEL_TOKENS: &[&str] = &["UNKNOWN", "ERROR"];

/// A typed cell in the columnar view of a cleaned table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Timestamp(NaiveDateTime),
    Text(String),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Timestamp(ts) => format_timestamp(ts),
            Value::Text(s) => s.clone(),
        }
    }
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_naive_date(value: &str) -> Option<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

pub fn parse_naive_datetime(value: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        TIMESTAMP_FORMAT,
        "%Y-%m-%dT%H:%M:%S%.f",
        "%m/%d/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Trims, lower-cases and collapses whitespace runs into a single underscore.
pub fn normalize_column_name(name: &str) -> String {
    name.split_whitespace()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

pub fn is_sentinel(value: &str) -> bool {
    SENTINEL_TOKENS.contains(&value)
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn day_of_week(ts: &NaiveDateTime) -> String {
    weekday_name(ts.weekday()).to_string()
}

fn coercion_error(column: &str, value: &str, expected: &'static str) -> EtlError {
    EtlError::Coercion {
        column: column.to_string(),
        value: value.to_string(),
        expected,
    }
}

/// Integral text such as `3` or `3.0`; anything with a fractional part fails.
pub fn coerce_integer(column: &str, value: &str) -> Result<i64> {
    let trimmed = value.trim();
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Ok(parsed);
    }
    match trimmed.parse::<f64>() {
        Ok(parsed)
            if parsed.is_finite()
                && parsed.fract() == 0.0
                && parsed.abs() < i64::MAX as f64 =>
        {
            Ok(parsed as i64)
        }
        _ => Err(coercion_error(column, value, "integer")),
    }
}

/// Finite decimal text only; `NaN` and the infinities are rejected.
pub fn coerce_float(column: &str, value: &str) -> Result<f64> {
    match value.trim().parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(coercion_error(column, value, "float")),
    }
}

/// Date-time layouts first, then date-only layouts at midnight.
pub fn coerce_timestamp(column: &str, value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    parse_naive_datetime(trimmed)
        .or_else(|| parse_naive_date(trimmed).map(|date| date.and_time(NaiveTime::MIN)))
        .ok_or_else(|| coercion_error(column, value, "timestamp"))
}
