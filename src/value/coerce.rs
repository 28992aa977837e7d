//! Conversion of loosely typed operands into a declared logical type.
//!
//! Temporal text is tried against the canonical format first, then the
//! legacy JDBC escape form (`{d '2024-01-10'}`) found in older files, then a
//! list of free-form patterns. The first success wins.

use crate::condition::variable_name;
use crate::value::{LogicalType, Value};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use log::warn;
use std::borrow::Cow;

/// Canonical date format
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Canonical time format
pub const TIME_FORMAT: &str = "%H:%M:%S";
/// Canonical timestamp format
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TIMESTAMP_FRACTION_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const GENERIC_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%a %b %d %H:%M:%S %Y",
];

const GENERIC_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%b-%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%Y%m%d",
];

const GENERIC_TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];

/// Result of the free-form parser before it is narrowed to a target type
#[derive(Debug, Clone, Copy)]
enum Parsed {
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
}

/// Parse temporal text into `ty` using the canonical, legacy and free-form
/// formats in that order.
///
/// Returns `None` when `ty` is not temporal or nothing matched.
pub fn parse_temporal(text: &str, ty: LogicalType) -> Option<Value> {
    let text = text.trim();
    parse_canonical(text, ty)
        .or_else(|| parse_legacy(text, ty))
        .or_else(|| parse_generic(text).and_then(|parsed| narrow(parsed, ty)))
}

fn parse_canonical(text: &str, ty: LogicalType) -> Option<Value> {
    match ty {
        LogicalType::Date => NaiveDate::parse_from_str(text, DATE_FORMAT)
            .ok()
            .map(Value::Date),
        LogicalType::Time => NaiveTime::parse_from_str(text, TIME_FORMAT)
            .ok()
            .map(Value::Time),
        LogicalType::TimeInstant => NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(text, TIMESTAMP_FRACTION_FORMAT))
            .ok()
            .map(Value::Timestamp),
        _ => None,
    }
}

/// Older files wrap literals in JDBC escapes: `{d '...'}`, `{t '...'}`, `{ts '...'}`.
fn parse_legacy(text: &str, ty: LogicalType) -> Option<Value> {
    let inner = text.strip_prefix('{')?.strip_suffix('}')?.trim();
    let (tag, rest) = inner.split_once(char::is_whitespace)?;
    let literal = rest.trim().strip_prefix('\'')?.strip_suffix('\'')?;

    let parsed = match tag {
        "d" => Parsed::Date(NaiveDate::parse_from_str(literal, DATE_FORMAT).ok()?),
        "t" => Parsed::Time(NaiveTime::parse_from_str(literal, TIME_FORMAT).ok()?),
        "ts" => Parsed::DateTime(
            NaiveDateTime::parse_from_str(literal, TIMESTAMP_FORMAT)
                .or_else(|_| NaiveDateTime::parse_from_str(literal, TIMESTAMP_FRACTION_FORMAT))
                .ok()?,
        ),
        _ => return None,
    };
    narrow(parsed, ty)
}

fn parse_generic(text: &str) -> Option<Parsed> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(Parsed::DateTime(dt.naive_local()));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(Parsed::DateTime(dt.naive_local()));
    }

    GENERIC_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(Parsed::DateTime)
        .or_else(|| {
            GENERIC_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .map(Parsed::Date)
        })
        .or_else(|| {
            GENERIC_TIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
                .map(Parsed::Time)
        })
}

fn narrow(parsed: Parsed, ty: LogicalType) -> Option<Value> {
    match (parsed, ty) {
        (Parsed::DateTime(dt), LogicalType::Date) => Some(Value::Date(dt.date())),
        (Parsed::Date(d), LogicalType::Date) => Some(Value::Date(d)),
        (Parsed::DateTime(dt), LogicalType::Time) => Some(Value::Time(dt.time())),
        (Parsed::Time(t), LogicalType::Time) => Some(Value::Time(t)),
        (Parsed::DateTime(dt), LogicalType::TimeInstant) => Some(Value::Timestamp(dt)),
        (Parsed::Date(d), LogicalType::TimeInstant) => {
            Some(Value::Timestamp(d.and_time(NaiveTime::MIN)))
        }
        _ => None,
    }
}

/// Stand-in for an unparseable temporal literal: the current instant as `ty`.
fn now_as(ty: LogicalType) -> Value {
    let now = Local::now().naive_local();
    match ty {
        LogicalType::Date => Value::Date(now.date()),
        LogicalType::Time => Value::Time(now.time()),
        _ => Value::Timestamp(now),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" => Some(true),
        "false" | "f" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Convert text into `ty`.
///
/// Never fails: numbers default to zero, booleans to `false` and temporal
/// values to the current instant, each with a logged warning. Empty text is
/// NULL for every non-string type.
pub fn coerce_str(text: &str, ty: LogicalType) -> Value {
    if matches!(ty, LogicalType::String | LogicalType::Char | LogicalType::Role) {
        return Value::String(text.to_string());
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }

    match ty {
        LogicalType::Boolean => Value::Boolean(parse_bool(trimmed).unwrap_or_else(|| {
            warn!("Invalid boolean literal '{}', using false", text);
            false
        })),
        ty if ty.is_integral() => match trimmed.parse::<i64>() {
            Ok(i) => Value::Integer(i),
            // "10.0" style literals written by float-formatting front ends
            Err(_) => match trimmed.parse::<f64>() {
                Ok(d) if d.is_finite() => Value::Integer(d.trunc() as i64),
                _ => {
                    warn!("Invalid {} literal '{}', using 0", ty, text);
                    Value::Integer(0)
                }
            },
        },
        ty if ty.is_numeric() => match trimmed.parse::<f64>() {
            Ok(d) => Value::Double(d),
            Err(_) => {
                warn!("Invalid {} literal '{}', using 0.0", ty, text);
                Value::Double(0.0)
            }
        },
        ty if ty.is_temporal() => parse_temporal(trimmed, ty).unwrap_or_else(|| {
            warn!(
                "Unparseable {} literal '{}', substituting the current time",
                ty, text
            );
            now_as(ty)
        }),
        _ => Value::String(text.to_string()),
    }
}

/// Convert an already-typed value into `ty`.
///
/// Arrays are converted element-wise and variable placeholders (`$(name)`)
/// are left untouched.
pub fn coerce_value(value: &Value, ty: LogicalType) -> Value {
    match value {
        Value::Null | Value::Merged(_) => value.clone(),
        Value::Array(items) => Value::Array(items.iter().map(|v| coerce_value(v, ty)).collect()),
        Value::String(s) if variable_name(value).is_some() => Value::String(s.clone()),
        Value::String(s) => coerce_str(s, ty),
        _ if matches!(ty, LogicalType::String | LogicalType::Char) => {
            Value::String(value.to_string())
        }
        Value::Integer(i) => match ty {
            LogicalType::Float | LogicalType::Double | LogicalType::Decimal => {
                Value::Double(*i as f64)
            }
            LogicalType::Boolean => Value::Boolean(*i != 0),
            _ => value.clone(),
        },
        Value::Double(d) => match ty {
            ty if ty.is_integral() => Value::Integer(d.trunc() as i64),
            LogicalType::Boolean => Value::Boolean(*d != 0.0),
            _ => value.clone(),
        },
        Value::Boolean(b) => match ty {
            ty if ty.is_integral() => Value::Integer(i64::from(*b)),
            ty if ty.is_numeric() => Value::Double(if *b { 1.0 } else { 0.0 }),
            _ => value.clone(),
        },
        Value::Date(d) => match ty {
            LogicalType::TimeInstant => Value::Timestamp(d.and_time(NaiveTime::MIN)),
            _ => value.clone(),
        },
        Value::Timestamp(ts) => match ty {
            LogicalType::Date => Value::Date(ts.date()),
            LogicalType::Time => Value::Time(ts.time()),
            _ => value.clone(),
        },
        Value::Time(_) => value.clone(),
    }
}

/// Make a stored operand comparable with a row value.
///
/// Only string operands compared against temporal row values are converted,
/// using the same fallback chain as [`coerce_str`]. The row value is never
/// converted.
pub fn normalize_for<'a>(operand: &'a Value, runtime: &Value) -> Cow<'a, Value> {
    let target = match runtime {
        Value::Date(_) => LogicalType::Date,
        Value::Time(_) => LogicalType::Time,
        Value::Timestamp(_) => LogicalType::TimeInstant,
        _ => return Cow::Borrowed(operand),
    };

    match operand {
        Value::String(s) if variable_name(operand).is_none() => Cow::Owned(coerce_str(s, target)),
        _ => Cow::Borrowed(operand),
    }
}
