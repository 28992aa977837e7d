//! Comparators used by the comparison operators.
//!
//! A comparator is chosen from the condition's logical type. NULL sorts
//! before every other value and equals only NULL.

use crate::value::{LogicalType, Value};
use std::cmp::Ordering;

/// Type-aware comparison strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// Compares calendar dates, ignoring any time of day
    Date,
    /// Compares times of day, ignoring any date
    Time,
    /// Compares full instants; dates sit at midnight
    Timestamp,
    /// Array cells match when any element matches
    Role { case_sensitive: bool },
    Boolean,
    Default { case_sensitive: bool },
}

impl Comparator {
    /// Pick the comparator for a declared type
    pub fn for_type(ty: LogicalType, case_sensitive: bool) -> Self {
        match ty {
            LogicalType::Date => Comparator::Date,
            LogicalType::Time => Comparator::Time,
            LogicalType::TimeInstant => Comparator::Timestamp,
            LogicalType::Role => Comparator::Role { case_sensitive },
            LogicalType::Boolean => Comparator::Boolean,
            _ => Comparator::Default { case_sensitive },
        }
    }

    pub fn equals(&self, a: &Value, b: &Value) -> bool {
        self.compare(a, b) == Ordering::Equal
    }

    /// Compare two values
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        match (a, b) {
            (Value::Null, Value::Null) => return Ordering::Equal,
            (Value::Null, _) => return Ordering::Less,
            (_, Value::Null) => return Ordering::Greater,
            _ => {}
        }

        match self {
            Comparator::Date => match (date_part(a), date_part(b)) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => compare_default(a, b, true),
            },
            Comparator::Time => match (time_part(a), time_part(b)) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => compare_default(a, b, true),
            },
            Comparator::Timestamp => match (a.as_datetime(), b.as_datetime()) {
                (Some((x, _)), Some((y, _))) => x.cmp(&y),
                _ => compare_default(a, b, true),
            },
            Comparator::Boolean => match (as_bool(a), as_bool(b)) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => compare_default(a, b, true),
            },
            Comparator::Role { case_sensitive } => compare_role(a, b, *case_sensitive),
            Comparator::Default { case_sensitive } => compare_default(a, b, *case_sensitive),
        }
    }
}

fn date_part(v: &Value) -> Option<chrono::NaiveDate> {
    match v {
        Value::Date(d) => Some(*d),
        Value::Timestamp(ts) => Some(ts.date()),
        _ => None,
    }
}

fn time_part(v: &Value) -> Option<chrono::NaiveTime> {
    match v {
        Value::Time(t) => Some(*t),
        Value::Timestamp(ts) => Some(ts.time()),
        _ => None,
    }
}

fn as_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Boolean(b) => Some(*b),
        Value::Integer(i) => Some(*i != 0),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

fn compare_role(a: &Value, b: &Value, case_sensitive: bool) -> Ordering {
    match (a, b) {
        (Value::Array(items), other) if !matches!(other, Value::Array(_)) => {
            if items
                .iter()
                .any(|item| compare_default(item, other, case_sensitive) == Ordering::Equal)
            {
                Ordering::Equal
            } else {
                compare_default(a.first(), other, case_sensitive)
            }
        }
        (other, Value::Array(_)) if !matches!(other, Value::Array(_)) => {
            compare_role(b, a, case_sensitive).reverse()
        }
        _ => compare_default(a, b, case_sensitive),
    }
}

fn compare_str(a: &str, b: &str, case_sensitive: bool) -> Ordering {
    if case_sensitive {
        a.cmp(b)
    } else {
        a.chars()
            .flat_map(char::to_lowercase)
            .cmp(b.chars().flat_map(char::to_lowercase))
    }
}

/// Default ordering: numeric when both sides are numbers (or a number and a
/// numeric string), temporal when both sides are temporal, otherwise the
/// string forms.
pub(crate) fn compare_default(a: &Value, b: &Value, case_sensitive: bool) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
        (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => compare_str(x, y, case_sensitive),
        (Value::Time(x), Value::Time(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y.iter()) {
                let ord = compare_default(l, r, case_sensitive);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => {
            if let (Some(x), Some(y)) = (numeric(a), numeric(b)) {
                return x.total_cmp(&y);
            }
            if let (Some((x, _)), Some((y, _))) = (a.as_datetime(), b.as_datetime()) {
                return x.cmp(&y);
            }
            compare_str(&a.to_string(), &b.to_string(), case_sensitive)
        }
    }
}

fn numeric(v: &Value) -> Option<f64> {
    match v {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        other => other.as_f64(),
    }
}
