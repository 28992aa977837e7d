use crate::condition::ConditionError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declared logical types a condition or column can carry.
///
/// The serialized names match the tags stored in persisted condition files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogicalType {
    String,
    Char,
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    Decimal,
    Date,
    Time,
    /// Date and time of day.
    TimeInstant,
    /// Security role names; array cells are matched element-wise.
    Role,
}

impl LogicalType {
    /// Get the persisted tag for this type
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalType::String => "string",
            LogicalType::Char => "char",
            LogicalType::Boolean => "boolean",
            LogicalType::Byte => "byte",
            LogicalType::Short => "short",
            LogicalType::Integer => "integer",
            LogicalType::Long => "long",
            LogicalType::Float => "float",
            LogicalType::Double => "double",
            LogicalType::Decimal => "decimal",
            LogicalType::Date => "date",
            LogicalType::Time => "time",
            LogicalType::TimeInstant => "timeInstant",
            LogicalType::Role => "role",
        }
    }

    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            LogicalType::Byte | LogicalType::Short | LogicalType::Integer | LogicalType::Long
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integral()
            || matches!(
                self,
                LogicalType::Float | LogicalType::Double | LogicalType::Decimal
            )
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            LogicalType::Date | LogicalType::Time | LogicalType::TimeInstant
        )
    }
}

impl FromStr for LogicalType {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s {
            "string" => LogicalType::String,
            "char" | "character" => LogicalType::Char,
            "boolean" => LogicalType::Boolean,
            "byte" => LogicalType::Byte,
            "short" => LogicalType::Short,
            "integer" => LogicalType::Integer,
            "long" => LogicalType::Long,
            "float" => LogicalType::Float,
            "double" => LogicalType::Double,
            "decimal" => LogicalType::Decimal,
            "date" => LogicalType::Date,
            "time" => LogicalType::Time,
            "timeInstant" => LogicalType::TimeInstant,
            "role" => LogicalType::Role,
            other => {
                return Err(ConditionError::UnknownType {
                    name: other.to_string(),
                })
            }
        };
        Ok(ty)
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime kind of a non-null value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Boolean,
    Integer,
    Double,
    String,
    Date,
    Time,
    Timestamp,
    Array,
    Merged,
}

/// Values that can appear in a row cell or a condition operand.
///
/// Serialized untagged so that plain JSON scalars and arrays read back
/// directly; temporal values come back as strings and are coerced by the
/// consumer's declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Array(Vec<Value>),
    /// A cell holding several sub-column values behind one position.
    #[serde(skip)]
    Merged(Vec<Value>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Get the runtime kind of this value, `None` for NULL
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(ValueKind::Boolean),
            Value::Integer(_) => Some(ValueKind::Integer),
            Value::Double(_) => Some(ValueKind::Double),
            Value::String(_) => Some(ValueKind::String),
            Value::Date(_) => Some(ValueKind::Date),
            Value::Time(_) => Some(ValueKind::Time),
            Value::Timestamp(_) => Some(ValueKind::Timestamp),
            Value::Array(_) => Some(ValueKind::Array),
            Value::Merged(_) => Some(ValueKind::Merged),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, Value::Date(_) | Value::Time(_) | Value::Timestamp(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Double(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Get this value as a point in time, with whether it carried a time of day.
    ///
    /// Dates are placed at midnight; times alone have no date and yield `None`.
    pub fn as_datetime(&self) -> Option<(NaiveDateTime, bool)> {
        match self {
            Value::Date(d) => Some((d.and_time(NaiveTime::MIN), false)),
            Value::Timestamp(ts) => Some((*ts, true)),
            _ => None,
        }
    }

    /// Get the first element of an array, or the value itself for scalars
    pub fn first(&self) -> &Value {
        match self {
            Value::Array(items) => items.first().unwrap_or(&Value::Null),
            other => other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Double(d) => write!(f, "{}", d),
            Value::String(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format(super::coerce::DATE_FORMAT)),
            Value::Time(t) => write!(f, "{}", t.format(super::coerce::TIME_FORMAT)),
            Value::Timestamp(ts) => write!(f, "{}", ts.format(super::coerce::TIMESTAMP_FORMAT)),
            Value::Array(items) | Value::Merged(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(ts: NaiveDateTime) -> Self {
        Value::Timestamp(ts)
    }
}
