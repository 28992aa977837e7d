//! Operator definitions for conditions.
//!
//! The integer codes are persisted in condition files and must not change.

use crate::condition::{ConditionError, ConditionResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Flag bit marking a correlated condition; combined with an operator code
pub const CORRELATED: i32 = 1024;

/// Operators supported by a condition
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    EqualTo = 1,
    OneOf = 2,
    LessThan = 3,
    GreaterThan = 4,
    Between = 5,
    StartingWith = 6,
    Contains = 7,
    Null = 8,
    /// Ranking condition, applied over the whole result rather than per row
    TopN = 9,
    /// Ranking condition, applied over the whole result rather than per row
    BottomN = 10,
    DateIn = 11,
    /// Used only by query analysis; never evaluated
    Pseudo = 12,
    Like = 13,
}

impl Operator {
    /// Get the persisted code of this operator
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Decode a persisted operator code (without the correlated bit)
    pub fn from_code(code: i32) -> ConditionResult<Self> {
        let op = match code {
            1 => Operator::EqualTo,
            2 => Operator::OneOf,
            3 => Operator::LessThan,
            4 => Operator::GreaterThan,
            5 => Operator::Between,
            6 => Operator::StartingWith,
            7 => Operator::Contains,
            8 => Operator::Null,
            9 => Operator::TopN,
            10 => Operator::BottomN,
            11 => Operator::DateIn,
            12 => Operator::Pseudo,
            13 => Operator::Like,
            _ => return Err(ConditionError::UnknownOperatorCode { code }),
        };
        Ok(op)
    }

    /// Pattern operators always compare strings and skip type coercion
    pub fn is_pattern(&self) -> bool {
        matches!(
            self,
            Operator::StartingWith | Operator::Contains | Operator::Like
        )
    }

    /// Whether this operator can be decided from a single row
    pub fn is_row_local(&self) -> bool {
        !matches!(self, Operator::TopN | Operator::BottomN | Operator::Pseudo)
    }

    /// Number of operands the operator reads, `None` for any number
    pub fn operand_count(&self) -> Option<usize> {
        match self {
            Operator::Null | Operator::Pseudo => Some(0),
            Operator::Between => Some(2),
            Operator::OneOf => None,
            _ => Some(1),
        }
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::EqualTo => "equal to",
            Operator::OneOf => "one of",
            Operator::LessThan => "less than",
            Operator::GreaterThan => "greater than",
            Operator::Between => "between",
            Operator::StartingWith => "starting with",
            Operator::Contains => "contains",
            Operator::Null => "null",
            Operator::TopN => "top",
            Operator::BottomN => "bottom",
            Operator::DateIn => "in range",
            Operator::Pseudo => "pseudo",
            Operator::Like => "like",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Combine an operator with the correlated flag into a persisted code
pub fn encode_operation(op: Operator, correlated: bool) -> i32 {
    if correlated {
        op.code() | CORRELATED
    } else {
        op.code()
    }
}

/// Split a persisted code into its operator and correlated flag
pub fn decode_operation(code: i32) -> ConditionResult<(Operator, bool)> {
    let correlated = code & CORRELATED != 0;
    let op = Operator::from_code(code & !CORRELATED)
        .map_err(|_| ConditionError::UnknownOperatorCode { code })?;
    Ok((op, correlated))
}
