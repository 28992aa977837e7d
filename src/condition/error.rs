//! Error types for condition decoding and list editing.

use thiserror::Error;

/// Errors raised by decoding persisted codes and by positional list edits.
///
/// Evaluation itself never fails; see the module docs of `value::coerce`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConditionError {
    #[error("Unknown operator code: {code}")]
    UnknownOperatorCode { code: i32 },

    #[error("Unknown junction code: {code}")]
    UnknownJunctionCode { code: i32 },

    #[error("Unknown logical type: {name}")]
    UnknownType { name: String },

    #[error("Index {index} out of bounds for list with {len} items")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Item at index {index} is not a junction")]
    NotAJunction { index: usize },
}

/// Result type for condition operations
pub type ConditionResult<T> = Result<T, ConditionError>;
