//! Single-predicate conditions.
//!
//! This module provides:
//! - The closed operator set and its persisted integer codes
//! - `Condition`: operator, operands and flags, evaluated against one value
//! - Variable placeholders (`$(name)`) and their resolution
//! - Error types for decoding persisted conditions and editing lists

pub mod compiled;
pub mod error;
pub mod operator;
pub mod predicate;
pub mod variable;

pub use error::{ConditionError, ConditionResult};
pub use operator::{decode_operation, encode_operation, Operator, CORRELATED};
pub use predicate::Condition;
pub use variable::{variable_name, VariableResolver};
