//! Typed values flowing through condition evaluation.
//!
//! This module provides:
//!
//! - **Value**: closed set of runtime cell values (scalars, temporals, arrays,
//!   merged cells)
//! - **LogicalType**: the declared type of a condition or column
//! - **coerce**: string-to-type conversion with format fallback chains
//! - **compare**: per-type comparators used by every comparison operator
//!
//! Coercion never fails. A malformed literal degrades to a documented default
//! and a logged warning, so a bad operand can only ever produce a wrong
//! boolean, not an aborted row.

pub mod coerce;
pub mod compare;
pub mod types;

pub use coerce::{coerce_str, coerce_value, normalize_for, parse_temporal};
pub use compare::Comparator;
pub use types::{LogicalType, Value, ValueKind};
