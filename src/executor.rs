//! Executor layer for row filtering.
//!
//! Rows flow through Volcano-style iterators: each source produces one row at
//! a time via `next()`, and a [`FilterExecutor`] pulls rows from its child
//! and yields only those accepted by a condition group.

use crate::value::{LogicalType, Value};
use anyhow::Result;
use serde::{Deserialize, Serialize};

pub mod filter;
pub mod json_source;
pub mod source;

pub use filter::{FilterExecutor, FilterStats};
pub use json_source::{row_to_json, JsonSource};
pub use source::VecSource;

/// A row of cell values, in column order
pub type Row = Vec<Value>;

/// Trait for all row producers
pub trait RowSource: Send {
    /// Initialize the source. This must be called before `next()`.
    fn init(&mut self) -> Result<()>;

    /// Get the next row from the source.
    /// Returns None when there are no more rows.
    fn next(&mut self) -> Result<Option<Row>>;

    /// Get the output schema of this source
    fn output_schema(&self) -> &[ColumnInfo];
}

/// Information about a column in the output schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type", default = "default_type")]
    pub logical_type: LogicalType,
}

fn default_type() -> LogicalType {
    LogicalType::String
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            logical_type,
        }
    }
}
