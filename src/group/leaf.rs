//! Leaf predicates of a condition group.

use crate::condition::Condition;
use crate::value::Value;
use chrono::NaiveDateTime;

/// Per-row evaluation settings shared by every leaf
#[derive(Debug, Clone, Copy)]
pub struct EvalContext {
    /// Result for a leaf whose column is not present in the row
    pub not_found_result: bool,
    /// Reference instant for relative date ranges
    pub now: NaiveDateTime,
}

/// A predicate deciding one row
pub trait RowPredicate {
    fn matches(&self, row: &[Value], ctx: &EvalContext) -> bool;
}

impl<F> RowPredicate for F
where
    F: Fn(&[Value]) -> bool,
{
    fn matches(&self, row: &[Value], _ctx: &EvalContext) -> bool {
        self(row)
    }
}

/// A condition bound to a column position
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanLeaf {
    /// `None` when the column could not be resolved
    pub col_index: Option<usize>,
    /// Part of a merged cell to test; the first part when unset
    pub sub_column: Option<usize>,
    pub condition: Condition,
}

impl BooleanLeaf {
    pub fn new(col_index: usize, condition: Condition) -> Self {
        Self {
            col_index: Some(col_index),
            sub_column: None,
            condition,
        }
    }

    pub fn with_sub_column(mut self, sub_column: Option<usize>) -> Self {
        self.sub_column = sub_column;
        self
    }

    /// Pick the cell this leaf tests, `None` when the column is missing.
    ///
    /// A single-value row always supplies its only cell.
    pub fn cell<'a>(&self, row: &'a [Value]) -> Option<&'a Value> {
        let cell = if row.len() == 1 {
            &row[0]
        } else {
            row.get(self.col_index?)?
        };

        match cell {
            Value::Merged(parts) => Some(
                parts
                    .get(self.sub_column.unwrap_or(0))
                    .unwrap_or(&Value::Null),
            ),
            other => Some(other),
        }
    }
}

impl RowPredicate for BooleanLeaf {
    fn matches(&self, row: &[Value], ctx: &EvalContext) -> bool {
        match self.cell(row) {
            Some(value) => self.condition.evaluate_at(value, ctx.now),
            None => ctx.not_found_result,
        }
    }
}
