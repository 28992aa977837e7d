//! Row-level evaluation of flat condition lists.
//!
//! A [`ConditionGroup`] is a condition list compiled against a concrete row
//! layout: symbolic column references become indices and junction items
//! become operators. Two evaluators are provided:
//!
//! - [`ConditionTree`]: an explicit AND/OR tree built once from the levels
//!   and reused for every row (the default)
//! - [`evaluate_flat`]: a stack machine that walks the flat items directly
//!
//! Both short-circuit and both evaluate an empty group to `true`.

pub mod condition_group;
pub mod item;
pub mod leaf;
pub mod stack;
pub mod tree;

pub use condition_group::ConditionGroup;
pub use item::GroupItem;
pub use leaf::{BooleanLeaf, EvalContext, RowPredicate};
pub use stack::evaluate_flat;
pub use tree::ConditionTree;
