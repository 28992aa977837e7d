//! Flat, level-annotated encoding of nested AND/OR expressions.
//!
//! A list alternates predicate items and junction items. There are no parent
//! pointers: nesting is carried by each item's `level`, where a higher level
//! binds tighter, like a deeper pair of parentheses. `A OR (B AND C)` is
//!
//! ```text
//! A(0) OR(0) B(1) AND(1) C(1)
//! ```
//!
//! The generic level algorithms live in [`hierarchy`] and work on any item
//! type implementing [`HierarchyItem`]; [`ConditionList`] applies them to
//! condition items and adds the editing operations.

pub mod condition_list;
pub mod hierarchy;
pub mod item;

pub use condition_list::ConditionList;
pub use hierarchy::HierarchyItem;
pub use item::{ColumnRef, ConditionItem, Junction, JunctionItem, ListItem};
