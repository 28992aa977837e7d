//! Runtime items of a condition group.

use crate::list::{HierarchyItem, Junction};

/// A leaf predicate or a junction operator, each with its nesting level
#[derive(Debug, Clone, PartialEq)]
pub enum GroupItem<T> {
    Leaf { leaf: T, level: u32 },
    Operator { junction: Junction, level: u32 },
}

impl<T> GroupItem<T> {
    pub fn leaf(leaf: T, level: u32) -> Self {
        GroupItem::Leaf { leaf, level }
    }

    pub fn operator(junction: Junction, level: u32) -> Self {
        GroupItem::Operator { junction, level }
    }

    /// Replace the leaf payload, keeping the level
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> GroupItem<U> {
        match self {
            GroupItem::Leaf { leaf, level } => GroupItem::Leaf {
                leaf: f(leaf),
                level,
            },
            GroupItem::Operator { junction, level } => GroupItem::Operator { junction, level },
        }
    }

    pub fn as_ref(&self) -> GroupItem<&T> {
        match self {
            GroupItem::Leaf { leaf, level } => GroupItem::Leaf {
                leaf,
                level: *level,
            },
            GroupItem::Operator { junction, level } => GroupItem::Operator {
                junction: *junction,
                level: *level,
            },
        }
    }
}

impl<T> HierarchyItem for GroupItem<T> {
    fn level(&self) -> u32 {
        match self {
            GroupItem::Leaf { level, .. } | GroupItem::Operator { level, .. } => *level,
        }
    }

    fn set_level(&mut self, new_level: u32) {
        match self {
            GroupItem::Leaf { level, .. } | GroupItem::Operator { level, .. } => *level = new_level,
        }
    }

    fn is_junction(&self) -> bool {
        matches!(self, GroupItem::Operator { .. })
    }

    fn and_junction(level: u32) -> Self {
        GroupItem::Operator {
            junction: Junction::And,
            level,
        }
    }
}
