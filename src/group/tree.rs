//! Explicit AND/OR tree compiled from level-annotated items.
//!
//! Junctions are ranked by `2 * level + (1 for AND)`, so a deeper level
//! always binds tighter and AND binds tighter than OR on the same level.
//! Equal ranks associate to the left.

use crate::group::GroupItem;
use crate::list::{hierarchy, Junction};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ConditionTree<T> {
    Leaf(T),
    And(Box<ConditionTree<T>>, Box<ConditionTree<T>>),
    Or(Box<ConditionTree<T>>, Box<ConditionTree<T>>),
}

fn precedence(junction: Junction, level: u32) -> u32 {
    level * 2
        + match junction {
            Junction::And => 1,
            Junction::Or => 0,
        }
}

impl<T> ConditionTree<T> {
    pub fn join(junction: Junction, left: Self, right: Self) -> Self {
        match junction {
            Junction::And => ConditionTree::And(Box::new(left), Box::new(right)),
            Junction::Or => ConditionTree::Or(Box::new(left), Box::new(right)),
        }
    }

    /// Build the tree for a flat item sequence, `None` when it has no leaves.
    ///
    /// Structural defects are repaired the same way list validation repairs
    /// them, so any sequence yields a tree.
    pub fn from_items<I>(items: I) -> Option<Self>
    where
        I: IntoIterator<Item = GroupItem<T>>,
    {
        let mut items: Vec<GroupItem<T>> = items.into_iter().collect();
        hierarchy::repair_structure(&mut items);

        let mut output: Vec<ConditionTree<T>> = Vec::new();
        let mut operators: Vec<(Junction, u32)> = Vec::new();

        for item in items {
            match item {
                GroupItem::Leaf { leaf, .. } => output.push(ConditionTree::Leaf(leaf)),
                GroupItem::Operator { junction, level } => {
                    let rank = precedence(junction, level);
                    while operators.last().is_some_and(|&(_, top)| top >= rank) {
                        Self::reduce(&mut output, &mut operators);
                    }
                    operators.push((junction, rank));
                }
            }
        }
        while !operators.is_empty() {
            Self::reduce(&mut output, &mut operators);
        }
        output.pop()
    }

    fn reduce(output: &mut Vec<ConditionTree<T>>, operators: &mut Vec<(Junction, u32)>) {
        let Some((junction, _)) = operators.pop() else {
            return;
        };
        match (output.pop(), output.pop()) {
            (Some(right), Some(left)) => output.push(Self::join(junction, left, right)),
            (Some(only), None) => output.push(only),
            _ => {}
        }
    }

    /// Get the junction of the root node, `None` for a leaf
    pub fn junction(&self) -> Option<Junction> {
        match self {
            ConditionTree::Leaf(_) => None,
            ConditionTree::And(..) => Some(Junction::And),
            ConditionTree::Or(..) => Some(Junction::Or),
        }
    }

    /// Evaluate with `eval` deciding each leaf. The right operand of a
    /// junction is skipped when the left one already decides it.
    pub fn evaluate<F>(&self, eval: &mut F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        match self {
            ConditionTree::Leaf(leaf) => eval(leaf),
            ConditionTree::And(left, right) => left.evaluate(eval) && right.evaluate(eval),
            ConditionTree::Or(left, right) => left.evaluate(eval) || right.evaluate(eval),
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            ConditionTree::Leaf(_) => 1,
            ConditionTree::And(left, right) | ConditionTree::Or(left, right) => {
                left.leaf_count() + right.leaf_count()
            }
        }
    }

    /// Flatten back into items whose levels encode the tree exactly.
    ///
    /// A child with a different junction than its parent goes one level
    /// deeper, so no level ever relies on AND binding tighter than OR.
    pub fn into_items(self) -> Vec<GroupItem<T>> {
        let mut items = Vec::new();
        self.flatten(0, &mut items);
        hierarchy::assign_operand_levels(&mut items);
        items
    }

    fn flatten(self, level: u32, out: &mut Vec<GroupItem<T>>) {
        let (junction, left, right) = match self {
            ConditionTree::Leaf(leaf) => {
                out.push(GroupItem::leaf(leaf, level));
                return;
            }
            ConditionTree::And(left, right) => (Junction::And, left, right),
            ConditionTree::Or(left, right) => (Junction::Or, left, right),
        };

        for (i, child) in [*left, *right].into_iter().enumerate() {
            if i == 1 {
                out.push(GroupItem::operator(junction, level));
            }
            let child_level = match child.junction() {
                Some(inner) if inner != junction => level + 1,
                _ => level,
            };
            child.flatten(child_level, out);
        }
    }
}

impl<T: fmt::Display> fmt::Display for ConditionTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (junction, left, right) = match self {
            ConditionTree::Leaf(leaf) => return write!(f, "{}", leaf),
            ConditionTree::And(left, right) => (Junction::And, left, right),
            ConditionTree::Or(left, right) => (Junction::Or, left, right),
        };

        for (i, child) in [left, right].into_iter().enumerate() {
            if i == 1 {
                write!(f, " {} ", junction)?;
            }
            match child.junction() {
                Some(inner) if inner != junction => write!(f, "({})", child)?,
                _ => write!(f, "{}", child)?,
            }
        }
        Ok(())
    }
}
