//! Condition group: a compiled condition list evaluated per row.

use crate::condition::Condition;
use crate::group::{evaluate_flat, BooleanLeaf, ConditionTree, EvalContext, GroupItem, RowPredicate};
use crate::list::{ConditionList, Junction, ListItem};
use crate::value::Value;
use chrono::{Local, NaiveDateTime};
use log::debug;
use std::sync::OnceLock;

/// Flat group of leaves and operators with a lazily built tree over them
#[derive(Debug, Clone)]
pub struct ConditionGroup<P = BooleanLeaf> {
    items: Vec<GroupItem<P>>,
    not_found_result: bool,
    /// Tree over leaf positions in `items`
    tree: OnceLock<Option<ConditionTree<usize>>>,
}

impl<P> Default for ConditionGroup<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> ConditionGroup<P> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            not_found_result: true,
            tree: OnceLock::new(),
        }
    }

    pub fn add_predicate(&mut self, leaf: P, level: u32) {
        self.items.push(GroupItem::leaf(leaf, level));
        self.tree = OnceLock::new();
    }

    pub fn add_operator(&mut self, junction: Junction, level: u32) {
        self.items.push(GroupItem::operator(junction, level));
        self.tree = OnceLock::new();
    }

    /// Result for leaves whose column is missing from the row (default `true`)
    pub fn set_not_found_result(&mut self, result: bool) {
        self.not_found_result = result;
    }

    pub fn not_found_result(&self) -> bool {
        self.not_found_result
    }

    pub fn items(&self) -> &[GroupItem<P>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn tree(&self) -> Option<&ConditionTree<usize>> {
        self.tree
            .get_or_init(|| {
                let positions = self
                    .items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| item.as_ref().map(|_| i));
                ConditionTree::from_items(positions)
            })
            .as_ref()
    }

    fn leaf(&self, index: usize) -> Option<&P> {
        match self.items.get(index) {
            Some(GroupItem::Leaf { leaf, .. }) => Some(leaf),
            _ => None,
        }
    }

    fn context(&self, now: NaiveDateTime) -> EvalContext {
        EvalContext {
            not_found_result: self.not_found_result,
            now,
        }
    }
}

impl<P: RowPredicate> ConditionGroup<P> {
    /// Evaluate `row` against the local clock
    pub fn evaluate(&self, row: &[Value]) -> bool {
        self.evaluate_at(row, Local::now().naive_local())
    }

    /// Evaluate `row` through the compiled tree. An empty group passes.
    pub fn evaluate_at(&self, row: &[Value], now: NaiveDateTime) -> bool {
        let ctx = self.context(now);
        match self.tree() {
            Some(tree) => tree.evaluate(&mut |&index| {
                self.leaf(index)
                    .map_or(ctx.not_found_result, |leaf| leaf.matches(row, &ctx))
            }),
            None => true,
        }
    }

    /// Evaluate `row` with the stack machine over the flat items
    pub fn evaluate_stack(&self, row: &[Value]) -> bool {
        self.evaluate_stack_at(row, Local::now().naive_local())
    }

    pub fn evaluate_stack_at(&self, row: &[Value], now: NaiveDateTime) -> bool {
        let ctx = self.context(now);
        evaluate_flat(&self.items, |leaf| leaf.matches(row, &ctx))
    }
}

impl ConditionGroup<BooleanLeaf> {
    /// Compile `list` against a row layout given by column names.
    ///
    /// Columns are matched exactly first, then ignoring ASCII case. An
    /// unmatched column leaves its leaf unresolved, so it evaluates to the
    /// not-found result.
    pub fn compile<S: AsRef<str>>(list: &ConditionList, columns: &[S]) -> Self {
        let mut group = Self::new();
        for item in list.items() {
            match item {
                ListItem::Condition(item) => {
                    let col_index = resolve_column(columns, &item.column.name);
                    if col_index.is_none() {
                        debug!("Column '{}' not found in row layout", item.column.name);
                    }
                    let leaf = BooleanLeaf {
                        col_index,
                        sub_column: item.column.sub_column,
                        condition: item.condition.clone(),
                    };
                    group.add_predicate(leaf, item.level);
                }
                ListItem::Junction(item) => group.add_operator(item.junction, item.level),
            }
        }
        group
    }

    pub fn add_condition(&mut self, col_index: usize, condition: Condition, level: u32) {
        self.add_predicate(BooleanLeaf::new(col_index, condition), level);
    }
}

fn resolve_column<S: AsRef<str>>(columns: &[S], name: &str) -> Option<usize> {
    columns
        .iter()
        .position(|c| c.as_ref() == name)
        .or_else(|| columns.iter().position(|c| c.as_ref().eq_ignore_ascii_case(name)))
}
