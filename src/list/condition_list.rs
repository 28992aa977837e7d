//! Editable list of conditions and junctions.

use crate::condition::{Condition, ConditionError, ConditionResult, VariableResolver};
use crate::group::{ConditionTree, GroupItem};
use crate::list::hierarchy::{self, HierarchyItem};
use crate::list::{ColumnRef, ConditionItem, Junction, ListItem};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Flat condition list; see the [module docs](crate::list) for the encoding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionList {
    items: Vec<ListItem>,
}

impl ConditionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<ListItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<ListItem> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ListItem> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ListItem> {
        self.items.get_mut(index)
    }

    pub fn conditions(&self) -> impl Iterator<Item = &ConditionItem> {
        self.items.iter().filter_map(ListItem::as_condition)
    }

    pub fn conditions_mut(&mut self) -> impl Iterator<Item = &mut ConditionItem> {
        self.items.iter_mut().filter_map(|item| match item {
            ListItem::Condition(item) => Some(item),
            ListItem::Junction(_) => None,
        })
    }

    pub fn condition_count(&self) -> usize {
        self.conditions().count()
    }

    pub fn push(&mut self, item: ListItem) {
        self.items.push(item);
    }

    pub fn push_condition(
        &mut self,
        column: impl Into<ColumnRef>,
        condition: Condition,
        level: u32,
    ) -> &mut Self {
        self.items.push(ListItem::condition(column, condition, level));
        self
    }

    pub fn push_junction(&mut self, junction: Junction, level: u32) -> &mut Self {
        self.items.push(ListItem::junction(junction, level));
        self
    }

    /// Insert `item` at `index`; call [`validate`](Self::validate) after a
    /// series of edits
    pub fn insert(&mut self, index: usize, item: ListItem) -> ConditionResult<()> {
        if index > self.items.len() {
            return Err(ConditionError::IndexOutOfBounds {
                index,
                len: self.items.len(),
            });
        }
        self.items.insert(index, item);
        Ok(())
    }

    /// Remove the item at `index` and its partner.
    ///
    /// A condition takes its following junction, or the preceding one when
    /// it is last. A junction takes the following condition.
    pub fn remove(&mut self, index: usize) -> ConditionResult<Vec<ListItem>> {
        if index >= self.items.len() {
            return Err(ConditionError::IndexOutOfBounds {
                index,
                len: self.items.len(),
            });
        }
        Ok(hierarchy::remove_with_partner(&mut self.items, index))
    }

    /// Move the junction at `index` `delta` levels deeper (or shallower for a
    /// negative delta, stopping at 0)
    pub fn indent(&mut self, index: usize, delta: i32) -> ConditionResult<()> {
        let len = self.items.len();
        match self.items.get_mut(index) {
            None => return Err(ConditionError::IndexOutOfBounds { index, len }),
            Some(ListItem::Condition(_)) => return Err(ConditionError::NotAJunction { index }),
            Some(ListItem::Junction(item)) => {
                item.level = item.level.saturating_add_signed(delta);
            }
        }
        hierarchy::assign_operand_levels(&mut self.items);
        Ok(())
    }

    pub fn is_well_formed(&self) -> bool {
        hierarchy::is_well_formed(&self.items)
    }

    /// Normalize the list for evaluation, keeping ignored conditions
    pub fn validate(&mut self) {
        self.validate_with(false);
    }

    /// Normalize the list for evaluation.
    ///
    /// Repairs the alternation, optionally drops ignored conditions, closes
    /// gaps in junction levels and recomputes condition levels.
    pub fn validate_with(&mut self, drop_ignored: bool) {
        hierarchy::repair_structure(&mut self.items);
        if drop_ignored {
            self.drop_ignored();
        }
        hierarchy::renumber_levels(&mut self.items);
        hierarchy::assign_operand_levels(&mut self.items);
    }

    /// Remove ignored conditions, each with the adjacent junction it binds to
    /// most tightly (the following one on a tie)
    fn drop_ignored(&mut self) {
        while let Some(index) = self
            .items
            .iter()
            .position(|item| matches!(item, ListItem::Condition(c) if c.condition.is_ignored()))
        {
            let rank = |i: Option<usize>| {
                i.and_then(|i| self.items.get(i))
                    .and_then(ListItem::as_junction)
                    .map(|j| j.level * 2 + u32::from(j.junction == Junction::And))
            };
            let before = rank(index.checked_sub(1));
            let after = rank(Some(index + 1));

            debug!("Dropping ignored condition at {}", index);
            match (before, after) {
                (Some(b), Some(a)) if b > a => {
                    self.items.drain(index - 1..=index);
                }
                _ => {
                    hierarchy::remove_with_partner(&mut self.items, index);
                }
            }
        }
    }

    /// Flip every condition's negation flag and swap every AND with OR.
    ///
    /// This is De Morgan's law as long as no level mixes AND and OR. On a
    /// mixed level the swap also swaps which junction binds tighter; call
    /// [`make_levels_explicit`](Self::make_levels_explicit) first to keep
    /// the grouping. Negating twice restores the list exactly.
    pub fn negate(&mut self) {
        for item in &mut self.items {
            match item {
                ListItem::Condition(item) => {
                    let negated = item.condition.is_negated();
                    item.condition.set_negated(!negated);
                }
                ListItem::Junction(item) => item.junction = item.junction.flip(),
            }
        }
    }

    /// Whether some level holds both AND and OR junctions
    pub fn mixes_junctions(&self) -> bool {
        let mut seen: HashSet<(u32, Junction)> = HashSet::new();
        for item in self.items.iter().filter_map(ListItem::as_junction) {
            if seen.contains(&(item.level, item.junction.flip())) {
                return true;
            }
            seen.insert((item.level, item.junction));
        }
        false
    }

    /// Rewrite the levels so that each level holds one kind of junction,
    /// keeping the grouping the levels encode now
    pub fn make_levels_explicit(&mut self) {
        let positions = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| to_group_item(item).map(|_| i));
        let Some(tree) = ConditionTree::from_items(positions) else {
            return;
        };

        let mut old: Vec<Option<ListItem>> =
            std::mem::take(&mut self.items).into_iter().map(Some).collect();
        self.items = tree
            .into_items()
            .into_iter()
            .filter_map(|item| match item {
                GroupItem::Leaf { leaf, level } => old[leaf].take().map(|mut item| {
                    item.set_level(level);
                    item
                }),
                GroupItem::Operator { junction, level } => Some(ListItem::junction(junction, level)),
            })
            .collect();
    }

    /// Join `lists` with `junction`, each list nested one level deeper
    pub fn merge<I>(lists: I, junction: Junction) -> Self
    where
        I: IntoIterator<Item = ConditionList>,
    {
        let mut merged = ConditionList::new();
        for mut list in lists {
            list.validate();
            if list.is_empty() {
                continue;
            }
            if !merged.is_empty() {
                merged.push_junction(junction, 0);
            }
            for mut item in list.items {
                item.set_level(item.level() + 1);
                merged.items.push(item);
            }
        }
        merged.validate();
        merged
    }

    /// Substitute variables in every condition; see
    /// [`Condition::replace_variables`]. Returns whether any were found.
    pub fn replace_variables(&mut self, vars: &dyn VariableResolver) -> bool {
        let mut found = false;
        for item in self.conditions_mut() {
            found |= item.condition.replace_variables(vars);
        }
        found
    }

    /// Build the explicit tree over this list's conditions
    pub fn to_tree(&self) -> Option<ConditionTree<&ConditionItem>> {
        ConditionTree::from_items(self.items.iter().map(to_group_item))
    }
}

fn to_group_item(item: &ListItem) -> GroupItem<&ConditionItem> {
    match item {
        ListItem::Condition(item) => GroupItem::leaf(item, item.level),
        ListItem::Junction(item) => GroupItem::operator(item.junction, item.level),
    }
}

impl fmt::Display for ConditionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_tree() {
            Some(tree) => write!(f, "{}", tree),
            None => Ok(()),
        }
    }
}

impl FromIterator<ListItem> for ConditionList {
    fn from_iter<I: IntoIterator<Item = ListItem>>(iter: I) -> Self {
        Self::from_items(iter.into_iter().collect())
    }
}
