//! Level algorithms shared by every flat, alternating operand/junction list.

use log::debug;

/// An item of a flat hierarchy list
pub trait HierarchyItem {
    fn level(&self) -> u32;

    fn set_level(&mut self, level: u32);

    fn is_junction(&self) -> bool;

    /// Build the AND junction inserted between two adjacent operands
    fn and_junction(level: u32) -> Self
    where
        Self: Sized;
}

/// Whether `items` alternates operand, junction, operand, ... with an
/// operand at both ends. The empty list is well formed.
pub fn is_well_formed<T: HierarchyItem>(items: &[T]) -> bool {
    if items.is_empty() {
        return true;
    }
    items.len() % 2 == 1
        && items
            .iter()
            .enumerate()
            .all(|(i, item)| item.is_junction() == (i % 2 == 1))
}

/// Repair the alternation: drop leading, trailing and repeated junctions and
/// put an AND between two adjacent operands. Returns the number of repairs.
pub fn repair_structure<T: HierarchyItem>(items: &mut Vec<T>) -> usize {
    let mut repairs = 0;
    let mut repaired: Vec<T> = Vec::with_capacity(items.len());

    for item in items.drain(..) {
        let previous_is_junction = repaired.last().map(|last| last.is_junction());
        match (previous_is_junction, item.is_junction()) {
            // leading junction, or a junction right after another
            (None, true) | (Some(true), true) => repairs += 1,
            (Some(false), false) => {
                let level = repaired.last().map_or(0, |last| last.level()).min(item.level());
                repaired.push(T::and_junction(level));
                repaired.push(item);
                repairs += 1;
            }
            _ => repaired.push(item),
        }
    }

    while repaired.last().is_some_and(|last| last.is_junction()) {
        repaired.pop();
        repairs += 1;
    }

    if repairs > 0 {
        debug!("Repaired {} structural defects in condition list", repairs);
    }
    *items = repaired;
    repairs
}

/// Close gaps in junction levels.
///
/// Walks levels from the highest down to 0; whenever no junction uses level
/// `L`, every junction above `L` moves down by one. Walking top-down keeps a
/// junction from being shifted twice for the same gap.
pub fn renumber_levels<T: HierarchyItem>(items: &mut [T]) {
    let Some(max) = items
        .iter()
        .filter(|item| item.is_junction())
        .map(|item| item.level())
        .max()
    else {
        return;
    };

    for level in (0..=max).rev() {
        let used = items
            .iter()
            .any(|item| item.is_junction() && item.level() == level);
        if used {
            continue;
        }
        for item in items.iter_mut() {
            if item.is_junction() && item.level() > level {
                item.set_level(item.level() - 1);
            }
        }
    }
}

/// Set every operand's level to the highest level of its adjacent junctions,
/// 0 when it has none
pub fn assign_operand_levels<T: HierarchyItem>(items: &mut [T]) {
    for i in 0..items.len() {
        if items[i].is_junction() {
            continue;
        }
        let before = i
            .checked_sub(1)
            .and_then(|j| items.get(j))
            .filter(|item| item.is_junction())
            .map_or(0, |item| item.level());
        let after = items
            .get(i + 1)
            .filter(|item| item.is_junction())
            .map_or(0, |item| item.level());
        items[i].set_level(before.max(after));
    }
}

/// Remove the item at `index` together with its partner so the list stays
/// alternating.
///
/// An operand takes the following junction with it, or the preceding one
/// when it is last. A junction takes the following operand. Returns the
/// removed items in list order.
pub fn remove_with_partner<T: HierarchyItem>(items: &mut Vec<T>, index: usize) -> Vec<T> {
    let len = items.len();
    if index >= len {
        return Vec::new();
    }

    let range = if items[index].is_junction() {
        index..(index + 2).min(len)
    } else if index + 1 < len {
        index..index + 2
    } else if index > 0 {
        index - 1..index + 1
    } else {
        index..index + 1
    };
    items.drain(range).collect()
}
