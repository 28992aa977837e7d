//! Stack-machine evaluation of flat, level-annotated items.
//!
//! Items are consumed from a queue. An item nested deeper than the stack top
//! is pushed and waits. An operand meeting an AND on its own level is
//! reduced at once, while an OR on the same level is deferred. An item on a
//! shallower level first forces the reduction of the deeper run on the
//! stack. Every reduction result goes back to the front of the queue so it
//! is compared again against the stack. When the queue is empty the
//! remaining stack is folded from the top.
//!
//! Leaves are evaluated lazily, only when a reduction needs them, so the
//! right operand of `false AND x` or `true OR x` is never evaluated.

use crate::group::GroupItem;
use crate::list::Junction;
use std::collections::VecDeque;

enum Entry<'a, T> {
    Pending(&'a T, u32),
    Resolved(bool, u32),
    Op(Junction, u32),
}

impl<T> Entry<'_, T> {
    fn level(&self) -> u32 {
        match self {
            Entry::Pending(_, level) | Entry::Resolved(_, level) | Entry::Op(_, level) => *level,
        }
    }

    fn is_operand(&self) -> bool {
        !matches!(self, Entry::Op(..))
    }

    fn op_level(entry: Option<&Self>) -> u32 {
        match entry {
            Some(Entry::Op(_, level)) => *level,
            _ => 0,
        }
    }
}

fn resolve<T, F>(entry: Entry<'_, T>, eval: &mut F) -> bool
where
    F: FnMut(&T) -> bool,
{
    match entry {
        Entry::Pending(leaf, _) => eval(leaf),
        Entry::Resolved(value, _) => value,
        // an operator is never resolved as an operand
        Entry::Op(..) => true,
    }
}

fn combine<T, F>(left: Entry<'_, T>, junction: Junction, right: Entry<'_, T>, eval: &mut F) -> bool
where
    F: FnMut(&T) -> bool,
{
    let left = resolve(left, eval);
    junction.apply(left, || resolve(right, eval))
}

/// Pop `operand, operator` off the stack when it ends in that shape
fn pop_left<'a, T>(stack: &mut Vec<Entry<'a, T>>) -> Option<(Entry<'a, T>, Junction)> {
    let n = stack.len();
    if n < 2 || stack[n - 1].is_operand() || !stack[n - 2].is_operand() {
        return None;
    }
    let Some(Entry::Op(junction, _)) = stack.pop() else {
        return None;
    };
    stack.pop().map(|left| (left, junction))
}

/// Evaluate flat group items with `eval` deciding each leaf.
///
/// An empty sequence evaluates to `true`.
pub fn evaluate_flat<T, F>(items: &[GroupItem<T>], mut eval: F) -> bool
where
    F: FnMut(&T) -> bool,
{
    let mut queue: VecDeque<Entry<'_, T>> = items
        .iter()
        .map(|item| match item {
            GroupItem::Leaf { leaf, level } => Entry::Pending(leaf, *level),
            GroupItem::Operator { junction, level } => Entry::Op(*junction, *level),
        })
        .collect();
    let mut stack: Vec<Entry<'_, T>> = Vec::with_capacity(items.len());

    while let Some(head) = queue.pop_front() {
        let Some(top) = stack.last() else {
            stack.push(head);
            continue;
        };

        if head.level() > top.level() {
            stack.push(head);
        } else if head.level() == top.level() {
            let reduce_now = head.is_operand()
                && matches!(top, Entry::Op(Junction::And, _))
                && stack.len() >= 2;
            if !reduce_now {
                stack.push(head);
                continue;
            }
            match pop_left(&mut stack) {
                Some((left, junction)) => {
                    let level = Entry::op_level(stack.last()).max(Entry::op_level(queue.front()));
                    let value = combine(left, junction, head, &mut eval);
                    queue.push_front(Entry::Resolved(value, level));
                }
                None => stack.push(head),
            }
        } else {
            // the deeper run on the stack must be reduced before `head`
            let right_ready = top.is_operand();
            let reduced = if right_ready {
                stack.pop().and_then(|right| match pop_left(&mut stack) {
                    Some((left, junction)) => Some((left, junction, right)),
                    None => {
                        stack.push(right);
                        None
                    }
                })
            } else {
                None
            };

            match reduced {
                Some((left, junction, right)) => {
                    let head_level = match &head {
                        Entry::Op(_, level) => *level,
                        _ => 0,
                    };
                    let level = Entry::op_level(stack.last()).max(head_level);
                    let value = combine(left, junction, right, &mut eval);
                    queue.push_front(head);
                    queue.push_front(Entry::Resolved(value, level));
                }
                None => stack.push(head),
            }
        }
    }

    let mut result: Option<bool> = None;
    while let Some(entry) = stack.pop() {
        if !entry.is_operand() {
            continue;
        }
        let right = entry;
        match pop_left(&mut stack) {
            Some((left, junction)) => {
                let value = combine(left, junction, right, &mut eval);
                stack.push(Entry::Resolved(value, 0));
            }
            None => {
                let value = resolve(right, &mut eval);
                result = Some(match result {
                    // operands left without a junction are ANDed
                    Some(acc) => acc && value,
                    None => value,
                });
            }
        }
    }
    result.unwrap_or(true)
}
