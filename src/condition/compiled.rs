//! Evaluation-ready form of a condition.
//!
//! Built lazily from a [`Condition`] and dropped whenever its type, operator,
//! operands or case sensitivity change. Once built it is immutable, so a
//! compiled condition can be shared by readers on several threads.

use crate::condition::{variable_name, Condition, Operator};
use crate::daterange::DateRange;
use crate::value::{coerce_value, normalize_for, Comparator, Value, ValueKind};
use log::{debug, warn};
use regex::{Regex, RegexBuilder};

/// ONE_OF operands sorted by the condition's comparator.
///
/// Only built when every operand has the same runtime kind.
#[derive(Debug, Clone)]
pub struct SortedOperands {
    kind: ValueKind,
    values: Vec<Value>,
}

impl SortedOperands {
    fn build(operands: &[Value], comparator: &Comparator) -> Option<Self> {
        if matches!(comparator, Comparator::Role { .. }) {
            return None;
        }
        let kind = operands.first()?.kind()?;
        let uniform = operands.iter().all(|v| {
            v.kind() == Some(kind) && !matches!(kind, ValueKind::Array | ValueKind::Merged)
        }) && operands.iter().all(|v| variable_name(v).is_none());
        if !uniform {
            return None;
        }

        let mut values = operands.to_vec();
        values.sort_by(|a, b| comparator.compare(a, b));
        Some(Self { kind, values })
    }

    /// Binary search; `None` when `value` is not of the sorted kind
    pub fn contains(&self, value: &Value, comparator: &Comparator) -> Option<bool> {
        if value.kind() != Some(self.kind) {
            return None;
        }
        Some(
            self.values
                .binary_search_by(|probe| comparator.compare(probe, value))
                .is_ok(),
        )
    }
}

/// Condition state derived from its definition
#[derive(Debug, Clone)]
pub struct CompiledCondition {
    pub comparator: Comparator,
    /// Operands coerced to the declared type; ONE_OF arrays are flattened
    pub operands: Vec<Value>,
    pub sorted: Option<SortedOperands>,
    pub pattern: Option<Regex>,
    pub range: Option<DateRange>,
}

static NULL: Value = Value::Null;

impl CompiledCondition {
    pub fn build(condition: &Condition) -> Self {
        let op = condition.operator();
        let ty = condition.logical_type();
        let comparator = Comparator::for_type(ty, condition.is_case_sensitive());

        let flattened: Vec<&Value> = if op == Operator::OneOf {
            condition
                .values()
                .iter()
                .flat_map(|v| match v {
                    Value::Array(items) => items.iter().collect::<Vec<_>>(),
                    other => vec![other],
                })
                .collect()
        } else {
            condition.values().iter().collect()
        };

        let convert = condition.is_convert_type() && !op.is_pattern() && op != Operator::DateIn;
        let operands: Vec<Value> = flattened
            .into_iter()
            .map(|v| if convert { coerce_value(v, ty) } else { v.clone() })
            .collect();

        let sorted = if op == Operator::OneOf {
            SortedOperands::build(&operands, &comparator)
        } else {
            None
        };

        let pattern = match (op, operands.first()) {
            (Operator::Like, Some(p)) if !p.is_null() => {
                like_to_regex(&p.to_string(), condition.is_case_sensitive())
            }
            _ => None,
        };

        let range = match (op, operands.first()) {
            (Operator::DateIn, Some(keyword)) => {
                let keyword = keyword.to_string();
                let range = DateRange::parse(&keyword);
                if range.is_none() {
                    debug!("Unknown date range '{}'", keyword);
                }
                range
            }
            _ => None,
        };

        Self {
            comparator,
            operands,
            sorted,
            pattern,
            range,
        }
    }

    /// Get the `index`-th operand, NULL when missing
    pub fn operand(&self, index: usize) -> &Value {
        self.operands.get(index).unwrap_or(&NULL)
    }

    /// ONE_OF membership: binary search when the value matches the sorted
    /// kind, otherwise a linear scan with per-operand normalization
    pub fn one_of(&self, value: &Value) -> bool {
        if let Some(found) = self
            .sorted
            .as_ref()
            .and_then(|sorted| sorted.contains(value, &self.comparator))
        {
            return found;
        }
        self.one_of_linear(value)
    }

    pub fn one_of_linear(&self, value: &Value) -> bool {
        self.operands
            .iter()
            .any(|op| self.comparator.equals(value, &normalize_for(op, value)))
    }
}

/// Compile a LIKE pattern: `%` is any run, `?` is one character, everything
/// else is literal. The result is anchored at both ends.
pub fn like_to_regex(pattern: &str, case_sensitive: bool) -> Option<Regex> {
    let mut regex = String::with_capacity(pattern.len() * 2 + 2);
    regex.push('^');
    for c in pattern.chars() {
        match c {
            '%' => regex.push_str(".*"),
            '?' => regex.push('.'),
            other => regex.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    regex.push('$');

    match RegexBuilder::new(&regex)
        .case_insensitive(!case_sensitive)
        .build()
    {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("Failed to compile LIKE pattern '{}': {}", pattern, e);
            None
        }
    }
}
