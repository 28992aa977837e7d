//! The single-predicate condition.

use crate::condition::compiled::CompiledCondition;
use crate::condition::{encode_operation, variable_name, Operator, VariableResolver};
use crate::value::{normalize_for, LogicalType, Value};
use chrono::{Local, NaiveDateTime};
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

fn default_true() -> bool {
    true
}

/// A typed test against one input value.
///
/// Operands are stored as given and coerced into the declared type when the
/// condition is first evaluated. Every setter that affects evaluation drops
/// the compiled form, so there is no cache to invalidate by hand except
/// through [`Condition::clear_cache`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    logical_type: LogicalType,
    operator: Operator,
    #[serde(default)]
    correlated: bool,
    #[serde(default)]
    values: Vec<Value>,
    #[serde(default)]
    negated: bool,
    /// Inclusive bound for LESS_THAN / GREATER_THAN
    #[serde(default)]
    equal: bool,
    #[serde(default)]
    case_sensitive: bool,
    #[serde(default)]
    ignore_null_value: bool,
    /// When set, the string "null" is not treated as NULL
    #[serde(default)]
    strict_null: bool,
    #[serde(default = "default_true")]
    convert_type: bool,
    /// Set when a referenced variable had no value; the condition then passes
    #[serde(skip)]
    ignored: bool,
    #[serde(skip)]
    compiled: OnceLock<CompiledCondition>,
}

impl Condition {
    pub fn new(logical_type: LogicalType, operator: Operator) -> Self {
        Self {
            logical_type,
            operator,
            correlated: false,
            values: Vec::new(),
            negated: false,
            equal: false,
            case_sensitive: false,
            ignore_null_value: false,
            strict_null: false,
            convert_type: true,
            ignored: false,
            compiled: OnceLock::new(),
        }
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.add_value(value);
        self
    }

    pub fn with_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        for value in values {
            self.add_value(value);
        }
        self
    }

    pub fn with_negated(mut self, negated: bool) -> Self {
        self.negated = negated;
        self
    }

    pub fn with_equal(mut self, equal: bool) -> Self {
        self.equal = equal;
        self
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.set_case_sensitive(case_sensitive);
        self
    }

    pub fn logical_type(&self) -> LogicalType {
        self.logical_type
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Persisted operation code, including the correlated bit
    pub fn operation_code(&self) -> i32 {
        encode_operation(self.operator, self.correlated)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn is_correlated(&self) -> bool {
        self.correlated
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn is_equal(&self) -> bool {
        self.equal
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn is_ignore_null_value(&self) -> bool {
        self.ignore_null_value
    }

    pub fn is_strict_null(&self) -> bool {
        self.strict_null
    }

    pub fn is_convert_type(&self) -> bool {
        self.convert_type
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    pub fn set_type(&mut self, logical_type: LogicalType) {
        self.logical_type = logical_type;
        self.clear_cache();
    }

    pub fn set_operator(&mut self, operator: Operator) {
        self.operator = operator;
        self.clear_cache();
    }

    pub fn set_correlated(&mut self, correlated: bool) {
        self.correlated = correlated;
    }

    pub fn add_value(&mut self, value: impl Into<Value>) {
        self.values.push(value.into());
        self.clear_cache();
    }

    /// Replace the operand at `index`, appending when `index == len`
    pub fn set_value(&mut self, index: usize, value: impl Into<Value>) {
        let value = value.into();
        if index < self.values.len() {
            self.values[index] = value;
        } else {
            self.values.push(value);
        }
        self.clear_cache();
    }

    pub fn set_values(&mut self, values: Vec<Value>) {
        self.values = values;
        self.clear_cache();
    }

    pub fn remove_value(&mut self, index: usize) -> Option<Value> {
        if index >= self.values.len() {
            return None;
        }
        let removed = self.values.remove(index);
        self.clear_cache();
        Some(removed)
    }

    pub fn remove_all_values(&mut self) {
        self.values.clear();
        self.clear_cache();
    }

    pub fn set_negated(&mut self, negated: bool) {
        self.negated = negated;
    }

    pub fn set_equal(&mut self, equal: bool) {
        self.equal = equal;
    }

    pub fn set_case_sensitive(&mut self, case_sensitive: bool) {
        self.case_sensitive = case_sensitive;
        self.clear_cache();
    }

    pub fn set_ignore_null_value(&mut self, ignore: bool) {
        self.ignore_null_value = ignore;
    }

    pub fn set_strict_null(&mut self, strict: bool) {
        self.strict_null = strict;
    }

    /// Disable coercion: operands are compared exactly as stored
    pub fn set_convert_type(&mut self, convert: bool) {
        self.convert_type = convert;
        self.clear_cache();
    }

    pub fn set_ignored(&mut self, ignored: bool) {
        self.ignored = ignored;
    }

    /// Drop the compiled form; it is rebuilt on the next evaluation
    pub fn clear_cache(&mut self) {
        self.compiled = OnceLock::new();
    }

    pub(crate) fn compiled(&self) -> &CompiledCondition {
        self.compiled.get_or_init(|| CompiledCondition::build(self))
    }

    /// Names of all `$(name)` placeholders among the operands
    pub fn variables(&self) -> Vec<&str> {
        self.values
            .iter()
            .flat_map(|v| match v {
                Value::Array(items) => items.iter().collect::<Vec<_>>(),
                other => vec![other],
            })
            .filter_map(variable_name)
            .collect()
    }

    /// Substitute variable placeholders with values from `vars`.
    ///
    /// A variable without a value (missing, NULL or an empty array) marks
    /// the condition ignored. Array values are spliced into ONE_OF operand
    /// lists. Returns whether any placeholder was found.
    pub fn replace_variables(&mut self, vars: &dyn VariableResolver) -> bool {
        let mut found = false;
        let mut missing = false;
        let mut replaced = Vec::with_capacity(self.values.len());

        for value in std::mem::take(&mut self.values) {
            let Some(name) = variable_name(&value).map(str::to_string) else {
                replaced.push(value);
                continue;
            };
            found = true;

            match vars.resolve(&name) {
                None | Some(Value::Null) => {
                    debug!("Variable '{}' has no value, ignoring condition", name);
                    missing = true;
                    replaced.push(value);
                }
                Some(Value::Array(items)) if items.is_empty() => {
                    debug!("Variable '{}' is empty, ignoring condition", name);
                    missing = true;
                    replaced.push(value);
                }
                Some(Value::Array(items)) if self.operator == Operator::OneOf => {
                    replaced.extend(items)
                }
                Some(resolved) => replaced.push(resolved),
            }
        }

        self.values = replaced;
        if missing {
            self.ignored = true;
        }
        if found {
            self.clear_cache();
        }
        found
    }

    /// Evaluate against `value` using the local clock for DATE_IN
    pub fn evaluate(&self, value: &Value) -> bool {
        self.evaluate_at(value, Local::now().naive_local())
    }

    /// Evaluate against `value` with `now` as the DATE_IN reference instant.
    ///
    /// NULL inputs fail every comparison operator regardless of negation.
    pub fn evaluate_at(&self, value: &Value, now: NaiveDateTime) -> bool {
        if self.ignored || !self.operator.is_row_local() {
            return true;
        }

        let value = match value {
            Value::Array(_) if self.logical_type != LogicalType::Role => value.first(),
            other => other,
        };
        let compiled = self.compiled();
        let cmp = &compiled.comparator;

        let matched = match self.operator {
            Operator::EqualTo => {
                let operand = normalize_for(compiled.operand(0), value);
                if operand.is_null() && self.ignore_null_value {
                    return true;
                }
                cmp.equals(value, &operand)
            }
            Operator::LessThan | Operator::GreaterThan => {
                if value.is_null() || compiled.operands.is_empty() {
                    return false;
                }
                let ord = cmp.compare(value, &normalize_for(compiled.operand(0), value));
                match (self.operator, self.equal) {
                    (Operator::LessThan, false) => ord == Ordering::Less,
                    (Operator::LessThan, true) => ord != Ordering::Greater,
                    (_, false) => ord == Ordering::Greater,
                    (_, true) => ord != Ordering::Less,
                }
            }
            Operator::Between => {
                if value.is_null() || compiled.operands.len() < 2 {
                    return false;
                }
                let low = normalize_for(compiled.operand(0), value);
                let high = normalize_for(compiled.operand(1), value);
                cmp.compare(&low, value) != Ordering::Greater
                    && cmp.compare(value, &high) != Ordering::Greater
            }
            Operator::OneOf => {
                if value.is_null() {
                    return false;
                }
                if self.values.len() == 1 && self.values[0].is_null() {
                    return false;
                }
                compiled.one_of(value)
            }
            Operator::StartingWith | Operator::Contains => {
                if value.is_null() || compiled.operands.is_empty() {
                    return false;
                }
                let text = value.to_string();
                let needle = compiled.operand(0).to_string();
                let (text, needle) = if self.case_sensitive {
                    (text, needle)
                } else {
                    (text.to_lowercase(), needle.to_lowercase())
                };
                if self.operator == Operator::StartingWith {
                    text.starts_with(&needle)
                } else {
                    text.contains(&needle)
                }
            }
            Operator::Like => {
                if value.is_null() {
                    return false;
                }
                match &compiled.pattern {
                    Some(re) => re.is_match(&value.to_string()),
                    None => false,
                }
            }
            Operator::Null => match value {
                Value::Null => true,
                Value::String(s) => s.is_empty() || (!self.strict_null && s == "null"),
                _ => false,
            },
            Operator::DateIn => match &compiled.range {
                Some(range) => range.contains(value, now),
                None => false,
            },
            // passed before the match
            Operator::TopN | Operator::BottomN | Operator::Pseudo => false,
        };

        matched != self.negated
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        self.logical_type == other.logical_type
            && self.operator == other.operator
            && self.correlated == other.correlated
            && self.values == other.values
            && self.negated == other.negated
            && self.equal == other.equal
            && self.case_sensitive == other.case_sensitive
            && self.ignore_null_value == other.ignore_null_value
            && self.strict_null == other.strict_null
            && self.convert_type == other.convert_type
            && self.ignored == other.ignored
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("not ")?;
        }
        match self.operator {
            Operator::Null => f.write_str("is null"),
            Operator::Between => write!(
                f,
                "between {} and {}",
                self.values.first().unwrap_or(&Value::Null),
                self.values.get(1).unwrap_or(&Value::Null)
            ),
            Operator::OneOf => {
                f.write_str("one of [")?;
                for (i, v) in self.values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str("]")
            }
            Operator::LessThan | Operator::GreaterThan if self.equal => write!(
                f,
                "{} or equal to {}",
                self.operator,
                self.values.first().unwrap_or(&Value::Null)
            ),
            op => write!(
                f,
                "{} {}",
                op,
                self.values.first().unwrap_or(&Value::Null)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn int_condition(op: Operator) -> Condition {
        Condition::new(LogicalType::Integer, op)
    }

    #[test]
    fn test_between_inclusive() {
        let c = int_condition(Operator::Between).with_values([10, 20]);
        assert!(c.evaluate(&Value::Integer(10)));
        assert!(c.evaluate(&Value::Integer(20)));
        assert!(c.evaluate(&Value::Integer(15)));
        assert!(!c.evaluate(&Value::Integer(9)));
        assert!(!c.evaluate(&Value::Integer(21)));
        assert!(!c.evaluate(&Value::Null));
    }

    #[test]
    fn test_between_with_string_operands() {
        let c = int_condition(Operator::Between).with_values(["10", "20"]);
        assert!(c.evaluate(&Value::Integer(10)));
        assert!(!c.evaluate(&Value::Integer(21)));
        assert!(!int_condition(Operator::Between)
            .with_value(10)
            .evaluate(&Value::Integer(10)));
    }

    #[test]
    fn test_equal_to() {
        let c = int_condition(Operator::EqualTo).with_value("5");
        assert!(c.evaluate(&Value::Integer(5)));
        assert!(c.evaluate(&Value::Double(5.0)));
        assert!(!c.evaluate(&Value::Integer(6)));
        assert!(!c.evaluate(&Value::Null));

        let negated = c.clone().with_negated(true);
        assert!(!negated.evaluate(&Value::Integer(5)));
        assert!(negated.evaluate(&Value::Integer(6)));
        assert!(negated.evaluate(&Value::Null));
    }

    #[test]
    fn test_equal_to_null_operand() {
        let mut c = int_condition(Operator::EqualTo).with_value(Value::Null);
        assert!(c.evaluate(&Value::Null));
        assert!(!c.evaluate(&Value::Integer(1)));

        c.set_ignore_null_value(true);
        assert!(c.evaluate(&Value::Integer(1)));
        c.set_negated(true);
        assert!(c.evaluate(&Value::Integer(1)));
    }

    #[test]
    fn test_less_and_greater() {
        let lt = int_condition(Operator::LessThan).with_value(10);
        assert!(lt.evaluate(&Value::Integer(9)));
        assert!(!lt.evaluate(&Value::Integer(10)));
        assert!(lt.clone().with_equal(true).evaluate(&Value::Integer(10)));
        assert!(!lt.evaluate(&Value::Null));
        assert!(!lt.clone().with_negated(true).evaluate(&Value::Null));

        let gt = int_condition(Operator::GreaterThan).with_value(10);
        assert!(gt.evaluate(&Value::Integer(11)));
        assert!(!gt.evaluate(&Value::Integer(10)));
        assert!(gt.clone().with_equal(true).evaluate(&Value::Integer(10)));
        assert!(gt.clone().with_negated(true).evaluate(&Value::Integer(10)));
    }

    #[test]
    fn test_one_of() {
        let c = Condition::new(LogicalType::String, Operator::OneOf)
            .with_values(["red", "green", "blue"]);
        assert!(c.evaluate(&Value::string("GREEN")));
        assert!(!c.evaluate(&Value::string("yellow")));
        assert!(!c.evaluate(&Value::Null));
        assert!(!c
            .clone()
            .with_case_sensitive(true)
            .evaluate(&Value::string("GREEN")));

        let null_only = Condition::new(LogicalType::String, Operator::OneOf).with_value(Value::Null);
        assert!(!null_only.evaluate(&Value::string("x")));
        assert!(!null_only.clone().with_negated(true).evaluate(&Value::string("x")));
    }

    #[test]
    fn test_one_of_cache_invalidation() {
        let mut c = int_condition(Operator::OneOf).with_values([1, 2, 3]);
        assert!(c.evaluate(&Value::Integer(2)));

        c.remove_value(1);
        assert!(!c.evaluate(&Value::Integer(2)));

        c.add_value(7);
        assert!(c.evaluate(&Value::Integer(7)));

        c.set_type(LogicalType::String);
        assert!(c.evaluate(&Value::string("7")));
        assert!(c.evaluate(&Value::Integer(7)));
    }

    #[test]
    fn test_starting_with_and_contains() {
        let sw = Condition::new(LogicalType::String, Operator::StartingWith).with_value("ab");
        assert!(sw.evaluate(&Value::string("ABC")));
        assert!(!sw.evaluate(&Value::string("cab")));
        assert!(!sw.clone().with_case_sensitive(true).evaluate(&Value::string("ABC")));

        let contains = Condition::new(LogicalType::Integer, Operator::Contains).with_value("23");
        assert!(contains.evaluate(&Value::Integer(1234)));
        assert!(!contains.evaluate(&Value::Null));

        let role = Condition::new(LogicalType::Role, Operator::Contains).with_value("b,c");
        assert!(role.evaluate(&Value::Array(vec![
            Value::string("a"),
            Value::string("b"),
            Value::string("c"),
        ])));
    }

    #[test]
    fn test_like() {
        let c = Condition::new(LogicalType::String, Operator::Like).with_value("A%Z");
        assert!(c.evaluate(&Value::string("AxyzZ")));
        assert!(c.evaluate(&Value::string("axyzz")));
        assert!(!c.clone().with_case_sensitive(true).evaluate(&Value::string("axyzz")));

        let c = Condition::new(LogicalType::String, Operator::Like).with_value("A?Z");
        assert!(c.evaluate(&Value::string("AxZ")));
        assert!(!c.evaluate(&Value::string("AxyZ")));

        let c = Condition::new(LogicalType::String, Operator::Like).with_value("v1.(2)");
        assert!(c.evaluate(&Value::string("v1.(2)")));
        assert!(!c.evaluate(&Value::string("v1x(2)")));
        assert!(!c.evaluate(&Value::Null));
    }

    #[test]
    fn test_null_operator() {
        let c = Condition::new(LogicalType::String, Operator::Null);
        assert!(c.evaluate(&Value::Null));
        assert!(c.evaluate(&Value::string("")));
        assert!(c.evaluate(&Value::string("null")));
        assert!(!c.evaluate(&Value::string("x")));

        let mut strict = c.clone();
        strict.set_strict_null(true);
        assert!(!strict.evaluate(&Value::string("null")));

        let not_null = c.with_negated(true);
        assert!(not_null.evaluate(&Value::string("x")));
        assert!(!not_null.evaluate(&Value::Null));
    }

    #[test]
    fn test_date_in() {
        let now = NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let c = Condition::new(LogicalType::Date, Operator::DateIn).with_value("Last 7 Days");
        let day = |d| Value::Date(NaiveDate::from_ymd_opt(2024, 1, d).unwrap());

        assert!(c.evaluate_at(&day(4), now));
        assert!(!c.evaluate_at(&day(2), now));
        assert!(c.evaluate_at(&day(10), now));
        assert!(!c.evaluate_at(&Value::Null, now));
        // a missing date is outside every range, so the negation holds
        let outside = c.clone().with_negated(true);
        assert!(outside.evaluate_at(&Value::Null, now));
        assert!(!outside.evaluate_at(&day(4), now));

        let unknown = Condition::new(LogicalType::Date, Operator::DateIn).with_value("someday");
        assert!(!unknown.evaluate_at(&day(10), now));
        assert!(unknown.with_negated(true).evaluate_at(&day(10), now));
    }

    #[test]
    fn test_string_operand_against_date_rows() {
        let c = Condition::new(LogicalType::String, Operator::GreaterThan).with_value("2024-01-05");
        let day = |d| Value::Date(NaiveDate::from_ymd_opt(2024, 1, d).unwrap());
        assert!(c.evaluate(&day(6)));
        assert!(!c.evaluate(&day(5)));
    }

    #[test]
    fn test_array_input_uses_first_element() {
        let c = int_condition(Operator::EqualTo).with_value(1);
        assert!(c.evaluate(&Value::Array(vec![Value::Integer(1), Value::Integer(2)])));
        assert!(!c.evaluate(&Value::Array(vec![Value::Integer(2), Value::Integer(1)])));

        let role = Condition::new(LogicalType::Role, Operator::EqualTo).with_value("admin");
        assert!(role.evaluate(&Value::Array(vec![
            Value::string("sales"),
            Value::string("Admin"),
        ])));
    }

    #[test]
    fn test_ignored_always_passes() {
        let mut c = int_condition(Operator::EqualTo).with_value(1);
        c.set_ignored(true);
        assert!(c.evaluate(&Value::Integer(2)));
        assert!(c.clone().with_negated(true).evaluate(&Value::Integer(1)));
    }

    #[test]
    fn test_ranking_operators_pass_rows() {
        let c = int_condition(Operator::TopN).with_value(5);
        assert!(c.evaluate(&Value::Integer(1)));
        assert!(int_condition(Operator::Pseudo).with_negated(true).evaluate(&Value::Null));
        assert!(int_condition(Operator::BottomN)
            .with_value(3)
            .with_negated(true)
            .evaluate(&Value::Integer(1)));
    }

    #[test]
    fn test_replace_variables() {
        let mut vars = HashMap::new();
        vars.insert("low".to_string(), Value::Integer(10));
        vars.insert(
            "colors".to_string(),
            Value::Array(vec![Value::string("red"), Value::string("blue")]),
        );

        let mut between = int_condition(Operator::Between).with_values(["$(low)", "20"]);
        assert_eq!(between.variables(), vec!["low"]);
        assert!(between.replace_variables(&vars));
        assert!(!between.is_ignored());
        assert_eq!(between.values()[0], Value::Integer(10));
        assert!(between.evaluate(&Value::Integer(10)));

        let mut one_of =
            Condition::new(LogicalType::String, Operator::OneOf).with_value("$(colors)");
        one_of.replace_variables(&vars);
        assert_eq!(one_of.values().len(), 2);
        assert!(one_of.evaluate(&Value::string("blue")));

        let mut missing = int_condition(Operator::EqualTo).with_value("$(absent)");
        assert!(missing.replace_variables(&vars));
        assert!(missing.is_ignored());
        assert!(missing.evaluate(&Value::Integer(12345)));

        let mut plain = int_condition(Operator::EqualTo).with_value(3);
        assert!(!plain.replace_variables(&vars));
    }

    #[test]
    fn test_operation_code_and_display() {
        let mut c = int_condition(Operator::OneOf).with_values([1, 2]);
        assert_eq!(c.operation_code(), 2);
        c.set_correlated(true);
        assert_eq!(c.operation_code(), 1026);
        assert_eq!(c.to_string(), "one of [1, 2]");

        let c = int_condition(Operator::LessThan)
            .with_value(3)
            .with_equal(true)
            .with_negated(true);
        assert_eq!(c.to_string(), "not less than or equal to 3");
        assert_eq!(
            int_condition(Operator::Between).with_values([1, 9]).to_string(),
            "between 1 and 9"
        );
    }

    #[test]
    fn test_serde_skips_cache() -> anyhow::Result<()> {
        let c = int_condition(Operator::Between).with_values([1, 5]);
        assert!(c.evaluate(&Value::Integer(3)));
        let json = serde_json::to_string(&c)?;
        let back: Condition = serde_json::from_str(&json)?;
        assert_eq!(back, c);
        assert!(back.evaluate(&Value::Integer(3)));
        Ok(())
    }
}
