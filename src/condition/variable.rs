//! Variable placeholders in condition operands.
//!
//! An operand string of the form `$(name)` refers to a variable whose value
//! is supplied at run time by a [`VariableResolver`].

use crate::value::Value;
use std::collections::HashMap;
use std::hash::BuildHasher;

/// Source of run-time variable values
pub trait VariableResolver {
    /// Look up a variable; `None` when it has no value
    fn resolve(&self, name: &str) -> Option<Value>;
}

impl<S: BuildHasher> VariableResolver for HashMap<String, Value, S> {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

/// Get the variable name if `value` is a `$(name)` placeholder
pub fn variable_name(value: &Value) -> Option<&str> {
    let name = value
        .as_str()?
        .trim()
        .strip_prefix("$(")?
        .strip_suffix(')')?;

    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-'));
    valid.then_some(name)
}
