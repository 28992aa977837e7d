//! Filter configuration and definition files.

use crate::list::ConditionList;
use crate::value::Value;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Which evaluator decides each row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Evaluator {
    /// Explicit tree compiled once from the levels
    #[default]
    Tree,
    /// Stack machine over the flat items
    Stack,
}

/// Options controlling how a condition list filters rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Result for conditions on columns missing from the row
    pub not_found_result: bool,
    /// Remove conditions whose variables have no value instead of passing them
    pub drop_ignored: bool,
    pub evaluator: Evaluator,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            not_found_result: true,
            drop_ignored: false,
            evaluator: Evaluator::Tree,
        }
    }
}

/// A condition file: conditions plus optional config and variable values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterDefinition {
    #[serde(default)]
    pub config: FilterConfig,
    #[serde(default)]
    pub variables: HashMap<String, Value>,
    pub conditions: ConditionList,
}

impl FilterDefinition {
    /// Parse a definition. A bare JSON array is read as the condition list.
    pub fn from_json(text: &str) -> Result<Self> {
        let json: serde_json::Value = serde_json::from_str(text).context("Invalid JSON")?;
        if json.is_array() {
            let conditions = serde_json::from_value(json).context("Invalid condition list")?;
            return Ok(Self {
                conditions,
                ..Self::default()
            });
        }
        serde_json::from_value(json).context("Invalid filter definition")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read conditions from {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Failed to load {}", path.display()))
    }
}
