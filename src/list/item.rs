//! Items of a condition list.

use crate::condition::{Condition, ConditionError, ConditionResult};
use crate::list::HierarchyItem;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Boolean combinator between two operands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Junction {
    And,
    Or,
}

impl Junction {
    /// Persisted code: 0 for AND, 1 for OR
    pub fn code(self) -> i32 {
        match self {
            Junction::And => 0,
            Junction::Or => 1,
        }
    }

    pub fn from_code(code: i32) -> ConditionResult<Self> {
        match code {
            0 => Ok(Junction::And),
            1 => Ok(Junction::Or),
            _ => Err(ConditionError::UnknownJunctionCode { code }),
        }
    }

    pub fn flip(self) -> Self {
        match self {
            Junction::And => Junction::Or,
            Junction::Or => Junction::And,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Junction::And => "AND",
            Junction::Or => "OR",
        }
    }

    /// Combine two operands, evaluating `right` only when `left` does not
    /// already decide the result
    pub fn apply(self, left: bool, right: impl FnOnce() -> bool) -> bool {
        match self {
            Junction::And => left && right(),
            Junction::Or => left || right(),
        }
    }
}

impl fmt::Display for Junction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Symbolic reference to a row column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub name: String,
    /// Position inside a merged cell
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_column: Option<usize>,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sub_column: None,
        }
    }

    pub fn with_sub_column(mut self, sub_column: usize) -> Self {
        self.sub_column = Some(sub_column);
        self
    }
}

impl From<&str> for ColumnRef {
    fn from(name: &str) -> Self {
        ColumnRef::new(name)
    }
}

impl From<String> for ColumnRef {
    fn from(name: String) -> Self {
        ColumnRef::new(name)
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sub_column {
            Some(sub) => write!(f, "{}[{}]", self.name, sub),
            None => f.write_str(&self.name),
        }
    }
}

/// A predicate on one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionItem {
    pub column: ColumnRef,
    pub condition: Condition,
    #[serde(default)]
    pub level: u32,
}

impl fmt::Display for ConditionItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.column, self.condition)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JunctionItem {
    pub junction: Junction,
    #[serde(default)]
    pub level: u32,
}

/// One entry of a [`ConditionList`](crate::list::ConditionList)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "item", rename_all = "lowercase")]
pub enum ListItem {
    Condition(ConditionItem),
    Junction(JunctionItem),
}

impl ListItem {
    pub fn condition(column: impl Into<ColumnRef>, condition: Condition, level: u32) -> Self {
        ListItem::Condition(ConditionItem {
            column: column.into(),
            condition,
            level,
        })
    }

    pub fn junction(junction: Junction, level: u32) -> Self {
        ListItem::Junction(JunctionItem { junction, level })
    }

    pub fn as_condition(&self) -> Option<&ConditionItem> {
        match self {
            ListItem::Condition(item) => Some(item),
            ListItem::Junction(_) => None,
        }
    }

    pub fn as_junction(&self) -> Option<&JunctionItem> {
        match self {
            ListItem::Junction(item) => Some(item),
            ListItem::Condition(_) => None,
        }
    }
}

impl HierarchyItem for ListItem {
    fn level(&self) -> u32 {
        match self {
            ListItem::Condition(item) => item.level,
            ListItem::Junction(item) => item.level,
        }
    }

    fn set_level(&mut self, level: u32) {
        match self {
            ListItem::Condition(item) => item.level = level,
            ListItem::Junction(item) => item.level = level,
        }
    }

    fn is_junction(&self) -> bool {
        matches!(self, ListItem::Junction(_))
    }

    fn and_junction(level: u32) -> Self {
        ListItem::junction(Junction::And, level)
    }
}
