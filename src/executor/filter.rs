//! Filter executor implementation.
//!
//! This executor filters rows from a child source through a condition list.
//! On `init()` the list is prepared once: variables are substituted, the list
//! is validated and compiled against the child's columns. Each call to
//! `next()` then yields the next row the compiled group accepts.

use crate::config::{Evaluator, FilterConfig};
use crate::executor::{ColumnInfo, Row, RowSource};
use crate::group::ConditionGroup;
use crate::list::ConditionList;
use crate::value::Value;
use anyhow::{bail, Result};
use chrono::{Local, NaiveDateTime};
use log::debug;
use std::collections::HashMap;

/// Row counts collected while filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub scanned: usize,
    pub passed: usize,
}

/// Executor that filters rows with a condition list
pub struct FilterExecutor {
    /// Child source that produces rows
    child: Box<dyn RowSource>,
    /// Conditions as defined, before variable substitution
    conditions: ConditionList,
    variables: HashMap<String, Value>,
    config: FilterConfig,
    /// Reference instant for relative date ranges; the clock at `init()` when unset
    now: Option<NaiveDateTime>,
    /// Compiled group, built on `init()`
    group: Option<ConditionGroup>,
    /// Output schema (same as child's schema)
    output_schema: Vec<ColumnInfo>,
    stats: FilterStats,
    exhausted: bool,
}

impl FilterExecutor {
    /// Create a new filter executor
    ///
    /// # Arguments
    /// * `child` - The child source that produces rows
    /// * `conditions` - The condition list every returned row satisfies
    pub fn new(child: Box<dyn RowSource>, conditions: ConditionList) -> Self {
        Self {
            child,
            conditions,
            variables: HashMap::new(),
            config: FilterConfig::default(),
            now: None,
            group: None,
            output_schema: Vec::new(),
            stats: FilterStats::default(),
            exhausted: false,
        }
    }

    pub fn with_config(mut self, config: FilterConfig) -> Self {
        self.config = config;
        self
    }

    /// Values for `$(name)` placeholders in condition operands
    pub fn with_variables(mut self, variables: HashMap<String, Value>) -> Self {
        self.variables = variables;
        self
    }

    /// Fix the reference instant used by relative date ranges
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    pub fn stats(&self) -> FilterStats {
        self.stats
    }
}

impl RowSource for FilterExecutor {
    fn init(&mut self) -> Result<()> {
        if self.group.is_some() {
            return Ok(());
        }

        // Initialize child source
        self.child.init()?;

        // Copy the child's output schema
        self.output_schema = self.child.output_schema().to_vec();

        let mut list = self.conditions.clone();
        if list.replace_variables(&self.variables) {
            let ignored = list
                .conditions()
                .filter(|item| item.condition.is_ignored())
                .count();
            if ignored > 0 {
                debug!("{} conditions ignored for lack of variable values", ignored);
            }
        }
        list.validate_with(self.config.drop_ignored);

        let columns: Vec<&str> = self.output_schema.iter().map(|c| c.name.as_str()).collect();
        let mut group = ConditionGroup::compile(&list, &columns);
        group.set_not_found_result(self.config.not_found_result);
        debug!("Filtering with {}", list);

        self.now.get_or_insert_with(|| Local::now().naive_local());
        self.group = Some(group);
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>> {
        let (Some(group), Some(now)) = (&self.group, self.now) else {
            bail!("Executor not initialized. Call init() first.");
        };

        // Keep getting rows from child until one matches
        while let Some(row) = self.child.next()? {
            self.stats.scanned += 1;
            let matched = match self.config.evaluator {
                Evaluator::Tree => group.evaluate_at(&row, now),
                Evaluator::Stack => group.evaluate_stack_at(&row, now),
            };
            if matched {
                self.stats.passed += 1;
                return Ok(Some(row));
            }
        }

        if !self.exhausted {
            self.exhausted = true;
            debug!(
                "Filter scanned {} rows, {} passed",
                self.stats.scanned, self.stats.passed
            );
        }
        Ok(None)
    }

    fn output_schema(&self) -> &[ColumnInfo] {
        &self.output_schema
    }
}
