//! In-memory row source.

use crate::executor::{ColumnInfo, Row, RowSource};
use anyhow::{bail, Result};

/// Source producing a fixed set of rows
pub struct VecSource {
    rows: Vec<Row>,
    schema: Vec<ColumnInfo>,
    current: usize,
    initialized: bool,
}

impl VecSource {
    pub fn new(schema: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        Self {
            rows,
            schema,
            current: 0,
            initialized: false,
        }
    }
}

impl RowSource for VecSource {
    fn init(&mut self) -> Result<()> {
        self.current = 0;
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>> {
        if !self.initialized {
            bail!("Source not initialized. Call init() first.");
        }

        let Some(row) = self.rows.get(self.current) else {
            return Ok(None);
        };
        self.current += 1;
        Ok(Some(row.clone()))
    }

    fn output_schema(&self) -> &[ColumnInfo] {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{LogicalType, Value};

    #[test]
    fn test_vec_source() -> Result<()> {
        let schema = vec![ColumnInfo::new("id", LogicalType::Integer)];
        let mut source = VecSource::new(
            schema.clone(),
            vec![vec![Value::Integer(1)], vec![Value::Integer(2)]],
        );

        assert!(source.next().is_err());
        source.init()?;
        assert_eq!(source.output_schema(), &schema[..]);
        assert_eq!(source.next()?, Some(vec![Value::Integer(1)]));
        assert_eq!(source.next()?, Some(vec![Value::Integer(2)]));
        assert_eq!(source.next()?, None);

        // init rewinds
        source.init()?;
        assert_eq!(source.next()?, Some(vec![Value::Integer(1)]));
        Ok(())
    }
}
