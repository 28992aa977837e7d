//! Row source reading a JSON document.
//!
//! The document names its columns and lists rows as arrays of cells:
//!
//! ```json
//! {
//!   "columns": [{"name": "region", "type": "string"}, {"name": "day", "type": "date"}],
//!   "rows": [["EU", "2024-01-05"], ["US", null]]
//! }
//! ```
//!
//! Cells are converted to each column's declared type. A cell written as
//! `{"merged": [...]}` becomes a merged cell.

use crate::executor::{ColumnInfo, Row, RowSource};
use crate::value::{coerce_str, coerce_value, LogicalType, Value};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct RowDocument {
    columns: Vec<ColumnInfo>,
    #[serde(default)]
    rows: Vec<Vec<serde_json::Value>>,
}

enum Input {
    Path(PathBuf),
    Text(String),
}

/// Source producing the rows of a JSON document, read on `init()`
pub struct JsonSource {
    input: Input,
    schema: Vec<ColumnInfo>,
    rows: std::vec::IntoIter<Row>,
    initialized: bool,
}

impl JsonSource {
    /// Read rows from the file at `path`
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::with_input(Input::Path(path.into()))
    }

    /// Read rows from an in-memory document
    pub fn from_json(text: impl Into<String>) -> Self {
        Self::with_input(Input::Text(text.into()))
    }

    fn with_input(input: Input) -> Self {
        Self {
            input,
            schema: Vec::new(),
            rows: Vec::new().into_iter(),
            initialized: false,
        }
    }

    fn load(&self) -> Result<RowDocument> {
        match &self.input {
            Input::Path(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read rows from {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Invalid row document {}", path.display()))
            }
            Input::Text(text) => serde_json::from_str(text).context("Invalid row document"),
        }
    }
}

/// Convert one JSON cell into a value of the column's type
pub fn cell_value(cell: &serde_json::Value, ty: LogicalType) -> Result<Value> {
    let value = match cell {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => coerce_value(&Value::Boolean(*b), ty),
        serde_json::Value::Number(n) => {
            let raw = match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Double(n.as_f64().unwrap_or_default()),
            };
            coerce_value(&raw, ty)
        }
        serde_json::Value::String(s) => coerce_str(s, ty),
        serde_json::Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| cell_value(item, ty))
                .collect::<Result<_>>()?,
        ),
        serde_json::Value::Object(fields) => match fields.get("merged") {
            Some(serde_json::Value::Array(parts)) => Value::Merged(
                parts
                    .iter()
                    .map(|part| cell_value(part, ty))
                    .collect::<Result<_>>()?,
            ),
            _ => bail!("Unsupported cell {}", cell),
        },
    };
    Ok(value)
}

/// Convert a value back into JSON, the inverse of [`cell_value`].
///
/// Temporal values are written in their canonical text form.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Double(d) => serde_json::Number::from_f64(*d)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Date(_) | Value::Time(_) | Value::Timestamp(_) => {
            serde_json::Value::String(value.to_string())
        }
        Value::Array(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Merged(parts) => serde_json::json!({
            "merged": parts.iter().map(value_to_json).collect::<Vec<_>>()
        }),
    }
}

/// Render a row as a JSON object keyed by column name
pub fn row_to_json(schema: &[ColumnInfo], row: &[Value]) -> serde_json::Value {
    let fields = schema
        .iter()
        .zip(row)
        .map(|(col, cell)| (col.name.clone(), value_to_json(cell)))
        .collect();
    serde_json::Value::Object(fields)
}

impl RowSource for JsonSource {
    fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        let document = self.load()?;
        let width = document.columns.len();
        let mut rows = Vec::with_capacity(document.rows.len());
        for (i, cells) in document.rows.iter().enumerate() {
            if cells.len() != width {
                bail!("Row {} has {} cells, expected {}", i, cells.len(), width);
            }
            let row = cells
                .iter()
                .zip(&document.columns)
                .map(|(cell, col)| cell_value(cell, col.logical_type))
                .collect::<Result<Row>>()
                .with_context(|| format!("Invalid cell in row {}", i))?;
            rows.push(row);
        }

        self.schema = document.columns;
        self.rows = rows.into_iter();
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>> {
        if !self.initialized {
            bail!("Source not initialized. Call init() first.");
        }
        Ok(self.rows.next())
    }

    fn output_schema(&self) -> &[ColumnInfo] {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const DOCUMENT: &str = r#"{
        "columns": [
            {"name": "region"},
            {"name": "amount", "type": "integer"},
            {"name": "day", "type": "date"},
            {"name": "roles", "type": "role"}
        ],
        "rows": [
            ["EU", "42", "2024-01-05", ["admin", "sales"]],
            ["US", 7.9, null, []]
        ]
    }"#;

    #[test]
    fn test_read_in_memory() -> Result<()> {
        let mut source = JsonSource::from_json(DOCUMENT);
        source.init()?;

        assert_eq!(source.output_schema().len(), 4);
        assert_eq!(source.output_schema()[2].logical_type, LogicalType::Date);

        let first = source.next()?.expect("first row");
        assert_eq!(first[0], Value::string("EU"));
        assert_eq!(first[1], Value::Integer(42));
        assert_eq!(
            first[2],
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
        );
        assert_eq!(
            first[3],
            Value::Array(vec![Value::string("admin"), Value::string("sales")])
        );

        let second = source.next()?.expect("second row");
        assert_eq!(second[1], Value::Integer(7));
        assert_eq!(second[2], Value::Null);
        assert!(source.next()?.is_none());
        Ok(())
    }

    #[test]
    fn test_read_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(DOCUMENT.as_bytes())?;

        let mut source = JsonSource::open(file.path());
        assert!(source.next().is_err());
        source.init()?;
        let mut count = 0;
        while source.next()?.is_some() {
            count += 1;
        }
        assert_eq!(count, 2);
        Ok(())
    }

    #[test]
    fn test_errors() {
        let mut short = JsonSource::from_json(r#"{"columns": [{"name": "a"}], "rows": [[]]}"#);
        let err = short.init().unwrap_err();
        assert!(err.to_string().contains("Row 0 has 0 cells"));

        let mut missing = JsonSource::open("/nonexistent/rows.json");
        assert!(missing.init().is_err());

        let mut object = JsonSource::from_json(r#"{"columns": [{"name": "a"}], "rows": [[{"x": 1}]]}"#);
        assert!(object.init().is_err());
    }

    #[test]
    fn test_row_to_json() {
        let schema = vec![
            ColumnInfo::new("day", LogicalType::Date),
            ColumnInfo::new("score", LogicalType::Double),
            ColumnInfo::new("parts", LogicalType::Integer),
        ];
        let row = vec![
            Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
            Value::Double(1.5),
            Value::Merged(vec![Value::Integer(1), Value::Null]),
        ];
        assert_eq!(
            row_to_json(&schema, &row),
            serde_json::json!({
                "day": "2024-03-01",
                "score": 1.5,
                "parts": {"merged": [1, null]}
            })
        );
    }

    #[test]
    fn test_merged_cell() -> Result<()> {
        let cell = serde_json::json!({"merged": [1, 2]});
        assert_eq!(
            cell_value(&cell, LogicalType::Integer)?,
            Value::Merged(vec![Value::Integer(1), Value::Integer(2)])
        );
        Ok(())
    }
}
