use std::collections::HashSet;
use thiserror::Error;

use crate::core::value::{Value, ValueType};

pub mod record;
pub mod schema;
pub mod stats;

pub use record::{OrderedMap, Record};
pub use schema::{ColumnSchema, DatasetSchema, SchemaInfo};
pub use stats::{summarize, SummaryResult};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatasetError {
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("Column '{name}' has {actual} rows, expected {expected}")]
    RaggedColumn {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// A single typed column. Every non-null value matches `value_type`.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub value_type: ValueType,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, value_type: ValueType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            value_type,
            values,
        }
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }
}

/// Immutable, column-oriented table. Once built it is only ever shared
/// behind an `Arc`; replacing data means building a new `Dataset`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    /// Builds a dataset, enforcing unique column names and equal column lengths.
    pub fn new(columns: Vec<Column>) -> Result<Self, DatasetError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(DatasetError::DuplicateColumn(col.name.clone()));
            }
        }

        let row_count = columns.first().map(|c| c.values.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.values.len() != row_count) {
            return Err(DatasetError::RaggedColumn {
                name: bad.name.clone(),
                expected: row_count,
                actual: bad.values.len(),
            });
        }

        Ok(Self { columns, row_count })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count, self.columns.len())
    }

    pub fn schema(&self) -> DatasetSchema {
        DatasetSchema::new(
            self.columns
                .iter()
                .map(|c| ColumnSchema::new(c.name.clone(), c.value_type))
                .collect(),
        )
    }

    /// Renders row `row` as an ordered record. Panics if out of bounds.
    pub fn record(&self, row: usize) -> Record {
        let mut record = Record::with_capacity(self.columns.len());
        for col in &self.columns {
            record.insert(col.name.clone(), col.values[row].clone());
        }
        record
    }

    /// First `n` rows as records.
    pub fn head(&self, n: usize) -> Vec<Record> {
        (0..n.min(self.row_count)).map(|i| self.record(i)).collect()
    }
}
