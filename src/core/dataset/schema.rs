use crate::core::dataset::record::{OrderedMap, Record};
use crate::core::value::ValueType;
use serde::Serialize;

/// Metadata about a single column in a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSchema {
    pub name: String,
    pub value_type: ValueType,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
        }
    }
}

/// Defines the structure of a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct DatasetSchema {
    pub columns: Vec<ColumnSchema>,
}

impl DatasetSchema {
    pub fn new(columns: Vec<ColumnSchema>) -> Self {
        Self { columns }
    }

    pub fn get_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// `column -> type tag`, in schema order
    pub fn dtypes(&self) -> OrderedMap<String> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.value_type.tag().to_string()))
            .collect()
    }
}

/// Schema introspection result for the loaded dataset.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaInfo {
    pub columns: Vec<String>,
    pub dtypes: OrderedMap<String>,
    pub shape: (usize, usize),
    pub sample_data: Vec<Record>,
}
