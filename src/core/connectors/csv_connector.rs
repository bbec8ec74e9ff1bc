use crate::core::connectors::ConnectorError;
use crate::core::dataset::{Column, Dataset};
use crate::core::value::{Value, ValueType};
use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::compute::{cast, concat_batches};
use arrow::csv;
use arrow::datatypes::DataType;
use std::collections::HashSet;
use std::io::Cursor;
use std::sync::Arc;

/// Reads delimited text with a header row into a typed [`Dataset`].
///
/// Column types are inferred from the whole payload: integer, float and
/// boolean columns keep their type; everything else (dates, mixed text)
/// becomes a string column. Empty fields are nulls.
pub struct CsvConnector;

impl CsvConnector {
    pub fn new() -> Self {
        Self
    }

    pub fn name(&self) -> &str {
        "csv"
    }

    /// Upload names must end in `.csv`, matched case-sensitively.
    pub fn can_handle(&self, filename: &str) -> bool {
        filename.ends_with(".csv")
    }

    pub fn read_bytes(&self, bytes: &[u8]) -> Result<Dataset, ConnectorError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(ConnectorError::Parse("CSV payload is empty".to_string()));
        }

        let format = csv::reader::Format::default().with_header(true);
        let (arrow_schema, _) = format.infer_schema(Cursor::new(bytes), None)?;
        if arrow_schema.fields().is_empty() {
            return Err(ConnectorError::Parse("CSV header row is empty".to_string()));
        }

        // Arrow tolerates repeated header names; a dataset does not.
        let mut seen = HashSet::new();
        for field in arrow_schema.fields() {
            if !seen.insert(field.name().as_str()) {
                return Err(ConnectorError::Parse(format!(
                    "Duplicate column name in header: {}",
                    field.name()
                )));
            }
        }

        let arrow_schema_arc = Arc::new(arrow_schema);
        let builder = csv::ReaderBuilder::new(arrow_schema_arc.clone()).with_header(true);
        let csv_reader = builder.build(Cursor::new(bytes))?;

        let mut batches = Vec::new();
        for batch in csv_reader {
            batches.push(batch?);
        }

        let combined_batch = concat_batches(&arrow_schema_arc, batches.iter())?;

        let columns = arrow_schema_arc
            .fields()
            .iter()
            .zip(combined_batch.columns())
            .map(|(field, array)| column_from_array(field.name(), array))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Dataset::new(columns)?)
    }
}

impl Default for CsvConnector {
    fn default() -> Self {
        Self::new()
    }
}

fn downcast<'a, T: 'static>(name: &str, array: &'a dyn Array) -> Result<&'a T, ConnectorError> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        ConnectorError::Parse(format!(
            "Column '{}' has unexpected array type {}",
            name,
            array.data_type()
        ))
    })
}

fn collect_values<A, F>(array: &A, f: F) -> Vec<Value>
where
    A: Array,
    F: Fn(usize) -> Value,
{
    (0..array.len())
        .map(|i| if array.is_null(i) { Value::Null } else { f(i) })
        .collect()
}

fn column_from_array(name: &str, array: &ArrayRef) -> Result<Column, ConnectorError> {
    let column = match array.data_type() {
        DataType::Int64 => {
            let a = downcast::<Int64Array>(name, array.as_ref())?;
            Column::new(name, ValueType::Int, collect_values(a, |i| Value::Int(a.value(i))))
        }
        DataType::Float64 => {
            let a = downcast::<Float64Array>(name, array.as_ref())?;
            Column::new(name, ValueType::Float, collect_values(a, |i| Value::Float(a.value(i))))
        }
        DataType::Boolean => {
            let a = downcast::<BooleanArray>(name, array.as_ref())?;
            Column::new(name, ValueType::Bool, collect_values(a, |i| Value::Bool(a.value(i))))
        }
        DataType::Utf8 => {
            let a = downcast::<StringArray>(name, array.as_ref())?;
            Column::new(
                name,
                ValueType::String,
                collect_values(a, |i| Value::String(a.value(i).to_string())),
            )
        }
        // Dates, timestamps and all-null columns are kept as text
        _ => {
            let text = cast(array.as_ref(), &DataType::Utf8)?;
            return column_from_array(name, &text);
        }
    };
    Ok(column)
}
