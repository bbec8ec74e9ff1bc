use crate::core::dataset::{Dataset, Record};
use serde::{Deserialize, Serialize};

/// Substring predicate on the text form of one column.
///
/// A filter naming a column the dataset does not have is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Row indices (ascending) that pass every filter, in order of application.
pub fn matching_rows(dataset: &Dataset, filters: &[Filter]) -> Vec<usize> {
    let mut rows: Vec<usize> = (0..dataset.row_count()).collect();
    for filter in filters {
        let Some(column) = dataset.column(&filter.column) else {
            continue;
        };
        rows.retain(|&i| {
            column.values[i]
                .to_text()
                .is_some_and(|text| text.contains(filter.value.as_str()))
        });
    }
    rows
}

/// Applies `filters` and renders at most `limit` matching rows.
pub fn execute(dataset: &Dataset, filters: &[Filter], limit: usize) -> Vec<Record> {
    matching_rows(dataset, filters)
        .into_iter()
        .take(limit)
        .map(|i| dataset.record(i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dataset::Column;
    use crate::core::value::{Value, ValueType};

    fn dataset() -> Dataset {
        Dataset::new(vec![
            Column::new(
                "SEX (DISPLAY)",
                ValueType::String,
                vec![
                    Value::String("Male".into()),
                    Value::String("Female".into()),
                    Value::String("Both sexes".into()),
                    Value::Null,
                ],
            ),
            Column::new(
                "YEAR (DISPLAY)",
                ValueType::Int,
                vec![
                    Value::Int(2000),
                    Value::Int(2001),
                    Value::Int(2000),
                    Value::Int(2000),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_substring_is_case_sensitive() {
        let ds = dataset();
        assert_eq!(
            matching_rows(&ds, &[Filter::new("SEX (DISPLAY)", "Male")]),
            vec![0]
        );
        assert_eq!(
            matching_rows(&ds, &[Filter::new("SEX (DISPLAY)", "male")]),
            vec![1]
        );
    }

    #[test]
    fn test_filters_narrow_in_order() {
        let ds = dataset();
        let filters = [
            Filter::new("YEAR (DISPLAY)", "2000"),
            Filter::new("SEX (DISPLAY)", "e"),
        ];
        assert_eq!(matching_rows(&ds, &filters), vec![0, 2]);
    }

    #[test]
    fn test_unknown_column_is_noop() {
        let ds = dataset();
        assert_eq!(
            matching_rows(&ds, &[Filter::new("missing", "zzz")]).len(),
            ds.row_count()
        );
    }

    #[test]
    fn test_nulls_never_match() {
        let ds = dataset();
        let rows = matching_rows(&ds, &[Filter::new("SEX (DISPLAY)", "")]);
        assert_eq!(rows, vec![0, 1, 2]);
    }

    #[test]
    fn test_limit_caps_results() {
        let ds = dataset();
        let records = execute(&ds, &[Filter::new("YEAR (DISPLAY)", "200")], 2);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("YEAR (DISPLAY)"), Some(&Value::Int(2001)));
    }
}
