//! Descriptive summaries over a dataset snapshot.
//!
//! Everything here is a pure function of the `Dataset` it is given; the
//! background job owns the snapshot and decides what to do with failures.

use crate::core::dataset::record::{OrderedMap, Record};
use crate::core::dataset::{Column, Dataset};
use crate::core::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Field that carries the frequency in a distribution entry.
const COUNT_FIELD: &str = "count";

/// Field that labels each row of the numeric description.
const STATISTIC_FIELD: &str = "statistic";

/// Bounds on how much of the dataset the summary looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryOptions {
    /// Only the first N columns (schema order) get a value distribution.
    pub distribution_columns: usize,
    /// Most frequent values kept per distribution.
    pub top_values: usize,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            distribution_columns: 5,
            top_values: 10,
        }
    }
}

/// Composite output of a summarization job.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryResult {
    pub basic_statistics: BasicStatistics,
    pub missing_values: OrderedMap<MissingValues>,
    pub distributions: OrderedMap<Distribution>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BasicStatistics {
    /// One row per statistic: `{"statistic": "mean", "<col>": 1.5, ...}`
    Described(Vec<Record>),
    NoNumericColumns { message: String },
    Failed { error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MissingValues {
    pub null_count: usize,
    pub null_percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Distribution {
    /// `{"<col>": value, "count": n}` entries, most frequent first
    Values(Vec<Record>),
    Failed { error: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DistributionError {
    #[error("column name '{0}' collides with the count field")]
    CountFieldCollision(String),
}

/// Descriptive statistics for one numeric column. `None` where the
/// statistic is undefined for the available values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStatistics {
    pub count: usize,
    pub null_count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnStatistics {
    pub fn compute(column: &Column) -> Self {
        let mut values: Vec<f64> = column.values.iter().filter_map(Value::as_float).collect();
        let null_count = column.null_count();
        let count = values.len();
        if count == 0 {
            return Self {
                count,
                null_count,
                mean: None,
                std: None,
                min: None,
                q25: None,
                median: None,
                q75: None,
                max: None,
            };
        }

        values.sort_by(|a, b| a.total_cmp(b));
        let n = count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = if count > 1 {
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
            Some(var.sqrt())
        } else {
            None
        };

        Self {
            count,
            null_count,
            mean: Some(mean),
            std,
            min: values.first().copied(),
            q25: Some(nearest_quantile(&values, 0.25)),
            median: Some(nearest_quantile(&values, 0.5)),
            q75: Some(nearest_quantile(&values, 0.75)),
            max: values.last().copied(),
        }
    }

    fn rows(&self) -> [(&'static str, Option<f64>); 9] {
        [
            ("count", Some(self.count as f64)),
            ("null_count", Some(self.null_count as f64)),
            ("mean", self.mean),
            ("std", self.std),
            ("min", self.min),
            ("25%", self.q25),
            ("50%", self.median),
            ("75%", self.q75),
            ("max", self.max),
        ]
    }
}

/// `sorted` must be non-empty and ascending.
fn nearest_quantile(sorted: &[f64], q: f64) -> f64 {
    let idx = ((sorted.len() - 1) as f64 * q).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Runs all three sub-summaries over `dataset`.
pub fn summarize(dataset: &Dataset, options: &SummaryOptions) -> SummaryResult {
    SummaryResult {
        basic_statistics: basic_statistics(dataset),
        missing_values: missing_values(dataset),
        distributions: distributions(dataset, options),
    }
}

pub fn basic_statistics(dataset: &Dataset) -> BasicStatistics {
    let numeric: Vec<(&str, ColumnStatistics)> = dataset
        .columns()
        .iter()
        .filter(|c| c.value_type.is_numeric())
        .map(|c| (c.name.as_str(), ColumnStatistics::compute(c)))
        .collect();

    if numeric.is_empty() {
        return BasicStatistics::NoNumericColumns {
            message: "No numeric columns found".to_string(),
        };
    }

    // A numeric column named like the label would overwrite it in every row.
    if numeric.iter().any(|(name, _)| *name == STATISTIC_FIELD) {
        tracing::warn!(
            column = STATISTIC_FIELD,
            "numeric column collides with the statistic label"
        );
        return BasicStatistics::Failed {
            error: format!(
                "Could not compute statistics: column name '{}' is reserved",
                STATISTIC_FIELD
            ),
        };
    }

    let per_column: Vec<_> = numeric.iter().map(|(_, s)| s.rows()).collect();
    let rows = (0..9)
        .map(|i| {
            let mut row = Record::with_capacity(numeric.len() + 1);
            row.insert(STATISTIC_FIELD, Value::String(per_column[0][i].0.to_string()));
            for ((name, _), stats) in numeric.iter().zip(&per_column) {
                let cell = stats[i].1.map(Value::Float).unwrap_or(Value::Null);
                row.insert(*name, cell);
            }
            row
        })
        .collect();

    BasicStatistics::Described(rows)
}

pub fn missing_values(dataset: &Dataset) -> OrderedMap<MissingValues> {
    let rows = dataset.row_count();
    dataset
        .columns()
        .iter()
        .map(|c| {
            let null_count = c.null_count();
            let null_percentage = if rows == 0 {
                0.0
            } else {
                null_count as f64 / rows as f64 * 100.0
            };
            (
                c.name.clone(),
                MissingValues {
                    null_count,
                    null_percentage,
                },
            )
        })
        .collect()
}

pub fn distributions(dataset: &Dataset, options: &SummaryOptions) -> OrderedMap<Distribution> {
    dataset
        .columns()
        .iter()
        .take(options.distribution_columns)
        .map(|c| {
            let dist = match value_counts(c, options.top_values) {
                Ok(entries) => Distribution::Values(entries),
                Err(e) => {
                    tracing::warn!(column = %c.name, error = %e, "distribution failed");
                    Distribution::Failed {
                        error: "Could not compute distribution".to_string(),
                    }
                }
            };
            (c.name.clone(), dist)
        })
        .collect()
}

/// Hashable identity of a cell, floats compared bitwise.
#[derive(Debug, PartialEq, Eq, Hash)]
enum ValueKey<'a> {
    Int(i64),
    Float(u64),
    Str(&'a str),
    Bool(bool),
    Null,
}

impl<'a> From<&'a Value> for ValueKey<'a> {
    fn from(v: &'a Value) -> Self {
        match v {
            Value::Int(i) => ValueKey::Int(*i),
            Value::Float(f) => ValueKey::Float(f.to_bits()),
            Value::String(s) => ValueKey::Str(s),
            Value::Bool(b) => ValueKey::Bool(*b),
            Value::Null => ValueKey::Null,
        }
    }
}

/// Top `limit` values by frequency; ties keep first-appearance order.
pub fn value_counts(column: &Column, limit: usize) -> Result<Vec<Record>, DistributionError> {
    if column.name == COUNT_FIELD {
        return Err(DistributionError::CountFieldCollision(column.name.clone()));
    }

    // (first row index, count) per distinct value
    let mut counts: HashMap<ValueKey<'_>, (usize, usize)> = HashMap::new();
    for (i, v) in column.values.iter().enumerate() {
        counts.entry(ValueKey::from(v)).or_insert((i, 0)).1 += 1;
    }

    let mut ranked: Vec<(usize, usize)> = counts.into_values().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    Ok(ranked
        .into_iter()
        .take(limit)
        .map(|(first, count)| {
            let mut entry = Record::with_capacity(2);
            entry.insert(column.name.clone(), column.values[first].clone());
            entry.insert(COUNT_FIELD, Value::Int(count as i64));
            entry
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::ValueType;

    fn sample() -> Dataset {
        Dataset::new(vec![
            Column::new(
                "SEX (DISPLAY)",
                ValueType::String,
                vec![
                    Value::String("Male".into()),
                    Value::String("Female".into()),
                    Value::String("Male".into()),
                    Value::Null,
                ],
            ),
            Column::new(
                "Numeric",
                ValueType::Float,
                vec![
                    Value::Float(1.0),
                    Value::Float(2.0),
                    Value::Float(3.0),
                    Value::Float(4.0),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_column_statistics() {
        let ds = sample();
        let stats = ColumnStatistics::compute(ds.column("Numeric").unwrap());
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean, Some(2.5));
        // sample variance = 5 / 3
        assert!((stats.std.unwrap() - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.median, Some(3.0));
        assert_eq!(stats.max, Some(4.0));
    }

    #[test]
    fn test_basic_statistics_rows() {
        let BasicStatistics::Described(rows) = basic_statistics(&sample()) else {
            panic!("expected numeric statistics");
        };
        assert_eq!(rows.len(), 9);
        assert_eq!(rows[0].get("statistic"), Some(&Value::String("count".into())));
        assert_eq!(rows[0].get("Numeric"), Some(&Value::Float(4.0)));
        // string columns are not described
        assert!(rows[0].get("SEX (DISPLAY)").is_none());
    }

    #[test]
    fn test_no_numeric_columns_marker() {
        let ds = Dataset::new(vec![Column::new(
            "name",
            ValueType::String,
            vec![Value::String("a".into())],
        )])
        .unwrap();
        let json = serde_json::to_value(basic_statistics(&ds)).unwrap();
        assert_eq!(json["message"], "No numeric columns found");
    }

    #[test]
    fn test_statistic_column_name_is_reported() {
        let ds = Dataset::new(vec![
            Column::new("statistic", ValueType::Int, vec![Value::Int(1), Value::Int(3)]),
            Column::new("v", ValueType::Int, vec![Value::Int(2), Value::Int(4)]),
        ])
        .unwrap();

        let json = serde_json::to_value(basic_statistics(&ds)).unwrap();
        assert!(json["error"].as_str().unwrap().contains("'statistic'"));

        // a string column with that name is not described, so no clash
        let ds = Dataset::new(vec![
            Column::new("statistic", ValueType::String, vec![Value::String("a".into())]),
            Column::new("v", ValueType::Int, vec![Value::Int(2)]),
        ])
        .unwrap();
        let BasicStatistics::Described(rows) = basic_statistics(&ds) else {
            panic!("expected numeric statistics");
        };
        assert_eq!(rows[0].get("statistic"), Some(&Value::String("count".into())));
    }

    #[test]
    fn test_missing_values_every_column() {
        let report = missing_values(&sample());
        assert_eq!(report.len(), 2);
        let sex = report.get("SEX (DISPLAY)").unwrap();
        assert_eq!(sex.null_count, 1);
        assert_eq!(sex.null_percentage, 25.0);
        assert_eq!(report.get("Numeric").unwrap().null_count, 0);
    }

    #[test]
    fn test_missing_values_empty_dataset() {
        let ds = Dataset::new(vec![Column::new("a", ValueType::String, vec![])]).unwrap();
        assert_eq!(missing_values(&ds).get("a").unwrap().null_percentage, 0.0);
    }

    #[test]
    fn test_value_counts_ranked() {
        let ds = sample();
        let counts = value_counts(ds.column("SEX (DISPLAY)").unwrap(), 10).unwrap();
        assert_eq!(counts.len(), 3);
        assert_eq!(
            counts[0].get("SEX (DISPLAY)"),
            Some(&Value::String("Male".into()))
        );
        assert_eq!(counts[0].get("count"), Some(&Value::Int(2)));
        // tie between Female and null resolved by first appearance
        assert_eq!(
            counts[1].get("SEX (DISPLAY)"),
            Some(&Value::String("Female".into()))
        );
        assert_eq!(counts[2].get("SEX (DISPLAY)"), Some(&Value::Null));
    }

    #[test]
    fn test_distributions_limited_and_isolated() {
        let mut columns: Vec<Column> = (0..7)
            .map(|i| Column::new(format!("c{}", i), ValueType::Int, vec![Value::Int(i)]))
            .collect();
        columns[1].name = "count".to_string();
        let ds = Dataset::new(columns).unwrap();

        let dists = distributions(&ds, &SummaryOptions::default());
        assert_eq!(dists.len(), 5);
        assert!(matches!(dists.get("count"), Some(Distribution::Failed { .. })));
        assert!(matches!(dists.get("c0"), Some(Distribution::Values(v)) if v.len() == 1));
        assert!(dists.get("c5").is_none());
    }
}
