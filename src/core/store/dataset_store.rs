use crate::core::connectors::CsvConnector;
use crate::core::dataset::{Dataset, Record, SchemaInfo};
use crate::core::error::DataError;
use crate::query::{self, Filter};
use std::sync::{Arc, PoisonError, RwLock};

/// Holds at most one dataset.
///
/// Loading builds a complete new `Dataset` before taking the write lock and
/// then swaps the `Arc` in one step, so readers see either the old or the new
/// dataset and never a mix. Readers clone the `Arc` and release the lock
/// before doing any work on it.
pub struct DatasetStore {
    current: RwLock<Option<Arc<Dataset>>>,
    connector: CsvConnector,
    sample_rows: usize,
}

impl Default for DatasetStore {
    fn default() -> Self {
        Self::new(5)
    }
}

impl DatasetStore {
    pub fn new(sample_rows: usize) -> Self {
        Self {
            current: RwLock::new(None),
            connector: CsvConnector::new(),
            sample_rows,
        }
    }

    /// Parses `raw` as CSV and replaces the held dataset. Returns (rows, columns).
    ///
    /// Parsing is CPU-bound; async callers run this on a blocking worker.
    pub fn load(&self, raw: &[u8]) -> Result<(usize, usize), DataError> {
        let dataset = self
            .connector
            .read_bytes(raw)
            .map_err(|e| DataError::Parse(e.to_string()))?;
        let shape = dataset.shape();
        self.replace(dataset);
        tracing::info!(rows = shape.0, columns = shape.1, "dataset loaded");
        Ok(shape)
    }

    /// Installs an already-built dataset.
    pub fn replace(&self, dataset: Dataset) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(Arc::new(dataset));
    }

    /// The dataset held right now, as a shared immutable snapshot.
    pub fn snapshot(&self) -> Result<Arc<Dataset>, DataError> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(DataError::NoDataLoaded)
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot().is_ok()
    }

    pub fn schema(&self) -> Result<SchemaInfo, DataError> {
        let dataset = self.snapshot()?;
        let schema = dataset.schema();
        Ok(SchemaInfo {
            columns: schema.column_names(),
            dtypes: schema.dtypes(),
            shape: dataset.shape(),
            sample_data: dataset.head(self.sample_rows),
        })
    }

    pub fn query(&self, filters: &[Filter], limit: usize) -> Result<Vec<Record>, DataError> {
        let dataset = self.snapshot()?;
        Ok(query::execute(&dataset, filters, limit))
    }
}
