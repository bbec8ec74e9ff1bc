pub mod csv_connector;

pub use csv_connector::CsvConnector;

use crate::core::dataset::DatasetError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Invalid dataset: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Parse error: {0}")]
    Parse(String),
}
