use crate::core::job_status::JobStatus;
use thiserror::Error;

/// Failures surfaced by the dataset store, job registry and summarization engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("No data loaded")]
    NoDataLoaded,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Invalid job transition from {from} to {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
}
