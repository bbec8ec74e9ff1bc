// src/lib.rs

pub mod core;
pub mod logging;
pub mod query;
pub mod server;

pub use crate::core::config::ServiceConfig;
pub use crate::core::dataset::stats::{summarize, SummaryOptions};
pub use crate::core::dataset::{Column, Dataset, Record, SchemaInfo, SummaryResult};
pub use crate::core::error::DataError;
pub use crate::core::store::DatasetStore;
pub use crate::core::value::{Value, ValueType};
pub use query::Filter;
pub use server::jobs::{Job, JobRegistry, JobStatus, JobUpdate};
pub use server::scheduler::JobScheduler;
pub use server::{router, start_server, AppState};
