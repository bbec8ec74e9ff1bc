pub mod config;
pub mod connectors;
pub mod dataset;
pub mod error;
pub mod job_status;
pub mod store;
pub mod value;
