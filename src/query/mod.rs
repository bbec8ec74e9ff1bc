pub mod filter;

pub use filter::{execute, matching_rows, Filter};
