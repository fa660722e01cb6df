//! Repository discovery against the hosting platform's search API.
//!
//! A run issues paged searches for a rotating keyword template list,
//! normalizes the results and merges them into the catalog. See
//! [`runner::CollectorRunner`] for the run lifecycle.

mod github;
mod rate_limit;
mod runner;
mod types;

pub use github::GithubSource;
pub use rate_limit::RequestPacer;
pub use runner::{read_discovery_log, CollectorRunner, RunError};
pub use types::*;
