//! Batch rating
//!
//! Fans rating work out across matches and gathers the report.

pub mod report;
pub mod runner;

pub use report::{BatchReport, DataQualitySummary};
pub use runner::BatchRunner;
