//! Match input
//!
//! JSON match records and the concurrent file loader.

pub mod loader;
pub mod records;

pub use loader::{discover_inputs, load_matches, parse_matches, LoadFailure, LoadReport};
pub use records::MatchRecord;
