//! Spike Rating - per-match player performance ratings for tactical shooters
//!
//! This crate computes a composite rating for every player in a match from
//! kill and death impact (win-probability deltas from an XvX table, weighted
//! by economic and timing modifiers), assists per round and armor-adjusted
//! damage per round.

pub mod batch;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod rating;
pub mod reference;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{RatingError, Result};
pub use types::*;

// Re-export key components
pub use batch::{BatchReport, BatchRunner};
pub use rating::{
    ComponentRegistry, MatchContext, PlayerMatchRating, RatingCalculator, RatingComponent,
};
pub use reference::ReferenceData;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
