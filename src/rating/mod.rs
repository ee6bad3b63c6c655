//! Rating pipeline
//!
//! Component computation, round replay, aggregation and per-match
//! orchestration.

pub mod aggregator;
pub mod calculator;
pub mod components;
pub mod context;
pub mod damage;
pub mod quality;
pub mod registry;
pub mod timeline;

// Re-export commonly used types
pub use aggregator::{weighted_sum, RatingAggregator, RatingBreakdown};
pub use calculator::{MatchRatings, PlayerMatchRating, RatingCalculator, RatingFailure};
pub use components::{
    adra, apr, death_contrib, kill_contrib, ADRA, APR, BUILTIN_COMPONENTS, DEATH_CONTRIB,
    KILL_CONTRIB,
};
pub use context::MatchContext;
pub use damage::extract_damage;
pub use quality::DataQualityIssue;
pub use registry::{ComponentRegistry, RatingComponent};
pub use timeline::{replay_match, KillImpact, MatchTimeline, ScoredKill, SideResolver};
