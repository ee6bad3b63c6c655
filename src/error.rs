//! Error types for the rating pipeline
//!
//! Core calculations return [`RatingError`] so that callers can tell a bad
//! input record apart from a reference-table miss or a broken configuration.
//! Loading and the binary wrap these in `anyhow` with context.

use crate::types::{EconomyCategory, MatchId, PlayerId};

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, RatingError>;

/// Error kinds produced while computing a single player-match rating
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RatingError {
    #[error("Invalid input for match {match_id}: {reason}")]
    InvalidInput { match_id: MatchId, reason: String },

    #[error("Match {match_id} appears more than once in the batch")]
    DuplicateMatch { match_id: MatchId },

    #[error("Player {player_id} has zero rounds played")]
    ZeroRoundsPlayed { player_id: PlayerId },

    #[error("Player not found: {player_id}")]
    PlayerNotFound { player_id: PlayerId },

    #[error(
        "No XvX entry for {attackers}v{defenders} (spike planted: {spike_planted})"
    )]
    XvxLookupMiss {
        attackers: u8,
        defenders: u8,
        spike_planted: bool,
    },

    #[error("No economic win rate for matchup {killer} vs {victim}")]
    EconomicLookupMiss {
        killer: EconomyCategory,
        victim: EconomyCategory,
    },

    #[error("Standard deviation for component {component} is zero")]
    ZeroStandardDeviation { component: String },

    #[error("Component not found: {name}")]
    ComponentNotFound { name: String },

    #[error("Component {name} failed: {reason}")]
    ComponentFailed { name: String, reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Reference data error: {message}")]
    ReferenceData { message: String },
}

impl RatingError {
    /// Short machine-readable label, used for metrics and failure reports
    pub fn kind(&self) -> &'static str {
        match self {
            RatingError::InvalidInput { .. } => "invalid_input",
            RatingError::DuplicateMatch { .. } => "duplicate_match",
            RatingError::ZeroRoundsPlayed { .. } => "zero_rounds_played",
            RatingError::PlayerNotFound { .. } => "player_not_found",
            RatingError::XvxLookupMiss { .. } => "xvx_lookup_miss",
            RatingError::EconomicLookupMiss { .. } => "economic_lookup_miss",
            RatingError::ZeroStandardDeviation { .. } => "zero_standard_deviation",
            RatingError::ComponentNotFound { .. } => "component_not_found",
            RatingError::ComponentFailed { .. } => "component_failed",
            RatingError::ConfigurationError { .. } => "configuration_error",
            RatingError::ReferenceData { .. } => "reference_data",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RatingError::XvxLookupMiss {
            attackers: 3,
            defenders: 2,
            spike_planted: true,
        };
        assert_eq!(
            err.to_string(),
            "No XvX entry for 3v2 (spike planted: true)"
        );

        let err = RatingError::EconomicLookupMiss {
            killer: EconomyCategory::Eco,
            victim: EconomyCategory::FullBuy,
        };
        assert_eq!(
            err.to_string(),
            "No economic win rate for matchup Eco Round vs Full Buy"
        );
    }

    #[test]
    fn test_error_kinds_are_distinct() {
        let zero_std = RatingError::ZeroStandardDeviation {
            component: "APR".to_string(),
        };
        let zero_rounds = RatingError::ZeroRoundsPlayed {
            player_id: "p1".to_string(),
        };
        assert_eq!(zero_std.kind(), "zero_standard_deviation");
        assert_ne!(zero_std.kind(), zero_rounds.kind());
    }
}
