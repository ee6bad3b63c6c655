//! Per-match rating calculation
//!
//! Builds the match context once and rates every non-observer player in it.
//! A failure for one player never affects the others.

use crate::config::rating::RatingConfig;
use crate::error::{RatingError, Result};
use crate::rating::aggregator::{RatingAggregator, RatingBreakdown};
use crate::rating::context::MatchContext;
use crate::rating::quality::DataQualityIssue;
use crate::rating::registry::ComponentRegistry;
use crate::reference::ReferenceData;
use crate::types::{Match, MatchId, Player, PlayerId, PlayerMatchKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Rating of one player in one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMatchRating {
    pub player_id: PlayerId,
    pub match_id: MatchId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_line: Option<String>,
    #[serde(flatten)]
    pub breakdown: RatingBreakdown,
}

impl PlayerMatchRating {
    pub fn key(&self) -> PlayerMatchKey {
        PlayerMatchKey::new(self.player_id.clone(), self.match_id.clone())
    }
}

/// A player-match (or a whole match) that could not be rated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingFailure {
    /// Absent when the match as a whole was rejected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
    pub match_id: MatchId,
    pub kind: String,
    pub error: String,
}

impl RatingFailure {
    pub fn new(player_id: Option<PlayerId>, match_id: impl Into<MatchId>, err: &RatingError) -> Self {
        Self {
            player_id,
            match_id: match_id.into(),
            kind: err.kind().to_string(),
            error: err.to_string(),
        }
    }
}

/// Everything produced while rating one match
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchRatings {
    pub match_id: MatchId,
    pub ratings: Vec<PlayerMatchRating>,
    pub failures: Vec<RatingFailure>,
    pub issues: Vec<DataQualityIssue>,
}

/// Rates players using a component registry and a fixed configuration
#[derive(Debug, Clone)]
pub struct RatingCalculator {
    registry: ComponentRegistry,
    config: RatingConfig,
}

impl RatingCalculator {
    /// Validates the configuration and that every selected component is registered
    pub fn new(registry: ComponentRegistry, config: RatingConfig) -> Result<Self> {
        config.validate()?;
        registry.ensure_registered(&config.components)?;
        Ok(Self { registry, config })
    }

    /// Calculator over the four built-in components
    pub fn with_builtins(config: RatingConfig) -> Result<Self> {
        Self::new(ComponentRegistry::with_builtins(), config)
    }

    pub fn config(&self) -> &RatingConfig {
        &self.config
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Rate `player` within an already built context
    pub fn rate_player(&self, player: &Player, ctx: &MatchContext<'_>) -> Result<PlayerMatchRating> {
        let raw = self
            .registry
            .compute_all(&self.config.components, player, ctx)?;
        let breakdown = RatingAggregator::new(&self.config).aggregate(raw)?;

        debug!(
            "Rated player {} in match {}: {:.4}",
            player.id, ctx.match_data.id, breakdown.rating
        );

        Ok(PlayerMatchRating {
            player_id: player.id.clone(),
            match_id: ctx.match_data.id.clone(),
            name: player.name.clone(),
            tag_line: player.tag_line.clone(),
            breakdown,
        })
    }

    /// Rate a single player of `match_data` by id
    pub fn rate_player_in_match(
        &self,
        player_id: &str,
        match_data: &Match,
        reference: &ReferenceData,
    ) -> Result<PlayerMatchRating> {
        let player = match_data
            .rated_players()
            .find(|p| p.id == player_id)
            .ok_or_else(|| RatingError::PlayerNotFound {
                player_id: player_id.to_string(),
            })?;
        let ctx = MatchContext::build(match_data, reference, &self.config.impact)?;
        self.rate_player(player, &ctx)
    }

    /// Rate every non-observer player in `match_data`
    pub fn rate_match(&self, match_data: &Match, reference: &ReferenceData) -> MatchRatings {
        let mut outcome = MatchRatings {
            match_id: match_data.id.clone(),
            ..MatchRatings::default()
        };

        let ctx = match MatchContext::build(match_data, reference, &self.config.impact) {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!("Skipping match {}: {}", match_data.id, e);
                outcome
                    .failures
                    .push(RatingFailure::new(None, match_data.id.clone(), &e));
                return outcome;
            }
        };

        for player in match_data.rated_players() {
            match self.rate_player(player, &ctx) {
                Ok(rating) => outcome.ratings.push(rating),
                Err(e) => {
                    warn!(
                        "Failed to rate player {} in match {}: {}",
                        player.id, match_data.id, e
                    );
                    outcome.failures.push(RatingFailure::new(
                        Some(player.id.clone()),
                        match_data.id.clone(),
                        &e,
                    ));
                }
            }
        }

        outcome.issues = ctx.timeline.issues;
        outcome
    }
}
