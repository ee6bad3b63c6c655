//! Data-quality signals raised while replaying a match

use crate::reference::AliveState;
use crate::types::{EconomyCategory, PlayerId};
use serde::Serialize;

/// Something in the input or reference data that had to be resolved by policy
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityIssue {
    /// Alive counts fell outside the XvX table and were clamped
    XvxClamped {
        round: u32,
        requested: AliveState,
        resolved: AliveState,
        spike_planted: bool,
    },
    /// XvX state missing inside the table, resolved to 0.5
    XvxFallback {
        round: u32,
        state: AliveState,
        spike_planted: bool,
    },
    /// Economic matchup missing, resolved to a neutral modifier
    EconomicFallback {
        round: u32,
        killer: EconomyCategory,
        victim: EconomyCategory,
    },
    /// No loadout for a player, treated as zero credits
    MissingLoadout { round: u32, player_id: PlayerId },
    /// Kill event that could not be placed in the round state
    SkippedKill {
        round: u32,
        killer: PlayerId,
        victim: PlayerId,
        reason: String,
    },
}

impl DataQualityIssue {
    pub fn kind(&self) -> &'static str {
        match self {
            DataQualityIssue::XvxClamped { .. } => "xvx_clamped",
            DataQualityIssue::XvxFallback { .. } => "xvx_fallback",
            DataQualityIssue::EconomicFallback { .. } => "economic_fallback",
            DataQualityIssue::MissingLoadout { .. } => "missing_loadout",
            DataQualityIssue::SkippedKill { .. } => "skipped_kill",
        }
    }
}

impl std::fmt::Display for DataQualityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataQualityIssue::XvxClamped {
                round,
                requested,
                resolved,
                spike_planted,
            } => write!(
                f,
                "round {}: XvX state {} outside table coverage, clamped to {} (spike planted: {})",
                round, requested, resolved, spike_planted
            ),
            DataQualityIssue::XvxFallback {
                round,
                state,
                spike_planted,
            } => write!(
                f,
                "round {}: no XvX entry for {} (spike planted: {}), using 0.5",
                round, state, spike_planted
            ),
            DataQualityIssue::EconomicFallback {
                round,
                killer,
                victim,
            } => write!(
                f,
                "round {}: no economic win rate for {} vs {}, using neutral modifier",
                round, killer, victim
            ),
            DataQualityIssue::MissingLoadout { round, player_id } => write!(
                f,
                "round {}: no loadout for player {}, assuming zero credits",
                round, player_id
            ),
            DataQualityIssue::SkippedKill {
                round,
                killer,
                victim,
                reason,
            } => write!(
                f,
                "round {}: skipped kill {} -> {}: {}",
                round, killer, victim, reason
            ),
        }
    }
}
