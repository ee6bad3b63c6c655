//! Built-in rating components
//!
//! KillContrib and DeathContrib read the priced kills from the match
//! timeline. APR and ADRa are per-round rates; ADRa takes its kills from the
//! same timeline so both agree on which kills happened.

use crate::error::{RatingError, Result};
use crate::rating::context::MatchContext;
use crate::rating::registry::RatingComponent;
use crate::rating::timeline::{KillImpact, MatchTimeline};
use crate::types::{ArmorTier, Player};

pub const KILL_CONTRIB: &str = "KillContrib";
pub const DEATH_CONTRIB: &str = "DeathContrib";
pub const APR: &str = "APR";
pub const ADRA: &str = "ADRa";

/// Built-in components in their canonical order
pub const BUILTIN_COMPONENTS: [&str; 4] = [KILL_CONTRIB, DEATH_CONTRIB, APR, ADRA];

fn rounds_played(player_id: &str, rounds: u32) -> Result<f64> {
    if rounds == 0 {
        return Err(RatingError::ZeroRoundsPlayed {
            player_id: player_id.to_string(),
        });
    }
    Ok(f64::from(rounds))
}

/// Assists per round
pub fn apr(player_id: &str, assists: u32, rounds: u32) -> Result<f64> {
    Ok(f64::from(assists) / rounds_played(player_id, rounds)?)
}

/// Armor-adjusted damage per round
///
/// Damage spent on securing kills (the victim's health plus armor) is taken
/// out before dividing by rounds. The result is floored at zero.
pub fn adra(
    player_id: &str,
    total_damage: f64,
    victim_armor: impl IntoIterator<Item = ArmorTier>,
    rounds: u32,
) -> Result<f64> {
    let rounds = rounds_played(player_id, rounds)?;
    let expected: f64 = victim_armor
        .into_iter()
        .map(ArmorTier::expected_kill_damage)
        .sum();
    Ok(((total_damage - expected) / rounds).max(0.0))
}

/// Sum of positive impact over the player's kills
pub fn kill_contrib(player_id: &str, timeline: &MatchTimeline) -> Result<f64> {
    timeline
        .kills_by(player_id)
        .map(|kill| kill.impact.as_ref().map(KillImpact::kill_contribution))
        .map(|r| r.map_err(Clone::clone))
        .sum()
}

/// Sum of negative impact over the player's deaths
pub fn death_contrib(player_id: &str, timeline: &MatchTimeline) -> Result<f64> {
    timeline
        .deaths_of(player_id)
        .map(|kill| kill.impact.as_ref().map(KillImpact::death_contribution))
        .map(|r| r.map_err(Clone::clone))
        .sum()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KillContribComponent;

impl RatingComponent for KillContribComponent {
    fn compute(&self, player: &Player, ctx: &MatchContext<'_>) -> Result<f64> {
        kill_contrib(&player.id, &ctx.timeline)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeathContribComponent;

impl RatingComponent for DeathContribComponent {
    fn compute(&self, player: &Player, ctx: &MatchContext<'_>) -> Result<f64> {
        death_contrib(&player.id, &ctx.timeline)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AprComponent;

impl RatingComponent for AprComponent {
    fn compute(&self, player: &Player, ctx: &MatchContext<'_>) -> Result<f64> {
        let assists = player
            .stats
            .assists
            .ok_or_else(|| RatingError::InvalidInput {
                match_id: ctx.match_data.id.clone(),
                reason: format!("player {} has no assist count", player.id),
            })?;
        apr(&player.id, assists, player.stats.rounds_played)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AdraComponent;

impl RatingComponent for AdraComponent {
    fn compute(&self, player: &Player, ctx: &MatchContext<'_>) -> Result<f64> {
        let armor = ctx.timeline.kills_by(&player.id).map(|kill| kill.victim_armor);
        adra(
            &player.id,
            ctx.total_damage(&player.id),
            armor,
            player.stats.rounds_played,
        )
    }
}
