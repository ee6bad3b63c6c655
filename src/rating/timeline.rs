//! Round replay
//!
//! Walks every round's kill feed in time order, tracks how many players are
//! alive on each side and prices each enemy kill against the XvX and
//! economic tables. The result is computed once per match and shared by the
//! KillContrib and DeathContrib components.

use crate::config::rating::{EconomyBasis, ImpactSettings};
use crate::error::{RatingError, Result};
use crate::rating::quality::DataQualityIssue;
use crate::reference::{categorize_credits, AliveState, ReferenceData, XvxLookup};
use crate::types::{
    ArmorTier, EconomyCategory, KillEvent, Match, PlayerId, Round, RoundResultCode, Side, TeamId,
};
use tracing::{debug, warn};

/// Rounds per regulation half
pub const HALF_LENGTH: u32 = 12;
const OVERTIME_START: u32 = 2 * HALF_LENGTH;

/// Priced impact of one enemy kill
#[derive(Debug, Clone, PartialEq)]
pub struct KillImpact {
    pub before: AliveState,
    pub after: AliveState,
    pub spike_planted: bool,
    pub killer_side: Side,
    /// Killer side's win probability before the kill
    pub killer_before: f64,
    /// Killer side's win probability after the kill
    pub killer_after: f64,
    pub economic_modifier: f64,
    pub timing_modifier: f64,
}

impl KillImpact {
    /// Change in the killer side's win probability
    pub fn xvx_delta(&self) -> f64 {
        self.killer_after - self.killer_before
    }

    /// Credit for the killer, never negative
    pub fn kill_contribution(&self) -> f64 {
        self.xvx_delta().max(0.0) * self.economic_modifier * self.timing_modifier
    }

    /// Debit for the victim, never positive
    pub fn death_contribution(&self) -> f64 {
        (-self.xvx_delta()).min(0.0) * self.economic_modifier * self.timing_modifier
    }
}

/// An enemy kill together with its priced impact
///
/// Pricing failures stay attached to the event so they only affect the
/// killer and the victim.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredKill {
    pub round: u32,
    pub killer: PlayerId,
    pub victim: PlayerId,
    pub time_ms: u64,
    pub victim_armor: ArmorTier,
    pub impact: Result<KillImpact>,
}

/// Every priced kill of a match plus the data-quality issues met on the way
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchTimeline {
    pub kills: Vec<ScoredKill>,
    pub issues: Vec<DataQualityIssue>,
}

impl MatchTimeline {
    pub fn kills_by<'a>(&'a self, player_id: &'a str) -> impl Iterator<Item = &'a ScoredKill> {
        self.kills.iter().filter(move |k| k.killer == player_id)
    }

    pub fn deaths_of<'a>(&'a self, player_id: &'a str) -> impl Iterator<Item = &'a ScoredKill> {
        self.kills.iter().filter(move |k| k.victim == player_id)
    }
}

/// Replay every round of `match_data`
pub fn replay_match(
    match_data: &Match,
    reference: &ReferenceData,
    settings: &ImpactSettings,
) -> Result<MatchTimeline> {
    let replay = Replay {
        match_data,
        reference,
        settings,
        sides: SideResolver::new(match_data, settings)?,
    };

    let mut timeline = MatchTimeline::default();
    for round in &match_data.rounds {
        replay.replay_round(round, &mut timeline);
    }

    debug!(
        "Replayed match {}: {} scored kills, {} data-quality issues",
        match_data.id,
        timeline.kills.len(),
        timeline.issues.len()
    );
    Ok(timeline)
}

/// Whether the spike is down at `time_ms` within `round`
pub fn spike_active(round: &Round, time_ms: u64) -> bool {
    match round.plant_time_ms {
        Some(plant) => time_ms >= plant,
        None => round.spike_planted,
    }
}

/// Moment the round outcome was sealed, when it can be told from the record
pub fn effective_round_end(round: &Round, settings: &ImpactSettings) -> Option<u64> {
    match round.result_code.as_ref()? {
        RoundResultCode::Defuse => round.defuse_time_ms,
        RoundResultCode::Detonate => round
            .plant_time_ms
            .map(|plant| plant + settings.detonation_window_ms),
        _ => None,
    }
}

fn is_swapped(round: u32) -> bool {
    if round < HALF_LENGTH {
        false
    } else if round < OVERTIME_START {
        true
    } else {
        (round - OVERTIME_START) % 2 == 1
    }
}

fn half_index(round: u32) -> u32 {
    if round < OVERTIME_START {
        round / HALF_LENGTH
    } else {
        2 + (round - OVERTIME_START)
    }
}

/// Works out which team attacks in each round
#[derive(Debug, Clone, PartialEq)]
pub struct SideResolver {
    teams: [TeamId; 2],
    /// `(round number, index into teams)` for every round with a known planter
    planters: Vec<(u32, usize)>,
    /// Team attacking in round 0 when nothing better is known
    default_first: usize,
}

impl SideResolver {
    pub fn new(match_data: &Match, settings: &ImpactSettings) -> Result<Self> {
        let teams = <[TeamId; 2]>::try_from(match_data.teams()).map_err(|teams| {
            RatingError::InvalidInput {
                match_id: match_data.id.clone(),
                reason: format!("expected exactly two teams, found {}", teams.len()),
            }
        })?;

        let planters = match_data
            .rounds
            .iter()
            .filter_map(|round| {
                let planter = round.planter.as_deref()?;
                let team = match_data.team_of(planter)?;
                let index = teams.iter().position(|t| t == team)?;
                Some((round.number, index))
            })
            .collect();

        let default_first = teams
            .iter()
            .position(|t| *t == settings.default_attacking_team)
            .unwrap_or(0);

        Ok(Self {
            teams,
            planters,
            default_first,
        })
    }

    pub fn attacking_team(&self, round_number: u32) -> &TeamId {
        &self.teams[self.attacking_index(round_number)]
    }

    pub fn defending_team(&self, round_number: u32) -> &TeamId {
        &self.teams[1 - self.attacking_index(round_number)]
    }

    fn attacking_index(&self, round_number: u32) -> usize {
        if let Some((_, index)) = self.planters.iter().find(|(n, _)| *n == round_number) {
            return *index;
        }

        let half = half_index(round_number);
        if let Some((_, index)) = self.planters.iter().find(|(n, _)| half_index(*n) == half) {
            return *index;
        }

        // Nearest known planter, carried over by side-swap parity
        let (reference_round, index) = self
            .planters
            .iter()
            .min_by_key(|(n, _)| n.abs_diff(round_number))
            .copied()
            .unwrap_or((0, self.default_first));
        if is_swapped(reference_round) == is_swapped(round_number) {
            index
        } else {
            1 - index
        }
    }
}

struct Replay<'a> {
    match_data: &'a Match,
    reference: &'a ReferenceData,
    settings: &'a ImpactSettings,
    sides: SideResolver,
}

/// Per-round facts needed while pricing kills
struct RoundFrame<'a> {
    round: &'a Round,
    attacking_team: &'a str,
    winner: Option<Side>,
}

impl<'a> Replay<'a> {
    fn record(&self, issues: &mut Vec<DataQualityIssue>, issue: DataQualityIssue) {
        warn!("Match {}: {}", self.match_data.id, issue);
        issues.push(issue);
    }

    fn side_of(&self, frame: &RoundFrame<'_>, player_id: &str) -> Option<Side> {
        let player = self
            .match_data
            .rated_players()
            .find(|p| p.id == player_id)?;
        if player.team == frame.attacking_team {
            Some(Side::Attack)
        } else {
            Some(Side::Defense)
        }
    }

    fn replay_round(&self, round: &Round, timeline: &mut MatchTimeline) {
        let attacking_team = self.sides.attacking_team(round.number).as_str();
        let defending_team = self.sides.defending_team(round.number).as_str();
        let winner = round.winning_team.as_deref().and_then(|team| {
            if team == attacking_team {
                Some(Side::Attack)
            } else if team == defending_team {
                Some(Side::Defense)
            } else {
                None
            }
        });
        let frame = RoundFrame {
            round,
            attacking_team,
            winner,
        };

        let alive_count = |team: &str| {
            u8::try_from(self.match_data.roster_size(team)).unwrap_or(u8::MAX)
        };
        let mut state = AliveState::new(alive_count(attacking_team), alive_count(defending_team));

        let decided_at = if self.settings.exclude_after_round_decided {
            effective_round_end(round, self.settings)
        } else {
            None
        };

        let mut kills: Vec<&KillEvent> = round.kills.iter().collect();
        kills.sort_by_key(|k| k.time_ms);

        for kill in kills {
            if decided_at.is_some_and(|end| kill.time_ms > end) {
                debug!(
                    "Round {}: ignoring kill {} -> {} after the round was decided",
                    round.number, kill.killer, kill.victim
                );
                continue;
            }

            let skip = |reason: &str| DataQualityIssue::SkippedKill {
                round: round.number,
                killer: kill.killer.clone(),
                victim: kill.victim.clone(),
                reason: reason.to_string(),
            };

            let Some(victim_side) = self.side_of(&frame, &kill.victim) else {
                self.record(&mut timeline.issues, skip("unknown victim"));
                continue;
            };
            let Some(after) = state.after_death(victim_side) else {
                self.record(
                    &mut timeline.issues,
                    skip("victim side already eliminated"),
                );
                continue;
            };
            let before = state;
            state = after;

            if kill.spike_death || kill.killer == kill.victim {
                continue;
            }
            let Some(killer_side) = self.side_of(&frame, &kill.killer) else {
                self.record(&mut timeline.issues, skip("unknown killer"));
                continue;
            };
            if killer_side == victim_side {
                debug!(
                    "Round {}: team kill {} -> {} earns no credit",
                    round.number, kill.killer, kill.victim
                );
                continue;
            }

            let spike_planted = spike_active(round, kill.time_ms);
            let impact = self.price_kill(
                &frame,
                kill,
                killer_side,
                before,
                after,
                spike_planted,
                &mut timeline.issues,
            );
            if let Ok(priced) = &impact {
                debug!(
                    "Round {}: {} -> {} at {}ms, {} -> {}, delta {:.4}",
                    round.number,
                    kill.killer,
                    kill.victim,
                    kill.time_ms,
                    before,
                    after,
                    priced.xvx_delta()
                );
            }

            timeline.kills.push(ScoredKill {
                round: round.number,
                killer: kill.killer.clone(),
                victim: kill.victim.clone(),
                time_ms: kill.time_ms,
                victim_armor: kill.victim_armor,
                impact,
            });
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn price_kill(
        &self,
        frame: &RoundFrame<'_>,
        kill: &KillEvent,
        killer_side: Side,
        before: AliveState,
        after: AliveState,
        spike_planted: bool,
        issues: &mut Vec<DataQualityIssue>,
    ) -> Result<KillImpact> {
        let round = frame.round.number;
        let killer_before = self
            .lookup_xvx(round, before, spike_planted, issues)?
            .for_side(killer_side);

        let killer_after = match frame.winner {
            Some(winner) if after.is_terminal() => {
                if winner == killer_side {
                    1.0
                } else {
                    0.0
                }
            }
            _ => self
                .lookup_xvx(round, after, spike_planted, issues)?
                .for_side(killer_side),
        };

        let economic_modifier = self.economic_modifier(frame, kill, issues)?;

        Ok(KillImpact {
            before,
            after,
            spike_planted,
            killer_side,
            killer_before,
            killer_after,
            economic_modifier,
            timing_modifier: self.settings.timing_modifier(kill.time_ms),
        })
    }

    fn lookup_xvx(
        &self,
        round: u32,
        state: AliveState,
        spike_planted: bool,
        issues: &mut Vec<DataQualityIssue>,
    ) -> Result<XvxLookup> {
        let lookup =
            self.reference
                .xvx
                .lookup(state, spike_planted, self.settings.xvx_miss_policy)?;

        if let Some(requested) = lookup.clamped_from {
            self.record(
                issues,
                DataQualityIssue::XvxClamped {
                    round,
                    requested,
                    resolved: lookup.resolved,
                    spike_planted,
                },
            );
        }
        if lookup.fallback {
            self.record(
                issues,
                DataQualityIssue::XvxFallback {
                    round,
                    state: lookup.resolved,
                    spike_planted,
                },
            );
        }
        Ok(lookup)
    }

    fn economic_modifier(
        &self,
        frame: &RoundFrame<'_>,
        kill: &KillEvent,
        issues: &mut Vec<DataQualityIssue>,
    ) -> Result<f64> {
        let killer = self.category(frame.round, &kill.killer, issues);
        let victim = self.category(frame.round, &kill.victim, issues);
        let lookup = self.reference.economy.lookup(
            killer,
            victim,
            self.settings.economic_miss_policy,
        )?;

        if lookup.fallback {
            self.record(
                issues,
                DataQualityIssue::EconomicFallback {
                    round: frame.round.number,
                    killer,
                    victim,
                },
            );
        }
        Ok(lookup.modifier())
    }

    fn category(
        &self,
        round: &Round,
        player_id: &str,
        issues: &mut Vec<DataQualityIssue>,
    ) -> EconomyCategory {
        if self.settings.economy_basis == EconomyBasis::Team {
            if let Some(category) = self.team_category(round, player_id) {
                return category;
            }
        }

        let thresholds = &self.settings.economy_thresholds;
        match round.loadouts.get(player_id) {
            Some(loadout) => match (loadout.category, loadout.credits) {
                (Some(category), _) => category,
                (None, Some(credits)) => categorize_credits(credits, thresholds),
                (None, None) => {
                    self.record(
                        issues,
                        DataQualityIssue::MissingLoadout {
                            round: round.number,
                            player_id: player_id.to_string(),
                        },
                    );
                    categorize_credits(0, thresholds)
                }
            },
            None => {
                self.record(
                    issues,
                    DataQualityIssue::MissingLoadout {
                        round: round.number,
                        player_id: player_id.to_string(),
                    },
                );
                categorize_credits(0, thresholds)
            }
        }
    }

    /// Average credits per player of `player_id`'s team
    fn team_category(&self, round: &Round, player_id: &str) -> Option<EconomyCategory> {
        let team = self.match_data.team_of(player_id)?;
        let credits: Vec<u32> = self
            .match_data
            .rated_players()
            .filter(|p| &p.team == team)
            .filter_map(|p| round.loadouts.get(&p.id).and_then(|l| l.credits))
            .collect();
        if credits.is_empty() {
            return None;
        }

        let total: u64 = credits.iter().map(|c| u64::from(*c)).sum();
        let average = u32::try_from(total / credits.len() as u64).unwrap_or(u32::MAX);
        Some(categorize_credits(
            average,
            &self.settings.economy_thresholds,
        ))
    }
}
