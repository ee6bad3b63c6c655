//! XvX win-probability table
//!
//! Attacking-side round win probability keyed by the number of attackers and
//! defenders still alive, split by whether the spike is down.

use crate::config::rating::MissPolicy;
use crate::error::{RatingError, Result};
use crate::types::Side;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Players still alive on each side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AliveState {
    pub attackers: u8,
    pub defenders: u8,
}

impl AliveState {
    pub const fn new(attackers: u8, defenders: u8) -> Self {
        Self {
            attackers,
            defenders,
        }
    }

    pub fn alive(&self, side: Side) -> u8 {
        match side {
            Side::Attack => self.attackers,
            Side::Defense => self.defenders,
        }
    }

    /// State after one player of `side` dies, `None` if that side is already empty
    pub fn after_death(&self, side: Side) -> Option<AliveState> {
        match side {
            Side::Attack => self
                .attackers
                .checked_sub(1)
                .map(|attackers| AliveState::new(attackers, self.defenders)),
            Side::Defense => self
                .defenders
                .checked_sub(1)
                .map(|defenders| AliveState::new(self.attackers, defenders)),
        }
    }

    /// One side has been eliminated
    pub fn is_terminal(&self) -> bool {
        self.attackers == 0 || self.defenders == 0
    }

    fn parse_key(key: &str) -> Option<AliveState> {
        let (attackers, defenders) = key.trim().split_once('v')?;
        Some(AliveState::new(attackers.parse().ok()?, defenders.parse().ok()?))
    }
}

impl std::fmt::Display for AliveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.attackers, self.defenders)
    }
}

/// Outcome of an XvX lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XvxLookup {
    /// Attacking-side win probability
    pub probability: f64,
    /// State that was actually read from the table
    pub resolved: AliveState,
    /// Requested state when it lay outside the table's coverage
    pub clamped_from: Option<AliveState>,
    /// The entry was missing and the neutral fallback was used
    pub fallback: bool,
}

impl XvxLookup {
    /// Win probability from the point of view of `side`
    pub fn for_side(&self, side: Side) -> f64 {
        match side {
            Side::Attack => self.probability,
            Side::Defense => 1.0 - self.probability,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Coverage {
    min: AliveState,
    max: AliveState,
}

impl Coverage {
    fn clamp(&self, state: AliveState) -> AliveState {
        AliveState::new(
            state.attackers.clamp(self.min.attackers, self.max.attackers),
            state.defenders.clamp(self.min.defenders, self.max.defenders),
        )
    }
}

/// Probabilities for one spike variant together with their covered range
#[derive(Debug, Clone, Default, PartialEq)]
struct XvxVariant {
    entries: HashMap<AliveState, f64>,
    coverage: Option<Coverage>,
}

impl XvxVariant {
    fn insert(&mut self, state: AliveState, probability: f64) {
        self.entries.insert(state, probability);
        self.coverage = Some(match self.coverage {
            None => Coverage {
                min: state,
                max: state,
            },
            Some(c) => Coverage {
                min: AliveState::new(
                    c.min.attackers.min(state.attackers),
                    c.min.defenders.min(state.defenders),
                ),
                max: AliveState::new(
                    c.max.attackers.max(state.attackers),
                    c.max.defenders.max(state.defenders),
                ),
            },
        });
    }
}

#[derive(Debug, Deserialize)]
struct XvxTableFile {
    win_probabilities: BTreeMap<String, BTreeMap<String, f64>>,
}

/// Read-only XvX table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XvxTable {
    no_spike: XvxVariant,
    spike: XvxVariant,
}

impl XvxTable {
    /// Build a table from `(state, spike_planted, attacker_probability)` rows
    pub fn new(rows: impl IntoIterator<Item = (AliveState, bool, f64)>) -> Result<Self> {
        let mut table = Self::default();
        for (state, spike_planted, probability) in rows {
            if !(0.0..=1.0).contains(&probability) {
                return Err(RatingError::ReferenceData {
                    message: format!(
                        "XvX probability for {} (spike planted: {}) must be within [0, 1], got {}",
                        state, spike_planted, probability
                    ),
                });
            }
            table.variant_mut(spike_planted).insert(state, probability);
        }
        Ok(table)
    }

    /// Parse the `{"win_probabilities": {"atk_no_spike": {"5v5": p}, "atk_spike": {...}}}` format
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: XvxTableFile =
            serde_json::from_str(json).map_err(|e| RatingError::ReferenceData {
                message: format!("Invalid XvX table JSON: {}", e),
            })?;

        let mut rows = Vec::new();
        for (variant, spike_planted) in [("atk_no_spike", false), ("atk_spike", true)] {
            let Some(entries) = file.win_probabilities.get(variant) else {
                continue;
            };
            for (key, probability) in entries {
                let state = AliveState::parse_key(key).ok_or_else(|| RatingError::ReferenceData {
                    message: format!("Invalid XvX key '{}' in {}", key, variant),
                })?;
                rows.push((state, spike_planted, *probability));
            }
        }
        Self::new(rows)
    }

    fn variant(&self, spike_planted: bool) -> &XvxVariant {
        if spike_planted {
            &self.spike
        } else {
            &self.no_spike
        }
    }

    fn variant_mut(&mut self, spike_planted: bool) -> &mut XvxVariant {
        if spike_planted {
            &mut self.spike
        } else {
            &mut self.no_spike
        }
    }

    pub fn get(&self, state: AliveState, spike_planted: bool) -> Option<f64> {
        self.variant(spike_planted).entries.get(&state).copied()
    }

    pub fn len(&self) -> usize {
        self.no_spike.entries.len() + self.spike.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// States in `1..=team_size` squared, for both variants, that have no entry
    pub fn missing_states(&self, team_size: u8) -> Vec<(AliveState, bool)> {
        let mut missing = Vec::new();
        for spike_planted in [false, true] {
            for attackers in 1..=team_size {
                for defenders in 1..=team_size {
                    let state = AliveState::new(attackers, defenders);
                    if self.get(state, spike_planted).is_none() {
                        missing.push((state, spike_planted));
                    }
                }
            }
        }
        missing
    }

    /// Attacking-side win probability for `state`
    ///
    /// Counts outside the covered range are clamped to the nearest covered
    /// state and flagged in [`XvxLookup::clamped_from`]. Holes inside the
    /// range follow `policy`.
    pub fn lookup(
        &self,
        state: AliveState,
        spike_planted: bool,
        policy: MissPolicy,
    ) -> Result<XvxLookup> {
        let variant = self.variant(spike_planted);
        let resolved = variant
            .coverage
            .map(|coverage| coverage.clamp(state))
            .unwrap_or(state);
        let clamped_from = (resolved != state).then_some(state);

        match (variant.entries.get(&resolved), policy) {
            (Some(probability), _) => Ok(XvxLookup {
                probability: *probability,
                resolved,
                clamped_from,
                fallback: false,
            }),
            (None, MissPolicy::Neutral) => Ok(XvxLookup {
                probability: 0.5,
                resolved,
                clamped_from,
                fallback: true,
            }),
            (None, MissPolicy::Error) => Err(RatingError::XvxLookupMiss {
                attackers: resolved.attackers,
                defenders: resolved.defenders,
                spike_planted,
            }),
        }
    }
}
