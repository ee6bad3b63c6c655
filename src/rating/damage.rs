//! Damage extraction

use crate::types::{Match, PlayerId};
use std::collections::HashMap;

/// Total damage dealt by each player across every round of a match
pub fn extract_damage(match_data: &Match) -> HashMap<PlayerId, f64> {
    let mut totals: HashMap<PlayerId, f64> = HashMap::new();
    for round in &match_data.rounds {
        for event in &round.damage {
            *totals.entry(event.source.clone()).or_insert(0.0) += event.amount;
        }
    }
    totals
}
