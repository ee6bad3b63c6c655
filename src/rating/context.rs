//! Per-match calculation context

use crate::config::rating::ImpactSettings;
use crate::error::Result;
use crate::rating::damage::extract_damage;
use crate::rating::quality::DataQualityIssue;
use crate::rating::timeline::{replay_match, MatchTimeline};
use crate::reference::ReferenceData;
use crate::types::{Match, PlayerId};
use std::collections::HashMap;

/// Everything a component needs to rate one player in one match
///
/// Built once per match and borrowed by every component call for that match.
#[derive(Debug)]
pub struct MatchContext<'a> {
    pub match_data: &'a Match,
    pub reference: &'a ReferenceData,
    pub settings: &'a ImpactSettings,
    /// Total damage dealt per player
    pub damage: HashMap<PlayerId, f64>,
    pub timeline: MatchTimeline,
}

impl<'a> MatchContext<'a> {
    pub fn build(
        match_data: &'a Match,
        reference: &'a ReferenceData,
        settings: &'a ImpactSettings,
    ) -> Result<Self> {
        let damage = extract_damage(match_data);
        let timeline = replay_match(match_data, reference, settings)?;
        Ok(Self {
            match_data,
            reference,
            settings,
            damage,
            timeline,
        })
    }

    pub fn total_damage(&self, player_id: &str) -> f64 {
        self.damage.get(player_id).copied().unwrap_or(0.0)
    }

    pub fn issues(&self) -> &[DataQualityIssue] {
        &self.timeline.issues
    }
}
