//! Batch output document

use crate::data::LoadFailure;
use crate::rating::{DataQualityIssue, MatchRatings, PlayerMatchRating, RatingFailure};
use crate::types::MatchId;
use crate::utils::{current_timestamp, generate_run_id};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use uuid::Uuid;

/// Data-quality issues of a run, counted by kind and listed per match
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataQualitySummary {
    pub counts: BTreeMap<String, u64>,
    pub matches: BTreeMap<MatchId, Vec<DataQualityIssue>>,
}

impl DataQualitySummary {
    pub fn add(&mut self, match_id: &str, issues: Vec<DataQualityIssue>) {
        if issues.is_empty() {
            return;
        }
        for issue in &issues {
            *self.counts.entry(issue.kind().to_string()).or_insert(0) += 1;
        }
        self.matches
            .entry(match_id.to_string())
            .or_default()
            .extend(issues);
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

/// Everything a rating run produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Keyed by `"<player>_<match>"`
    pub ratings: BTreeMap<String, PlayerMatchRating>,
    pub failures: Vec<RatingFailure>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub load_failures: Vec<LoadFailure>,
    pub data_quality: DataQualitySummary,
}

impl Default for BatchReport {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchReport {
    pub fn new() -> Self {
        Self {
            run_id: generate_run_id(),
            generated_at: current_timestamp(),
            ratings: BTreeMap::new(),
            failures: Vec::new(),
            load_failures: Vec::new(),
            data_quality: DataQualitySummary::default(),
        }
    }

    /// Fold one match's results into the report
    pub fn add_match(&mut self, outcome: MatchRatings) {
        for rating in outcome.ratings {
            self.ratings.insert(rating.key().to_string(), rating);
        }
        self.failures.extend(outcome.failures);
        self.data_quality.add(&outcome.match_id, outcome.issues);
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        json.context("Failed to serialize rating report")
    }

    pub fn write_to(&self, path: &Path, pretty: bool) -> Result<()> {
        let json = self.to_json(pretty)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))
    }
}
