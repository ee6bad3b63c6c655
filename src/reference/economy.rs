//! Economic matchup table
//!
//! Observed round win rates keyed by (killer category, victim category).

use crate::config::rating::{EconomyThresholds, MissPolicy};
use crate::error::{RatingError, Result};
use crate::types::EconomyCategory;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One cell of the matchup matrix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchupRecord {
    pub win_rate: f64,
    #[serde(default)]
    pub wins: u64,
    #[serde(default)]
    pub total: u64,
}

/// Outcome of a matchup lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EconomicLookup {
    pub win_rate: f64,
    /// The pair was absent and the neutral fallback was used
    pub fallback: bool,
}

impl EconomicLookup {
    /// `2 × (1 − win_rate)`: above 1 for kills from an economic disadvantage
    pub fn modifier(&self) -> f64 {
        economic_modifier(self.win_rate)
    }
}

pub fn economic_modifier(win_rate: f64) -> f64 {
    2.0 * (1.0 - win_rate)
}

/// Categorize a credit value using inclusive upper bounds
pub fn categorize_credits(credits: u32, thresholds: &EconomyThresholds) -> EconomyCategory {
    if credits <= thresholds.save {
        EconomyCategory::Save
    } else if credits <= thresholds.eco {
        EconomyCategory::Eco
    } else if credits <= thresholds.force_buy {
        EconomyCategory::ForceBuy
    } else if credits <= thresholds.anti_eco {
        EconomyCategory::AntiEco
    } else if credits <= thresholds.full_buy {
        EconomyCategory::FullBuy
    } else {
        EconomyCategory::OperatorBuy
    }
}

#[derive(Debug, Deserialize)]
struct EconomicTableFile {
    economy_categories: BTreeMap<String, MatchupRecord>,
}

/// Read-only economic matchup table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EconomicMatchupTable {
    entries: HashMap<(EconomyCategory, EconomyCategory), MatchupRecord>,
}

impl EconomicMatchupTable {
    /// Build a table, validating every win rate lies in [0, 1]
    pub fn new(
        entries: impl IntoIterator<Item = ((EconomyCategory, EconomyCategory), MatchupRecord)>,
    ) -> Result<Self> {
        let mut table = HashMap::new();
        for ((killer, victim), record) in entries {
            if !(0.0..=1.0).contains(&record.win_rate) {
                return Err(RatingError::ReferenceData {
                    message: format!(
                        "Win rate for {} vs {} must be within [0, 1], got {}",
                        killer, victim, record.win_rate
                    ),
                });
            }
            table.insert((killer, victim), record);
        }
        Ok(Self { entries: table })
    }

    /// Table where every matchup is an even split
    pub fn uniform(win_rate: f64) -> Result<Self> {
        let mut entries = Vec::new();
        for killer in EconomyCategory::ALL {
            for victim in EconomyCategory::ALL {
                entries.push((
                    (killer, victim),
                    MatchupRecord {
                        win_rate,
                        wins: 0,
                        total: 0,
                    },
                ));
            }
        }
        Self::new(entries)
    }

    /// Parse the `{"economy_categories": {"A vs B": {...}}}` format
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: EconomicTableFile =
            serde_json::from_str(json).map_err(|e| RatingError::ReferenceData {
                message: format!("Invalid economic table JSON: {}", e),
            })?;

        let mut entries = Vec::with_capacity(file.economy_categories.len());
        for (key, record) in file.economy_categories {
            entries.push((parse_matchup_key(&key)?, record));
        }
        Self::new(entries)
    }

    pub fn get(&self, killer: EconomyCategory, victim: EconomyCategory) -> Option<&MatchupRecord> {
        self.entries.get(&(killer, victim))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Category pairs with no entry
    pub fn missing_pairs(&self) -> Vec<(EconomyCategory, EconomyCategory)> {
        let mut missing = Vec::new();
        for killer in EconomyCategory::ALL {
            for victim in EconomyCategory::ALL {
                if !self.entries.contains_key(&(killer, victim)) {
                    missing.push((killer, victim));
                }
            }
        }
        missing
    }

    /// Resolve the win rate of `killer` against `victim` under `policy`
    pub fn lookup(
        &self,
        killer: EconomyCategory,
        victim: EconomyCategory,
        policy: MissPolicy,
    ) -> Result<EconomicLookup> {
        match (self.get(killer, victim), policy) {
            (Some(record), _) => Ok(EconomicLookup {
                win_rate: record.win_rate,
                fallback: false,
            }),
            (None, MissPolicy::Neutral) => Ok(EconomicLookup {
                win_rate: 0.5,
                fallback: true,
            }),
            (None, MissPolicy::Error) => Err(RatingError::EconomicLookupMiss { killer, victim }),
        }
    }
}

fn parse_matchup_key(key: &str) -> Result<(EconomyCategory, EconomyCategory)> {
    let invalid = |reason: String| RatingError::ReferenceData {
        message: format!("Invalid matchup key '{}': {}", key, reason),
    };

    let (killer, victim) = key
        .split_once(" vs ")
        .ok_or_else(|| invalid("expected '<category> vs <category>'".to_string()))?;
    let killer = killer.parse::<EconomyCategory>().map_err(invalid)?;
    let victim = victim.parse::<EconomyCategory>().map_err(invalid)?;
    Ok((killer, victim))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SAMPLE: &str = r#"{
        "economy_categories": {
            "Eco Round vs Full Buy": {"win_rate": 0.2, "wins": 20, "total": 100},
            "Full Buy vs Eco Round": {"win_rate": 0.8, "wins": 80, "total": 100},
            "Full Buy vs Full Buy": {"win_rate": 0.5}
        }
    }"#;

    #[test]
    fn test_parse_sample_table() {
        let table = EconomicMatchupTable::from_json_str(SAMPLE).unwrap();
        assert_eq!(table.len(), 3);
        let record = table
            .get(EconomyCategory::Eco, EconomyCategory::FullBuy)
            .unwrap();
        assert_eq!(record.win_rate, 0.2);
        assert_eq!(record.total, 100);
    }

    #[test]
    fn test_modifier_direction() {
        let table = EconomicMatchupTable::from_json_str(SAMPLE).unwrap();
        let underdog = table
            .lookup(EconomyCategory::Eco, EconomyCategory::FullBuy, MissPolicy::Error)
            .unwrap();
        let favourite = table
            .lookup(EconomyCategory::FullBuy, EconomyCategory::Eco, MissPolicy::Error)
            .unwrap();
        let even = table
            .lookup(EconomyCategory::FullBuy, EconomyCategory::FullBuy, MissPolicy::Error)
            .unwrap();

        assert_relative_eq!(underdog.modifier(), 1.6);
        assert_relative_eq!(favourite.modifier(), 0.4, epsilon = 1e-12);
        assert_relative_eq!(even.modifier(), 1.0);
    }

    #[test]
    fn test_miss_policies() {
        let table = EconomicMatchupTable::from_json_str(SAMPLE).unwrap();
        let neutral = table
            .lookup(EconomyCategory::Save, EconomyCategory::OperatorBuy, MissPolicy::Neutral)
            .unwrap();
        assert!(neutral.fallback);
        assert_eq!(neutral.modifier(), 1.0);

        let err = table
            .lookup(EconomyCategory::Save, EconomyCategory::OperatorBuy, MissPolicy::Error)
            .unwrap_err();
        assert_eq!(
            err,
            RatingError::EconomicLookupMiss {
                killer: EconomyCategory::Save,
                victim: EconomyCategory::OperatorBuy
            }
        );
    }

    #[test]
    fn test_out_of_range_win_rate_rejected() {
        let json = r#"{"economy_categories": {"Eco Round vs Eco Round": {"win_rate": 1.5}}}"#;
        assert!(EconomicMatchupTable::from_json_str(json).is_err());
    }

    #[test]
    fn test_malformed_key_rejected() {
        let json = r#"{"economy_categories": {"Eco Round versus Eco Round": {"win_rate": 0.5}}}"#;
        assert!(matches!(
            EconomicMatchupTable::from_json_str(json),
            Err(RatingError::ReferenceData { .. })
        ));
    }

    #[test]
    fn test_categorize_credits() {
        let t = EconomyThresholds::default();
        assert_eq!(categorize_credits(0, &t), EconomyCategory::Save);
        assert_eq!(categorize_credits(1500, &t), EconomyCategory::Save);
        assert_eq!(categorize_credits(1501, &t), EconomyCategory::Eco);
        assert_eq!(categorize_credits(7500, &t), EconomyCategory::ForceBuy);
        assert_eq!(categorize_credits(9000, &t), EconomyCategory::AntiEco);
        assert_eq!(categorize_credits(15000, &t), EconomyCategory::FullBuy);
        assert_eq!(categorize_credits(20000, &t), EconomyCategory::OperatorBuy);
    }

    #[test]
    fn test_uniform_table_is_complete() {
        let table = EconomicMatchupTable::uniform(0.5).unwrap();
        assert_eq!(table.len(), 36);
        assert!(table.missing_pairs().is_empty());
    }
}
