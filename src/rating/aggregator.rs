//! Rating aggregation
//!
//! Turns raw component values into a single rating: optional z-score
//! normalization, weighting, and the optional final affine rescaling.

use crate::config::rating::{NormalizationParams, RatingConfig};
use crate::error::{RatingError, Result};
use crate::rating::components::{DEATH_CONTRIB, KILL_CONTRIB};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per player-match rating together with every intermediate value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingBreakdown {
    pub rating: f64,
    pub weighted_sum: f64,
    /// Rating before the final normalization, when final scaling is configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_normalized_rating: Option<f64>,
    pub components: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_components: Option<BTreeMap<String, f64>>,
    pub weighted_components: BTreeMap<String, f64>,
}

/// `Σ weight_i × value_i`
pub fn weighted_sum(weights: &[f64], values: &[f64]) -> f64 {
    weights.iter().zip(values).map(|(w, v)| w * v).sum()
}

/// Combines component values according to a [`RatingConfig`]
#[derive(Debug, Clone, Copy)]
pub struct RatingAggregator<'a> {
    config: &'a RatingConfig,
}

impl<'a> RatingAggregator<'a> {
    pub fn new(config: &'a RatingConfig) -> Self {
        Self { config }
    }

    pub fn aggregate(&self, raw: BTreeMap<String, f64>) -> Result<RatingBreakdown> {
        let normalized = match &self.config.normalization {
            Some(_) => Some(self.normalize(&raw)?),
            None => None,
        };
        let values = normalized.as_ref().unwrap_or(&raw);

        let mut weighted_components = BTreeMap::new();
        let mut total = 0.0;
        for name in &self.config.components {
            let value = *values
                .get(name)
                .ok_or_else(|| RatingError::ComponentNotFound { name: name.clone() })?;
            let weight = self.config.weight(name).ok_or_else(|| {
                RatingError::ConfigurationError {
                    message: format!("Missing weight for component {}", name),
                }
            })?;
            let weighted = weight * value;
            total += weighted;
            weighted_components.insert(name.clone(), weighted);
        }

        let (pre_normalized_rating, rating) = match &self.config.final_scaling {
            Some(scaling) => {
                let (pre, rating) = scaling.apply(total)?;
                (Some(pre), rating)
            }
            None => (None, total),
        };

        Ok(RatingBreakdown {
            rating,
            weighted_sum: total,
            pre_normalized_rating,
            components: raw,
            normalized_components: normalized,
            weighted_components,
        })
    }

    fn params(&self, name: &str) -> Result<&NormalizationParams> {
        self.config
            .normalization_for(name)
            .ok_or_else(|| RatingError::ConfigurationError {
                message: format!("Missing normalization parameters for component {}", name),
            })
    }

    fn normalize(&self, raw: &BTreeMap<String, f64>) -> Result<BTreeMap<String, f64>> {
        let mut normalized = BTreeMap::new();
        for name in &self.config.components {
            let value = *raw
                .get(name)
                .ok_or_else(|| RatingError::ComponentNotFound { name: name.clone() })?;
            let paired = self.config.net_impact_pairing
                && (name == KILL_CONTRIB || name == DEATH_CONTRIB);
            if !paired {
                normalized.insert(name.clone(), self.params(name)?.normalize(name, value)?);
            }
        }

        if self.config.net_impact_pairing {
            let get = |name: &str| {
                raw.get(name)
                    .copied()
                    .ok_or_else(|| RatingError::ComponentNotFound {
                        name: name.to_string(),
                    })
            };
            let kill = self.params(KILL_CONTRIB)?;
            let death = self.params(DEATH_CONTRIB)?;
            let net = NormalizationParams::new(kill.mean + death.mean, kill.std)
                .normalize("net_impact", get(KILL_CONTRIB)? + get(DEATH_CONTRIB)?)?;
            normalized.insert(KILL_CONTRIB.to_string(), net / 2.0);
            normalized.insert(DEATH_CONTRIB.to_string(), net / 2.0);
        }

        Ok(normalized)
    }
}
