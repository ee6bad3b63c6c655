//! Rating system configuration
//!
//! Weights, normalization parameters and the impact-model knobs. All of it is
//! externally calibrated; nothing here is fitted by this crate.

use crate::error::{RatingError, Result};
use crate::rating::components::{ADRA, APR, BUILTIN_COMPONENTS, DEATH_CONTRIB, KILL_CONTRIB};
use crate::types::TeamId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// What to do when a reference table has no entry for a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissPolicy {
    /// Surface the miss as a lookup error for the affected players
    Error,
    /// Resolve to an even 0.5 probability and report a data-quality issue
    Neutral,
}

impl FromStr for MissPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(MissPolicy::Error),
            "neutral" | "coin_flip" | "coinflip" => Ok(MissPolicy::Neutral),
            other => Err(format!("unknown miss policy: {}", other)),
        }
    }
}

/// Which loadout value feeds the economic matchup lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EconomyBasis {
    /// The individual killer and victim loadouts
    Player,
    /// Average per-player loadout of the killer's team against the victim's team
    Team,
}

/// Upper credit bounds (inclusive) for each economy category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyThresholds {
    pub save: u32,
    pub eco: u32,
    pub force_buy: u32,
    pub anti_eco: u32,
    pub full_buy: u32,
}

impl Default for EconomyThresholds {
    fn default() -> Self {
        Self {
            save: 1500,
            eco: 4000,
            force_buy: 7500,
            anti_eco: 10000,
            full_buy: 15000,
        }
    }
}

/// Parameters of the per-kill impact model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactSettings {
    /// Kills later than this (ms since round start) count as post-round
    pub post_round_threshold_ms: u64,
    /// Multiplier applied to post-round kills
    pub post_round_multiplier: f64,
    /// Drop kills after a defuse or detonation already decided the round
    pub exclude_after_round_decided: bool,
    /// Time from plant to detonation
    pub detonation_window_ms: u64,
    pub economy_basis: EconomyBasis,
    pub economy_thresholds: EconomyThresholds,
    /// Team assumed to attack first when no round records a planter
    pub default_attacking_team: TeamId,
    pub xvx_miss_policy: MissPolicy,
    pub economic_miss_policy: MissPolicy,
}

impl Default for ImpactSettings {
    fn default() -> Self {
        Self {
            post_round_threshold_ms: 100_000,
            post_round_multiplier: 0.5,
            exclude_after_round_decided: false,
            detonation_window_ms: 45_000,
            economy_basis: EconomyBasis::Player,
            economy_thresholds: EconomyThresholds::default(),
            default_attacking_team: "Blue".to_string(),
            xvx_miss_policy: MissPolicy::Error,
            economic_miss_policy: MissPolicy::Neutral,
        }
    }
}

impl ImpactSettings {
    pub fn timing_modifier(&self, time_ms: u64) -> f64 {
        if time_ms > self.post_round_threshold_ms {
            self.post_round_multiplier
        } else {
            1.0
        }
    }
}

/// Reference mean and standard deviation for one component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParams {
    pub mean: f64,
    pub std: f64,
}

impl NormalizationParams {
    pub fn new(mean: f64, std: f64) -> Self {
        Self { mean, std }
    }

    /// Z-score of `raw`; a zero or non-finite std is a configuration error
    pub fn normalize(&self, component: &str, raw: f64) -> Result<f64> {
        if self.std == 0.0 || !self.std.is_finite() {
            return Err(RatingError::ZeroStandardDeviation {
                component: component.to_string(),
            });
        }
        Ok((raw - self.mean) / self.std)
    }

    pub fn denormalize(&self, normalized: f64) -> f64 {
        normalized * self.std + self.mean
    }
}

/// Presentation-layer affine transform applied to the weighted sum
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinalScaling {
    pub base_rating: f64,
    pub scaling_factor: f64,
    pub mean: f64,
    pub std: f64,
}

impl Default for FinalScaling {
    fn default() -> Self {
        Self {
            base_rating: 0.0,
            scaling_factor: 1.0,
            mean: 0.0,
            std: 1.0,
        }
    }
}

impl FinalScaling {
    /// Returns `(pre_normalized_rating, rating)`
    pub fn apply(&self, weighted_sum: f64) -> Result<(f64, f64)> {
        let pre = self.base_rating + self.scaling_factor * weighted_sum;
        if self.std == 0.0 || !self.std.is_finite() {
            return Err(RatingError::ZeroStandardDeviation {
                component: "final_rating".to_string(),
            });
        }
        Ok((pre, (pre - self.mean) / self.std))
    }
}

/// Complete rating configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Components to compute, in output order
    pub components: Vec<String>,
    pub weights: BTreeMap<String, f64>,
    pub normalization: Option<BTreeMap<String, NormalizationParams>>,
    pub final_scaling: Option<FinalScaling>,
    /// Normalize KillContrib and DeathContrib together as net impact
    pub net_impact_pairing: bool,
    pub impact: ImpactSettings,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            components: BUILTIN_COMPONENTS.iter().map(|c| c.to_string()).collect(),
            weights: default_weights(),
            normalization: None,
            final_scaling: None,
            net_impact_pairing: false,
            impact: ImpactSettings::default(),
        }
    }
}

/// Weights of the published model
pub fn default_weights() -> BTreeMap<String, f64> {
    BTreeMap::from([
        (KILL_CONTRIB.to_string(), 0.431),
        (DEATH_CONTRIB.to_string(), 0.431),
        (APR.to_string(), 0.052),
        (ADRA.to_string(), 0.085),
    ])
}

impl RatingConfig {
    pub fn weight(&self, component: &str) -> Option<f64> {
        self.weights.get(component).copied()
    }

    pub fn normalization_for(&self, component: &str) -> Option<&NormalizationParams> {
        self.normalization.as_ref().and_then(|n| n.get(component))
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.components.is_empty() {
            return Err(config_error("At least one component must be selected"));
        }

        for (name, weight) in &self.weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(config_error(format!(
                    "Weight for {} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }

        for component in &self.components {
            if !self.weights.contains_key(component) {
                return Err(config_error(format!("Missing weight for component {}", component)));
            }
        }

        if let Some(normalization) = &self.normalization {
            for component in &self.components {
                let params = normalization.get(component).ok_or_else(|| {
                    config_error(format!(
                        "Missing normalization parameters for component {}",
                        component
                    ))
                })?;
                if params.std == 0.0 || !params.std.is_finite() {
                    return Err(RatingError::ZeroStandardDeviation {
                        component: component.clone(),
                    });
                }
                if !params.mean.is_finite() {
                    return Err(config_error(format!(
                        "Normalization mean for {} must be finite",
                        component
                    )));
                }
            }
        }

        if let Some(scaling) = &self.final_scaling {
            if scaling.std == 0.0 || !scaling.std.is_finite() {
                return Err(RatingError::ZeroStandardDeviation {
                    component: "final_rating".to_string(),
                });
            }
        }

        if self.net_impact_pairing {
            let selected = |name: &str| self.components.iter().any(|c| c == name);
            if !selected(KILL_CONTRIB) || !selected(DEATH_CONTRIB) {
                return Err(config_error(
                    "Net impact pairing needs both KillContrib and DeathContrib",
                ));
            }
        }

        let impact = &self.impact;
        if !impact.post_round_multiplier.is_finite() || impact.post_round_multiplier < 0.0 {
            return Err(config_error("Post-round multiplier must be a non-negative number"));
        }

        let t = &impact.economy_thresholds;
        if !(t.save < t.eco && t.eco < t.force_buy && t.force_buy < t.anti_eco && t.anti_eco < t.full_buy)
        {
            return Err(config_error("Economy thresholds must be strictly ascending"));
        }

        if impact.default_attacking_team.is_empty() {
            return Err(config_error("Default attacking team cannot be empty"));
        }

        Ok(())
    }
}

fn config_error(message: impl Into<String>) -> RatingError {
    RatingError::ConfigurationError {
        message: message.into(),
    }
}
