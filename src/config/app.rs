//! Main application configuration
//!
//! This module defines the top-level configuration for the rating tool,
//! including TOML file loading, environment variable overrides and validation.

use crate::config::rating::RatingConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub data: DataSettings,
    pub rating: RatingConfig,
}

/// Process-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Rayon worker threads for rating computation (0 = one per core)
    pub worker_threads: usize,
    /// Maximum match files read concurrently
    pub load_concurrency: usize,
}

/// Locations of the static reference tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub economic_table_path: PathBuf,
    pub xvx_table_path: PathBuf,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "spike-rating".to_string(),
            log_level: "info".to_string(),
            worker_threads: 0,
            load_concurrency: 16,
        }
    }
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            economic_table_path: PathBuf::from("data/loadout_cost_analysis.json"),
            xvx_table_path: PathBuf::from("data/xvx_data.json"),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Invalid TOML in config file {}", path.display()))?;

        // Relative table paths are resolved against the config file location
        if let Some(base) = path.parent() {
            config.data.economic_table_path = resolve(base, &config.data.economic_table_path);
            config.data.xvx_table_path = resolve(base, &config.data.xvx_table_path);
        }

        config.apply_env_overrides()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(threads) = env::var("WORKER_THREADS") {
            self.service.worker_threads = threads
                .parse()
                .map_err(|_| anyhow!("Invalid WORKER_THREADS value: {}", threads))?;
        }
        if let Ok(concurrency) = env::var("LOAD_CONCURRENCY") {
            self.service.load_concurrency = concurrency
                .parse()
                .map_err(|_| anyhow!("Invalid LOAD_CONCURRENCY value: {}", concurrency))?;
        }

        if let Ok(path) = env::var("ECONOMIC_TABLE_PATH") {
            self.data.economic_table_path = PathBuf::from(path);
        }
        if let Ok(path) = env::var("XVX_TABLE_PATH") {
            self.data.xvx_table_path = PathBuf::from(path);
        }

        if let Ok(policy) = env::var("XVX_MISS_POLICY") {
            self.rating.impact.xvx_miss_policy = policy
                .parse()
                .map_err(|e| anyhow!("Invalid XVX_MISS_POLICY value: {}", e))?;
        }
        if let Ok(policy) = env::var("ECONOMIC_MISS_POLICY") {
            self.rating.impact.economic_miss_policy = policy
                .parse()
                .map_err(|e| anyhow!("Invalid ECONOMIC_MISS_POLICY value: {}", e))?;
        }

        Ok(())
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.load_concurrency == 0 {
        return Err(anyhow!("Load concurrency must be greater than 0"));
    }

    if config.data.economic_table_path.as_os_str().is_empty() {
        return Err(anyhow!("Economic table path cannot be empty"));
    }
    if config.data.xvx_table_path.as_os_str().is_empty() {
        return Err(anyhow!("XvX table path cannot be empty"));
    }

    config.rating.validate()?;

    Ok(())
}
