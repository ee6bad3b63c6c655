//! Static reference data
//!
//! The economic matchup matrix and the XvX win-probability table. Both are
//! loaded once at start-up and shared read-only by every calculation.

pub mod economy;
pub mod xvx;

pub use economy::{
    categorize_credits, economic_modifier, EconomicLookup, EconomicMatchupTable, MatchupRecord,
};
pub use xvx::{AliveState, XvxLookup, XvxTable};

use crate::config::DataSettings;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

/// Bundle of the read-only lookup tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceData {
    pub economy: EconomicMatchupTable,
    pub xvx: XvxTable,
}

impl ReferenceData {
    pub fn new(economy: EconomicMatchupTable, xvx: XvxTable) -> Self {
        Self { economy, xvx }
    }

    /// Load both tables from the configured paths
    pub fn from_files(settings: &DataSettings) -> Result<Self> {
        let economy = load_economic_table(&settings.economic_table_path)?;
        let xvx = load_xvx_table(&settings.xvx_table_path)?;

        info!(
            "Loaded reference data: {} economic matchups, {} XvX entries",
            economy.len(),
            xvx.len()
        );

        let data = Self { economy, xvx };
        data.report_gaps();
        Ok(data)
    }

    /// Log holes that calculations would have to resolve through a fallback
    pub fn report_gaps(&self) {
        let missing_pairs = self.economy.missing_pairs();
        if !missing_pairs.is_empty() {
            warn!(
                "Economic table has {} missing category pairs (first: {} vs {})",
                missing_pairs.len(),
                missing_pairs[0].0,
                missing_pairs[0].1
            );
        }

        let missing_states = self.xvx.missing_states(5);
        if !missing_states.is_empty() {
            warn!(
                "XvX table has {} missing states between 1v1 and 5v5 (first: {} spike={})",
                missing_states.len(),
                missing_states[0].0,
                missing_states[0].1
            );
        }
    }
}

pub fn load_economic_table(path: &Path) -> Result<EconomicMatchupTable> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read economic table {}", path.display()))?;
    EconomicMatchupTable::from_json_str(&raw)
        .with_context(|| format!("Failed to parse economic table {}", path.display()))
}

pub fn load_xvx_table(path: &Path) -> Result<XvxTable> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read XvX table {}", path.display()))?;
    XvxTable::from_json_str(&raw)
        .with_context(|| format!("Failed to parse XvX table {}", path.display()))
}
