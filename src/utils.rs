//! Utility functions for the rating tool

use crate::types::PlayerMatchKey;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique run ID
pub fn generate_run_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Split a `"<player>_<match>"` output key back into its parts
///
/// Match ids carry no underscore, so the last one separates the two parts.
pub fn parse_output_key(key: &str) -> Option<PlayerMatchKey> {
    let (player_id, match_id) = key.rsplit_once('_')?;
    if player_id.is_empty() || match_id.is_empty() {
        return None;
    }
    Some(PlayerMatchKey::new(player_id, match_id))
}
