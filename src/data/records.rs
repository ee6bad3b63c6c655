//! Match record wire format
//!
//! Serde mirrors of the match JSON (`matchInfo`, `players`, `roundResults`)
//! and their conversion into validated domain types.

use crate::error::{RatingError, Result};
use crate::types::{
    ArmorTier, DamageEvent, EconomyCategory, KillEvent, Loadout, Match, Player, PlayerStats,
    Round, RoundResultCode,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Finishing damage type of a spike detonation
pub const SPIKE_DAMAGE_TYPE: &str = "Bomb";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub match_info: MatchInfoRecord,
    #[serde(default)]
    pub players: Vec<PlayerRecord>,
    #[serde(default)]
    pub round_results: Vec<RoundResultRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfoRecord {
    pub match_id: String,
    #[serde(default)]
    pub map_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub puuid: String,
    pub team_id: String,
    #[serde(default)]
    pub game_name: Option<String>,
    #[serde(default)]
    pub tag_line: Option<String>,
    #[serde(default)]
    pub is_observer: bool,
    #[serde(default)]
    pub stats: Option<PlayerStatsRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatsRecord {
    #[serde(default)]
    pub kills: u32,
    #[serde(default)]
    pub deaths: u32,
    #[serde(default)]
    pub assists: Option<u32>,
    #[serde(default)]
    pub rounds_played: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResultRecord {
    pub round_num: u32,
    #[serde(default)]
    pub plant_round_time: Option<u64>,
    #[serde(default)]
    pub defuse_round_time: Option<u64>,
    #[serde(default)]
    pub bomb_planter: Option<String>,
    #[serde(default)]
    pub winning_team: Option<String>,
    #[serde(default)]
    pub round_result_code: Option<String>,
    #[serde(default)]
    pub player_stats: Vec<RoundPlayerStatsRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundPlayerStatsRecord {
    pub puuid: String,
    #[serde(default)]
    pub kills: Vec<KillRecord>,
    #[serde(default)]
    pub damage: Vec<DamageRecord>,
    #[serde(default)]
    pub economy: Option<EconomyRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KillRecord {
    /// Falls back to the enclosing player when absent
    #[serde(default)]
    pub killer: Option<String>,
    pub victim: String,
    pub time_since_round_start_millis: u64,
    #[serde(default)]
    pub finishing_damage: Option<FinishingDamageRecord>,
    #[serde(default)]
    pub assistants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishingDamageRecord {
    pub damage_type: String,
    #[serde(default)]
    pub damage_item: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageRecord {
    pub receiver: String,
    pub damage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EconomyRecord {
    #[serde(default)]
    pub loadout_value: Option<u32>,
    #[serde(default)]
    pub loadout_category: Option<String>,
    #[serde(default)]
    pub armor: Option<String>,
}

impl TryFrom<MatchRecord> for Match {
    type Error = RatingError;

    fn try_from(record: MatchRecord) -> Result<Self> {
        let match_id = record.match_info.match_id.trim().to_string();
        if match_id.is_empty() {
            return Err(RatingError::InvalidInput {
                match_id,
                reason: "missing matchInfo.matchId".to_string(),
            });
        }
        let invalid = |reason: String| RatingError::InvalidInput {
            match_id: match_id.clone(),
            reason,
        };

        let mut rounds = Vec::with_capacity(record.round_results.len());
        for round in record.round_results {
            rounds.push(convert_round(round).map_err(invalid)?);
        }

        let mut seen = HashSet::new();
        let mut players = Vec::with_capacity(record.players.len());
        for player in record.players {
            if player.puuid.is_empty() {
                return Err(invalid("player with empty puuid".to_string()));
            }
            if !seen.insert(player.puuid.clone()) {
                return Err(invalid(format!("duplicate player {}", player.puuid)));
            }

            let stats = player.stats.unwrap_or_default();
            let rounds_played = stats.rounds_played.unwrap_or_else(|| {
                rounds
                    .iter()
                    .filter(|r| r.loadouts.contains_key(&player.puuid))
                    .count() as u32
            });

            players.push(Player {
                id: player.puuid,
                team: player.team_id,
                stats: PlayerStats {
                    kills: stats.kills,
                    deaths: stats.deaths,
                    assists: stats.assists,
                    rounds_played,
                },
                name: player.game_name,
                tag_line: player.tag_line,
                is_observer: player.is_observer,
            });
        }

        Ok(Match {
            id: match_id,
            map_id: record.match_info.map_id,
            players,
            rounds,
        })
    }
}

fn convert_round(record: RoundResultRecord) -> std::result::Result<Round, String> {
    let number = record.round_num;
    let mut loadouts = HashMap::new();
    for stats in &record.player_stats {
        let economy = stats.economy.clone().unwrap_or_default();
        let category = economy
            .loadout_category
            .as_deref()
            .map(str::parse::<EconomyCategory>)
            .transpose()
            .map_err(|e| format!("round {}: {}", number, e))?;
        let armor = economy
            .armor
            .as_deref()
            .map(str::parse::<ArmorTier>)
            .transpose()
            .map_err(|e| format!("round {}: {}", number, e))?
            .unwrap_or_default();

        loadouts.insert(
            stats.puuid.clone(),
            Loadout {
                category,
                credits: economy.loadout_value,
                armor,
            },
        );
    }

    let mut kills = Vec::new();
    let mut damage = Vec::new();
    for stats in record.player_stats {
        for kill in stats.kills {
            let spike_death = kill
                .finishing_damage
                .as_ref()
                .is_some_and(|d| d.damage_type == SPIKE_DAMAGE_TYPE);
            let victim_armor = loadouts
                .get(&kill.victim)
                .map(|l| l.armor)
                .unwrap_or_default();
            kills.push(KillEvent {
                killer: kill.killer.unwrap_or_else(|| stats.puuid.clone()),
                victim: kill.victim,
                time_ms: kill.time_since_round_start_millis,
                victim_armor,
                spike_death,
                assistants: kill.assistants,
            });
        }

        for event in stats.damage {
            if !event.damage.is_finite() || event.damage < 0.0 {
                return Err(format!(
                    "round {}: invalid damage {} from {}",
                    number, event.damage, stats.puuid
                ));
            }
            damage.push(DamageEvent {
                source: stats.puuid.clone(),
                receiver: event.receiver,
                amount: event.damage,
            });
        }
    }

    Ok(Round {
        number,
        spike_planted: record.plant_round_time.is_some() || record.bomb_planter.is_some(),
        plant_time_ms: record.plant_round_time,
        defuse_time_ms: record.defuse_round_time,
        planter: record.bomb_planter.filter(|p| !p.is_empty()),
        winning_team: record.winning_team,
        result_code: record.round_result_code.as_deref().map(RoundResultCode::from),
        kills,
        damage,
        loadouts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATCH: &str = r#"{
        "matchInfo": {"matchId": "m-1", "mapId": "/Game/Maps/Ascent"},
        "players": [
            {"puuid": "a", "teamId": "Blue", "gameName": "Alpha", "tagLine": "EU1",
             "stats": {"kills": 1, "deaths": 0, "assists": 0, "roundsPlayed": 1}},
            {"puuid": "b", "teamId": "Red",
             "stats": {"kills": 0, "deaths": 1, "assists": 0, "roundsPlayed": 1}},
            {"puuid": "caster", "teamId": "Neutral", "isObserver": true}
        ],
        "roundResults": [{
            "roundNum": 0,
            "plantRoundTime": 30000,
            "bombPlanter": "a",
            "winningTeam": "Blue",
            "roundResultCode": "Detonate",
            "playerStats": [
                {"puuid": "a",
                 "kills": [{"victim": "b", "timeSinceRoundStartMillis": 42000,
                            "finishingDamage": {"damageType": "Weapon"}}],
                 "damage": [{"receiver": "b", "damage": 150, "headshots": 1}],
                 "economy": {"loadoutValue": 3900, "armor": "Heavy"}},
                {"puuid": "b", "economy": {"loadoutValue": 800, "armor": "Light"}}
            ]
        }]
    }"#;

    #[test]
    fn test_convert_match() {
        let record: MatchRecord = serde_json::from_str(MATCH).unwrap();
        let m = Match::try_from(record).unwrap();

        assert_eq!(m.id, "m-1");
        assert_eq!(m.players.len(), 3);
        assert_eq!(m.rated_players().count(), 2);
        assert_eq!(m.players[0].name.as_deref(), Some("Alpha"));

        let round = &m.rounds[0];
        assert!(round.spike_planted);
        assert_eq!(round.planter.as_deref(), Some("a"));
        assert_eq!(round.result_code, Some(RoundResultCode::Detonate));
        assert_eq!(round.kills.len(), 1);
        assert_eq!(round.kills[0].killer, "a");
        assert_eq!(round.kills[0].victim_armor, ArmorTier::Light);
        assert!(!round.kills[0].spike_death);
        assert_eq!(round.damage[0].amount, 150.0);
        assert_eq!(round.loadouts["a"].credits, Some(3900));
    }

    #[test]
    fn test_spike_detonation_kill() {
        let json = MATCH.replace("\"Weapon\"", "\"Bomb\"");
        let record: MatchRecord = serde_json::from_str(&json).unwrap();
        let m = Match::try_from(record).unwrap();
        assert!(m.rounds[0].kills[0].spike_death);
    }

    #[test]
    fn test_malformed_armor_is_invalid_input() {
        let json = MATCH.replace("\"Light\"", "\"Kevlar\"");
        let record: MatchRecord = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            Match::try_from(record),
            Err(RatingError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_malformed_category_is_invalid_input() {
        let json = MATCH.replace(
            "\"loadoutValue\": 800,",
            "\"loadoutValue\": 800, \"loadoutCategory\": \"Bonus Round\",",
        );
        let record: MatchRecord = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            Match::try_from(record),
            Err(RatingError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_duplicate_player_rejected() {
        let mut record: MatchRecord = serde_json::from_str(MATCH).unwrap();
        let duplicate = record.players[0].clone();
        record.players.push(duplicate);
        assert!(Match::try_from(record).is_err());
    }

    #[test]
    fn test_missing_rounds_played_counts_rounds() {
        let mut record: MatchRecord = serde_json::from_str(MATCH).unwrap();
        record.players[1].stats = None;
        let m = Match::try_from(record).unwrap();
        assert_eq!(m.players[1].stats.rounds_played, 1);
        assert_eq!(m.players[2].stats.rounds_played, 0);
    }

    #[test]
    fn test_missing_stats_leave_assists_unknown() {
        let mut record: MatchRecord = serde_json::from_str(MATCH).unwrap();
        record.players[1].stats = None;
        let m = Match::try_from(record).unwrap();
        assert_eq!(m.players[0].stats.assists, Some(0));
        assert_eq!(m.players[1].stats.assists, None);

        let json = MATCH.replace("\"deaths\": 1, \"assists\": 0,", "\"deaths\": 1,");
        let record: MatchRecord = serde_json::from_str(&json).unwrap();
        let m = Match::try_from(record).unwrap();
        assert_eq!(m.players[1].stats.assists, None);
        assert_eq!(m.players[1].stats.deaths, 1);
    }
}
