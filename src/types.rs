//! Common types used throughout the rating pipeline

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Unique identifier for players
pub type PlayerId = String;

/// Unique identifier for matches
pub type MatchId = String;

/// Team label as it appears in match records (e.g. "Red", "Blue")
pub type TeamId = String;

/// Side a team plays in a given round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Attack,
    Defense,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Attack => Side::Defense,
            Side::Defense => Side::Attack,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Attack => write!(f, "atk"),
            Side::Defense => write!(f, "def"),
        }
    }
}

/// Economic spend tier of a loadout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EconomyCategory {
    #[serde(rename = "Save Round")]
    Save,
    #[serde(rename = "Eco Round")]
    Eco,
    #[serde(rename = "Force Buy")]
    ForceBuy,
    #[serde(rename = "Anti-Eco")]
    AntiEco,
    #[serde(rename = "Full Buy")]
    FullBuy,
    #[serde(rename = "Operator Buy")]
    OperatorBuy,
}

impl EconomyCategory {
    pub const ALL: [EconomyCategory; 6] = [
        EconomyCategory::Save,
        EconomyCategory::Eco,
        EconomyCategory::ForceBuy,
        EconomyCategory::AntiEco,
        EconomyCategory::FullBuy,
        EconomyCategory::OperatorBuy,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EconomyCategory::Save => "Save Round",
            EconomyCategory::Eco => "Eco Round",
            EconomyCategory::ForceBuy => "Force Buy",
            EconomyCategory::AntiEco => "Anti-Eco",
            EconomyCategory::FullBuy => "Full Buy",
            EconomyCategory::OperatorBuy => "Operator Buy",
        }
    }
}

impl std::fmt::Display for EconomyCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for EconomyCategory {
    type Err = String;

    /// Accepts the table labels ("Full Buy") and the short forms ("full_buy", "Full")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        match normalized.as_str() {
            "save" | "saveround" => Ok(EconomyCategory::Save),
            "eco" | "ecoround" => Ok(EconomyCategory::Eco),
            "force" | "forcebuy" => Ok(EconomyCategory::ForceBuy),
            "antieco" => Ok(EconomyCategory::AntiEco),
            "full" | "fullbuy" => Ok(EconomyCategory::FullBuy),
            "operator" | "operatorbuy" | "op" => Ok(EconomyCategory::OperatorBuy),
            _ => Err(format!("unknown economy category: {}", s)),
        }
    }
}

/// Armor worn by a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ArmorTier {
    #[default]
    None,
    Light,
    Regen,
    Heavy,
}

impl ArmorTier {
    /// Damage needed to kill a full-health player wearing this armor
    pub fn expected_kill_damage(self) -> f64 {
        match self {
            ArmorTier::None => 100.0,
            ArmorTier::Light | ArmorTier::Regen => 125.0,
            ArmorTier::Heavy => 150.0,
        }
    }
}

impl FromStr for ArmorTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(ArmorTier::None),
            "light" => Ok(ArmorTier::Light),
            "regen" => Ok(ArmorTier::Regen),
            "heavy" => Ok(ArmorTier::Heavy),
            other => Err(format!("unknown armor tier: {}", other)),
        }
    }
}

/// How a round ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundResultCode {
    Elimination,
    Defuse,
    Detonate,
    Other(String),
}

impl From<&str> for RoundResultCode {
    fn from(code: &str) -> Self {
        match code {
            "Elimination" => RoundResultCode::Elimination,
            "Defuse" | "Defused" => RoundResultCode::Defuse,
            "Detonate" | "Detonated" => RoundResultCode::Detonate,
            other => RoundResultCode::Other(other.to_string()),
        }
    }
}

/// Per-match aggregate stats for a player
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub kills: u32,
    pub deaths: u32,
    /// `None` when the match record carried no assist count
    pub assists: Option<u32>,
    pub rounds_played: u32,
}

/// A participant in a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub team: TeamId,
    pub stats: PlayerStats,
    pub name: Option<String>,
    pub tag_line: Option<String>,
    pub is_observer: bool,
}

/// Equipment state of a player for one round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Loadout {
    pub category: Option<EconomyCategory>,
    pub credits: Option<u32>,
    pub armor: ArmorTier,
}

/// A single kill within a round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillEvent {
    pub killer: PlayerId,
    pub victim: PlayerId,
    pub time_ms: u64,
    pub victim_armor: ArmorTier,
    /// Death caused by the spike detonation rather than an opponent
    pub spike_death: bool,
    pub assistants: Vec<PlayerId>,
}

/// Damage dealt by one player to another within a round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageEvent {
    pub source: PlayerId,
    pub receiver: PlayerId,
    pub amount: f64,
}

/// One round of a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub number: u32,
    pub spike_planted: bool,
    pub plant_time_ms: Option<u64>,
    pub defuse_time_ms: Option<u64>,
    pub planter: Option<PlayerId>,
    pub winning_team: Option<TeamId>,
    pub result_code: Option<RoundResultCode>,
    pub kills: Vec<KillEvent>,
    pub damage: Vec<DamageEvent>,
    pub loadouts: HashMap<PlayerId, Loadout>,
}

/// A complete match record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub map_id: Option<String>,
    pub players: Vec<Player>,
    pub rounds: Vec<Round>,
}

impl Match {
    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn team_of(&self, player_id: &str) -> Option<&TeamId> {
        self.player(player_id).map(|p| &p.team)
    }

    /// Players that take part in the rating (observers excluded)
    pub fn rated_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| !p.is_observer)
    }

    /// Distinct team labels in roster order
    pub fn teams(&self) -> Vec<TeamId> {
        let mut teams: Vec<TeamId> = Vec::new();
        for player in self.rated_players() {
            if !teams.contains(&player.team) {
                teams.push(player.team.clone());
            }
        }
        teams
    }

    /// Non-observer roster size of a team
    pub fn roster_size(&self, team: &str) -> usize {
        self.rated_players().filter(|p| p.team == team).count()
    }
}

/// Identity of one player's rating within one match
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerMatchKey {
    pub player_id: PlayerId,
    pub match_id: MatchId,
}

impl PlayerMatchKey {
    pub fn new(player_id: impl Into<PlayerId>, match_id: impl Into<MatchId>) -> Self {
        Self {
            player_id: player_id.into(),
            match_id: match_id.into(),
        }
    }
}

impl std::fmt::Display for PlayerMatchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.player_id, self.match_id)
    }
}
