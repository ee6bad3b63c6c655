//! Test fixtures and builders for integration testing

#![allow(dead_code)]

use spike_rating::config::DataSettings;
use spike_rating::reference::{AliveState, EconomicMatchupTable, XvxTable};
use spike_rating::types::{
    ArmorTier, DamageEvent, EconomyCategory, KillEvent, Loadout, Match, Player, PlayerStats,
    Round, RoundResultCode,
};
use spike_rating::ReferenceData;
use std::collections::HashMap;
use std::path::PathBuf;

pub const ATTACKERS: &str = "Blue";
pub const DEFENDERS: &str = "Red";

/// Path of a file shipped with the crate
pub fn crate_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

/// The reference tables under `data/`
pub fn bundled_data_settings() -> DataSettings {
    DataSettings {
        economic_table_path: crate_path("data/loadout_cost_analysis.json"),
        xvx_table_path: crate_path("data/xvx_data.json"),
    }
}

pub fn bundled_reference() -> ReferenceData {
    ReferenceData::from_files(&bundled_data_settings()).unwrap()
}

/// Small hand-written tables: even economy, a handful of XvX states
pub fn neutral_reference() -> ReferenceData {
    let xvx = XvxTable::new([
        (AliveState::new(3, 3), false, 0.49),
        (AliveState::new(3, 2), false, 0.746),
        (AliveState::new(2, 3), false, 0.25),
        (AliveState::new(2, 2), false, 0.5),
        (AliveState::new(4, 4), false, 0.505),
        (AliveState::new(3, 4), false, 0.27),
        (AliveState::new(4, 3), false, 0.73),
        (AliveState::new(3, 3), true, 0.6),
        (AliveState::new(3, 2), true, 0.8),
    ])
    .unwrap();
    ReferenceData::new(EconomicMatchupTable::uniform(0.5).unwrap(), xvx)
}

pub fn player(id: &str, team: &str) -> Player {
    Player {
        id: id.to_string(),
        team: team.to_string(),
        stats: PlayerStats {
            kills: 0,
            deaths: 0,
            assists: Some(0),
            rounds_played: 1,
        },
        name: None,
        tag_line: None,
        is_observer: false,
    }
}

/// Builder for matches used across integration tests
pub struct MatchBuilder {
    inner: Match,
}

impl MatchBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            inner: Match {
                id: id.to_string(),
                map_id: Some("Ascent".to_string()),
                players: Vec::new(),
                rounds: Vec::new(),
            },
        }
    }

    /// `per_team` players on each side, named `a1..` (Blue) and `d1..` (Red)
    pub fn teams(id: &str, per_team: usize) -> Self {
        let mut builder = Self::new(id);
        for i in 1..=per_team {
            builder = builder.player(&format!("a{}", i), ATTACKERS);
        }
        for i in 1..=per_team {
            builder = builder.player(&format!("d{}", i), DEFENDERS);
        }
        builder
    }

    pub fn player(mut self, id: &str, team: &str) -> Self {
        self.inner.players.push(player(id, team));
        self
    }

    pub fn observer(mut self, id: &str) -> Self {
        let mut observer = player(id, "Neutral");
        observer.is_observer = true;
        self.inner.players.push(observer);
        self
    }

    pub fn stats(mut self, id: &str, assists: u32, rounds_played: u32) -> Self {
        if let Some(p) = self.inner.players.iter_mut().find(|p| p.id == id) {
            p.stats.assists = Some(assists);
            p.stats.rounds_played = rounds_played;
        }
        self
    }

    /// Set rounds played for every player
    pub fn rounds_played(mut self, rounds_played: u32) -> Self {
        for p in &mut self.inner.players {
            p.stats.rounds_played = rounds_played;
        }
        self
    }

    pub fn round(mut self, round: RoundBuilder) -> Self {
        self.inner.rounds.push(round.build());
        self
    }

    pub fn build(self) -> Match {
        self.inner
    }
}

/// Builder for a single round
pub struct RoundBuilder {
    inner: Round,
}

impl RoundBuilder {
    pub fn new(number: u32) -> Self {
        Self {
            inner: Round {
                number,
                spike_planted: false,
                plant_time_ms: None,
                defuse_time_ms: None,
                planter: None,
                winning_team: None,
                result_code: None,
                kills: Vec::new(),
                damage: Vec::new(),
                loadouts: HashMap::new(),
            },
        }
    }

    pub fn planted(mut self, planter: &str, time_ms: u64) -> Self {
        self.inner.spike_planted = true;
        self.inner.planter = Some(planter.to_string());
        self.inner.plant_time_ms = Some(time_ms);
        self
    }

    pub fn won_by(mut self, team: &str, code: RoundResultCode) -> Self {
        self.inner.winning_team = Some(team.to_string());
        self.inner.result_code = Some(code);
        self
    }

    pub fn defused_at(mut self, time_ms: u64) -> Self {
        self.inner.defuse_time_ms = Some(time_ms);
        self
    }

    pub fn kill(self, killer: &str, victim: &str, time_ms: u64) -> Self {
        self.kill_with_armor(killer, victim, time_ms, ArmorTier::None)
    }

    pub fn kill_with_armor(
        mut self,
        killer: &str,
        victim: &str,
        time_ms: u64,
        armor: ArmorTier,
    ) -> Self {
        self.inner.kills.push(KillEvent {
            killer: killer.to_string(),
            victim: victim.to_string(),
            time_ms,
            victim_armor: armor,
            spike_death: false,
            assistants: Vec::new(),
        });
        self
    }

    pub fn spike_death(mut self, victim: &str, time_ms: u64) -> Self {
        self.inner.kills.push(KillEvent {
            killer: victim.to_string(),
            victim: victim.to_string(),
            time_ms,
            victim_armor: ArmorTier::None,
            spike_death: true,
            assistants: Vec::new(),
        });
        self
    }

    pub fn damage(mut self, source: &str, receiver: &str, amount: f64) -> Self {
        self.inner.damage.push(DamageEvent {
            source: source.to_string(),
            receiver: receiver.to_string(),
            amount,
        });
        self
    }

    pub fn loadout(mut self, player_id: &str, category: EconomyCategory) -> Self {
        self.inner.loadouts.insert(
            player_id.to_string(),
            Loadout {
                category: Some(category),
                credits: None,
                armor: ArmorTier::Heavy,
            },
        );
        self
    }

    /// Same loadout category for every listed player
    pub fn loadouts(mut self, players: &[&str], category: EconomyCategory) -> Self {
        for id in players {
            self = self.loadout(id, category);
        }
        self
    }

    pub fn build(self) -> Round {
        self.inner
    }
}
