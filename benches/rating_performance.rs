//! Performance benchmarks for rating calculations

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use spike_rating::config::{DataSettings, RatingConfig};
use spike_rating::rating::{replay_match, MatchContext};
use spike_rating::types::{
    ArmorTier, DamageEvent, EconomyCategory, KillEvent, Loadout, Match, Player, PlayerStats,
    Round,
};
use spike_rating::{BatchRunner, RatingCalculator, ReferenceData};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

const ROUNDS: u32 = 24;

fn reference() -> ReferenceData {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    ReferenceData::from_files(&DataSettings {
        economic_table_path: root.join("data/loadout_cost_analysis.json"),
        xvx_table_path: root.join("data/xvx_data.json"),
    })
    .unwrap()
}

fn id(team: &str, i: usize) -> String {
    format!("{}{}", team, i)
}

/// A full regulation 5v5 match with a deterministic kill feed
fn full_match(match_id: &str) -> Match {
    let mut players = Vec::new();
    for (prefix, team) in [("a", "Blue"), ("d", "Red")] {
        for i in 0..5 {
            players.push(Player {
                id: id(prefix, i),
                team: team.to_string(),
                stats: PlayerStats {
                    kills: 0,
                    deaths: 0,
                    assists: Some((i as u32) * 2),
                    rounds_played: ROUNDS,
                },
                name: None,
                tag_line: None,
                is_observer: false,
            });
        }
    }

    let categories = [
        EconomyCategory::Save,
        EconomyCategory::Eco,
        EconomyCategory::ForceBuy,
        EconomyCategory::FullBuy,
        EconomyCategory::OperatorBuy,
    ];

    let rounds = (0..ROUNDS)
        .map(|number| {
            let n = number as usize;
            let mut loadouts = HashMap::new();
            let mut damage = Vec::new();
            for prefix in ["a", "d"] {
                for i in 0..5 {
                    loadouts.insert(
                        id(prefix, i),
                        Loadout {
                            category: Some(categories[(n + i) % categories.len()]),
                            credits: Some(900 * (i as u32 + 1)),
                            armor: ArmorTier::Heavy,
                        },
                    );
                }
            }

            // Four defenders and three attackers fall, alternating
            let mut kills = Vec::new();
            for k in 0..7usize {
                let (killer, victim) = if k % 2 == 0 {
                    (id("a", (n + k) % 5), id("d", k / 2))
                } else {
                    (id("d", (n + k) % 5), id("a", k / 2))
                };
                damage.push(DamageEvent {
                    source: killer.clone(),
                    receiver: victim.clone(),
                    amount: 140.0 + k as f64,
                });
                kills.push(KillEvent {
                    killer,
                    victim,
                    time_ms: 8_000 + 14_000 * k as u64,
                    victim_armor: ArmorTier::Heavy,
                    spike_death: false,
                    assistants: Vec::new(),
                });
            }

            Round {
                number,
                spike_planted: number % 3 == 0,
                plant_time_ms: (number % 3 == 0).then_some(40_000),
                defuse_time_ms: None,
                planter: None,
                winning_team: None,
                result_code: None,
                kills,
                damage,
                loadouts,
            }
        })
        .collect();

    Match {
        id: match_id.to_string(),
        map_id: Some("Haven".to_string()),
        players,
        rounds,
    }
}

fn bench_match_rating(c: &mut Criterion) {
    let reference = reference();
    let calculator = RatingCalculator::with_builtins(RatingConfig::default()).unwrap();
    let m = full_match("bench");

    c.bench_function("rate_full_match", |b| {
        b.iter(|| black_box(calculator.rate_match(black_box(&m), &reference)));
    });

    c.bench_function("replay_full_match", |b| {
        b.iter(|| {
            black_box(replay_match(black_box(&m), &reference, &calculator.config().impact))
        });
    });

    c.bench_function("build_match_context", |b| {
        b.iter(|| {
            black_box(MatchContext::build(
                black_box(&m),
                &reference,
                &calculator.config().impact,
            ))
        });
    });
}

fn bench_batch(c: &mut Criterion) {
    let calculator = Arc::new(RatingCalculator::with_builtins(RatingConfig::default()).unwrap());
    let runner = BatchRunner::new(calculator, Arc::new(reference()), 0).unwrap();
    let matches: Vec<Match> = (0..64).map(|i| full_match(&format!("m{}", i))).collect();

    c.bench_function("batch_64_matches", |b| {
        b.iter(|| black_box(runner.run(black_box(&matches))));
    });
}

criterion_group!(benches, bench_match_rating, bench_batch);
criterion_main!(benches);
