//! Property tests for the rating components and normalization

mod fixtures;

use approx::relative_eq;
use fixtures::{bundled_reference, MatchBuilder, RoundBuilder};
use proptest::prelude::*;
use spike_rating::config::{NormalizationParams, RatingConfig};
use spike_rating::rating::{adra, apr, DEATH_CONTRIB, KILL_CONTRIB};
use spike_rating::types::{ArmorTier, EconomyCategory};
use spike_rating::RatingCalculator;

fn armor() -> impl Strategy<Value = ArmorTier> {
    prop_oneof![
        Just(ArmorTier::None),
        Just(ArmorTier::Light),
        Just(ArmorTier::Regen),
        Just(ArmorTier::Heavy),
    ]
}

fn category() -> impl Strategy<Value = EconomyCategory> {
    proptest::sample::select(EconomyCategory::ALL.to_vec())
}

/// (killer index, victim index, time) with indices into a 5v5 roster
fn kill_feed() -> impl Strategy<Value = Vec<(usize, usize, u64)>> {
    prop::collection::vec((0usize..10, 0usize..10, 0u64..130_000), 0..12)
}

fn roster_id(index: usize) -> String {
    if index < 5 {
        format!("a{}", index + 1)
    } else {
        format!("d{}", index - 4)
    }
}

proptest! {
    #[test]
    fn test_adra_is_never_negative(
        damage in 0.0f64..5_000.0,
        victims in prop::collection::vec(armor(), 0..40),
        rounds in 1u32..40,
    ) {
        let value = adra("p", damage, victims, rounds).unwrap();
        prop_assert!(value >= 0.0);
    }

    #[test]
    fn test_apr_scales_linearly(assists in 0u32..60, rounds in 1u32..40, factor in 1u32..5) {
        let base = apr("p", assists, rounds).unwrap();
        let scaled = apr("p", assists * factor, rounds).unwrap();
        prop_assert!(relative_eq!(scaled, base * f64::from(factor), epsilon = 1e-9));
    }

    #[test]
    fn test_adra_scales_linearly_without_kills(
        damage in 0.0f64..5_000.0,
        rounds in 1u32..40,
        factor in 1.0f64..5.0,
    ) {
        let base = adra("p", damage, Vec::new(), rounds).unwrap();
        let scaled = adra("p", damage * factor, Vec::new(), rounds).unwrap();
        prop_assert!(relative_eq!(scaled, base * factor, epsilon = 1e-9, max_relative = 1e-12));
        prop_assert!(relative_eq!(base, damage / f64::from(rounds), epsilon = 1e-9));
    }

    #[test]
    fn test_zscore_round_trip(
        x in -1_000.0f64..1_000.0,
        mean in -100.0f64..100.0,
        std in 0.01f64..50.0,
    ) {
        let params = NormalizationParams::new(mean, std);
        let normalized = params.normalize("c", x).unwrap();
        prop_assert!(relative_eq!(params.denormalize(normalized), x, epsilon = 1e-9));
    }

    #[test]
    fn test_impact_signs_hold_for_any_kill_feed(
        feeds in prop::collection::vec(kill_feed(), 1..4),
        economy in prop::collection::vec(category(), 10),
    ) {
        let mut builder = MatchBuilder::teams("prop", 5).rounds_played(feeds.len() as u32);
        for (number, feed) in feeds.iter().enumerate() {
            let mut round = RoundBuilder::new(number as u32);
            for (index, category) in economy.iter().enumerate() {
                round = round.loadout(&roster_id(index), *category);
            }
            for (killer, victim, time_ms) in feed {
                round = round.kill(&roster_id(*killer), &roster_id(*victim), *time_ms);
            }
            builder = builder.round(round);
        }
        let m = builder.build();

        let calculator = RatingCalculator::with_builtins(RatingConfig::default()).unwrap();
        let ratings = calculator.rate_match(&m, &bundled_reference());

        prop_assert_eq!(ratings.ratings.len() + ratings.failures.len(), 10);
        for rating in &ratings.ratings {
            prop_assert!(rating.breakdown.components[KILL_CONTRIB] >= 0.0);
            prop_assert!(rating.breakdown.components[DEATH_CONTRIB] <= 0.0);
            prop_assert!(rating.breakdown.rating.is_finite());
        }
    }
}
