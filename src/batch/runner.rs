//! Parallel batch runner
//!
//! Matches are independent, so they are rated on a rayon pool with the
//! reference data and calculator shared read-only across workers.

use crate::batch::report::BatchReport;
use crate::error::RatingError;
use crate::metrics::MetricsCollector;
use crate::rating::{MatchRatings, RatingCalculator, RatingFailure};
use crate::reference::ReferenceData;
use crate::types::Match;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Rates batches of matches on a dedicated thread pool
pub struct BatchRunner {
    calculator: Arc<RatingCalculator>,
    reference: Arc<ReferenceData>,
    metrics: Option<Arc<MetricsCollector>>,
    pool: rayon::ThreadPool,
}

impl BatchRunner {
    /// `worker_threads = 0` uses one thread per available core
    pub fn new(
        calculator: Arc<RatingCalculator>,
        reference: Arc<ReferenceData>,
        worker_threads: usize,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_threads)
            .thread_name(|i| format!("rating-worker-{}", i))
            .build()
            .context("Failed to build rating worker pool")?;

        Ok(Self {
            calculator,
            reference,
            metrics: None,
            pool,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn worker_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn rate_one(&self, match_data: &Match) -> MatchRatings {
        let timer = self.metrics.as_ref().map(|m| m.start_timer());
        let outcome = self.calculator.rate_match(match_data, &self.reference);
        if let (Some(metrics), Some(timer)) = (&self.metrics, timer) {
            metrics.record_match(&outcome, timer.stop());
        }
        outcome
    }

    /// Rate every match and collect the results into a report
    ///
    /// Only the first match carrying a given id is rated; later ones are
    /// reported as `duplicate_match` failures.
    pub fn run(&self, matches: &[Match]) -> BatchReport {
        let timer = self.metrics.as_ref().map(|m| m.start_timer());
        info!(
            "Rating {} matches on {} workers",
            matches.len(),
            self.worker_threads()
        );

        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(matches.len());
        let mut rejected = Vec::new();
        for m in matches {
            if seen.insert(m.id.as_str()) {
                unique.push(m);
            } else {
                let err = RatingError::DuplicateMatch {
                    match_id: m.id.clone(),
                };
                warn!("Skipping match: {}", err);
                rejected.push(RatingFailure::new(None, m.id.clone(), &err));
            }
        }

        let outcomes: Vec<MatchRatings> = self
            .pool
            .install(|| unique.par_iter().map(|m| self.rate_one(m)).collect());

        let mut report = BatchReport::new();
        for outcome in outcomes {
            report.add_match(outcome);
        }
        for failure in rejected {
            if let Some(metrics) = &self.metrics {
                metrics.record_rejected(&failure);
            }
            report.failures.push(failure);
        }

        if let (Some(metrics), Some(timer)) = (&self.metrics, timer) {
            metrics.record_batch(timer.stop());
        }

        info!(
            "Computed {} ratings, {} failures, {} data-quality issues",
            report.ratings.len(),
            report.failures.len(),
            report.data_quality.total()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RatingConfig;
    use crate::rating::APR;
    use crate::reference::{AliveState, EconomicMatchupTable, XvxTable};
    use crate::types::{Player, PlayerStats};

    fn player(id: &str, team: &str, rounds_played: u32) -> Player {
        Player {
            id: id.to_string(),
            team: team.to_string(),
            stats: PlayerStats {
                kills: 0,
                deaths: 0,
                assists: Some(1),
                rounds_played,
            },
            name: None,
            tag_line: None,
            is_observer: false,
        }
    }

    fn empty_match(id: &str, rounds_played: u32) -> Match {
        Match {
            id: id.to_string(),
            map_id: None,
            players: vec![player("a", "Blue", rounds_played), player("b", "Red", 4)],
            rounds: Vec::new(),
        }
    }

    fn runner() -> BatchRunner {
        let calculator = Arc::new(RatingCalculator::with_builtins(RatingConfig::default()).unwrap());
        let reference = Arc::new(ReferenceData::new(
            EconomicMatchupTable::uniform(0.5).unwrap(),
            XvxTable::new([(AliveState::new(1, 1), false, 0.5)]).unwrap(),
        ));
        BatchRunner::new(calculator, reference, 2).unwrap()
    }

    #[test]
    fn test_run_collects_ratings_and_failures() {
        let metrics = Arc::new(MetricsCollector::new().unwrap());
        let runner = runner().with_metrics(metrics.clone());
        let matches = vec![empty_match("m1", 4), empty_match("m2", 0)];

        let report = runner.run(&matches);

        assert_eq!(report.ratings.len(), 3);
        assert!(report.ratings.contains_key("a_m1"));
        assert!(report.ratings.contains_key("b_m2"));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].match_id, "m2");
        assert_eq!(metrics.batch().ratings_computed_total.get(), 3);
    }

    #[test]
    fn test_duplicate_match_id_keeps_first() {
        let metrics = Arc::new(MetricsCollector::new().unwrap());
        let runner = runner().with_metrics(metrics.clone());
        let first = empty_match("m1", 4);
        let mut second = empty_match("m1", 4);
        second.players[0].stats.assists = Some(5);

        let report = runner.run(&[first, second, empty_match("m2", 4)]);

        assert_eq!(report.ratings.len(), 4);
        assert_eq!(report.ratings["a_m1"].breakdown.components[APR], 0.25);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].match_id, "m1");
        assert_eq!(report.failures[0].player_id, None);
        assert_eq!(report.failures[0].kind, "duplicate_match");
        assert_eq!(
            metrics
                .batch()
                .matches_processed_total
                .with_label_values(&["rejected"])
                .get(),
            1
        );
    }

    #[test]
    fn test_worker_threads() {
        assert_eq!(runner().worker_threads(), 2);
    }
}
