//! Metrics collection using Prometheus
//!
//! Counters and histograms for batch rating runs. The collector is shared
//! across the worker pool; all metric handles are internally synchronized.

use crate::rating::{DataQualityIssue, MatchRatings, RatingFailure};
use anyhow::{Context, Result};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for rating runs
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    batch_metrics: BatchMetrics,

    quality_metrics: QualityMetrics,

    performance_metrics: PerformanceMetrics,
}

/// Match and rating throughput
#[derive(Clone)]
pub struct BatchMetrics {
    /// Matches processed, labelled by outcome
    pub matches_processed_total: IntCounterVec,

    /// Player-match ratings computed
    pub ratings_computed_total: IntCounter,

    /// Player-match ratings that failed, labelled by error kind
    pub ratings_failed_total: IntCounterVec,

    /// Match files that could not be loaded
    pub load_failures_total: IntCounter,
}

/// Data-quality signals raised during round replay
#[derive(Clone)]
pub struct QualityMetrics {
    pub xvx_clamps_total: IntCounter,
    pub xvx_fallbacks_total: IntCounter,
    pub economic_fallbacks_total: IntCounter,
    pub missing_loadouts_total: IntCounter,
    pub skipped_kills_total: IntCounter,
}

/// Timing
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Time to rate every player of one match
    pub match_rating_duration: Histogram,

    /// Wall time of a complete batch
    pub batch_duration: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let batch_metrics = BatchMetrics::new(&registry)?;
        let quality_metrics = QualityMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            batch_metrics,
            quality_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn batch(&self) -> &BatchMetrics {
        &self.batch_metrics
    }

    pub fn quality(&self) -> &QualityMetrics {
        &self.quality_metrics
    }

    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Record the outcome of rating one match
    pub fn record_match(&self, outcome: &MatchRatings, duration: Duration) {
        let status = if outcome.failures.iter().any(|f| f.player_id.is_none()) {
            "rejected"
        } else if outcome.failures.is_empty() {
            "complete"
        } else {
            "partial"
        };

        self.batch_metrics
            .matches_processed_total
            .with_label_values(&[status])
            .inc();

        self.batch_metrics
            .ratings_computed_total
            .inc_by(outcome.ratings.len() as u64);

        for failure in &outcome.failures {
            self.batch_metrics
                .ratings_failed_total
                .with_label_values(&[failure.kind.as_str()])
                .inc();
        }

        for issue in &outcome.issues {
            self.record_issue(issue);
        }

        self.performance_metrics
            .match_rating_duration
            .observe(duration.as_secs_f64());
    }

    /// Record a match turned away before rating
    pub fn record_rejected(&self, failure: &RatingFailure) {
        self.batch_metrics
            .matches_processed_total
            .with_label_values(&["rejected"])
            .inc();
        self.batch_metrics
            .ratings_failed_total
            .with_label_values(&[failure.kind.as_str()])
            .inc();
    }

    pub fn record_issue(&self, issue: &DataQualityIssue) {
        let counter = match issue {
            DataQualityIssue::XvxClamped { .. } => &self.quality_metrics.xvx_clamps_total,
            DataQualityIssue::XvxFallback { .. } => &self.quality_metrics.xvx_fallbacks_total,
            DataQualityIssue::EconomicFallback { .. } => {
                &self.quality_metrics.economic_fallbacks_total
            }
            DataQualityIssue::MissingLoadout { .. } => {
                &self.quality_metrics.missing_loadouts_total
            }
            DataQualityIssue::SkippedKill { .. } => &self.quality_metrics.skipped_kills_total,
        };
        counter.inc();
    }

    pub fn record_load_failure(&self) {
        self.batch_metrics.load_failures_total.inc();
    }

    pub fn record_batch(&self, duration: Duration) {
        self.performance_metrics
            .batch_duration
            .observe(duration.as_secs_f64());
    }

    /// Render every registered metric in the Prometheus text format
    pub fn export_text(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .context("Failed to encode metrics")?;
        String::from_utf8(buffer).context("Metrics output is not valid UTF-8")
    }

    /// Write the text exposition to `path`
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let text = self.export_text()?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write metrics to {}", path.display()))
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl BatchMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let matches_processed_total = IntCounterVec::new(
            Opts::new(
                "spike_rating_matches_processed_total",
                "Total matches processed",
            ),
            &["status"],
        )?;
        registry.register(Box::new(matches_processed_total.clone()))?;

        let ratings_computed_total = IntCounter::new(
            "spike_rating_ratings_computed_total",
            "Total player-match ratings computed",
        )?;
        registry.register(Box::new(ratings_computed_total.clone()))?;

        let ratings_failed_total = IntCounterVec::new(
            Opts::new(
                "spike_rating_ratings_failed_total",
                "Total player-match ratings that failed",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(ratings_failed_total.clone()))?;

        let load_failures_total = IntCounter::new(
            "spike_rating_load_failures_total",
            "Total match files that failed to load",
        )?;
        registry.register(Box::new(load_failures_total.clone()))?;

        Ok(Self {
            matches_processed_total,
            ratings_computed_total,
            ratings_failed_total,
            load_failures_total,
        })
    }
}

impl QualityMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let xvx_clamps_total = IntCounter::new(
            "spike_rating_xvx_clamps_total",
            "XvX lookups clamped into table coverage",
        )?;
        registry.register(Box::new(xvx_clamps_total.clone()))?;

        let xvx_fallbacks_total = IntCounter::new(
            "spike_rating_xvx_fallbacks_total",
            "XvX lookups resolved to 0.5",
        )?;
        registry.register(Box::new(xvx_fallbacks_total.clone()))?;

        let economic_fallbacks_total = IntCounter::new(
            "spike_rating_economic_fallbacks_total",
            "Economic lookups resolved to a neutral modifier",
        )?;
        registry.register(Box::new(economic_fallbacks_total.clone()))?;

        let missing_loadouts_total = IntCounter::new(
            "spike_rating_missing_loadouts_total",
            "Players with no loadout for a round",
        )?;
        registry.register(Box::new(missing_loadouts_total.clone()))?;

        let skipped_kills_total = IntCounter::new(
            "spike_rating_skipped_kills_total",
            "Kill events skipped during replay",
        )?;
        registry.register(Box::new(skipped_kills_total.clone()))?;

        Ok(Self {
            xvx_clamps_total,
            xvx_fallbacks_total,
            economic_fallbacks_total,
            missing_loadouts_total,
            skipped_kills_total,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let match_rating_duration = Histogram::with_opts(
            HistogramOpts::new(
                "spike_rating_match_rating_duration_seconds",
                "Time to rate all players of a match",
            )
            .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        )?;
        registry.register(Box::new(match_rating_duration.clone()))?;

        let batch_duration = Histogram::with_opts(
            HistogramOpts::new(
                "spike_rating_batch_duration_seconds",
                "Wall time of a rating batch",
            )
            .buckets(vec![0.01, 0.1, 1.0, 5.0, 30.0, 120.0, 600.0]),
        )?;
        registry.register(Box::new(batch_duration.clone()))?;

        Ok(Self {
            match_rating_duration,
            batch_duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::RatingFailure;
    use crate::reference::AliveState;
    use crate::error::RatingError;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        assert_eq!(collector.batch().ratings_computed_total.get(), 0);
        assert_eq!(collector.quality().xvx_clamps_total.get(), 0);
    }

    #[test]
    fn test_record_match() {
        let collector = MetricsCollector::new().unwrap();
        let outcome = MatchRatings {
            match_id: "m1".to_string(),
            ratings: Vec::new(),
            failures: vec![RatingFailure::new(
                Some("p1".to_string()),
                "m1",
                &RatingError::ZeroRoundsPlayed {
                    player_id: "p1".to_string(),
                },
            )],
            issues: vec![
                DataQualityIssue::XvxClamped {
                    round: 3,
                    requested: AliveState::new(6, 5),
                    resolved: AliveState::new(5, 5),
                    spike_planted: false,
                },
                DataQualityIssue::SkippedKill {
                    round: 4,
                    killer: "a".to_string(),
                    victim: "b".to_string(),
                    reason: "unknown victim".to_string(),
                },
            ],
        };

        collector.record_match(&outcome, Duration::from_millis(2));

        assert_eq!(
            collector
                .batch()
                .matches_processed_total
                .with_label_values(&["partial"])
                .get(),
            1
        );
        assert_eq!(
            collector
                .batch()
                .ratings_failed_total
                .with_label_values(&["zero_rounds_played"])
                .get(),
            1
        );
        assert_eq!(collector.quality().xvx_clamps_total.get(), 1);
        assert_eq!(collector.quality().skipped_kills_total.get(), 1);
    }

    #[test]
    fn test_export_text() {
        let collector = MetricsCollector::new().unwrap();
        collector.record_load_failure();
        collector.record_batch(Duration::from_secs(1));

        let text = collector.export_text().unwrap();
        assert!(text.contains("spike_rating_load_failures_total 1"));
        assert!(text.contains("spike_rating_batch_duration_seconds"));
    }

    #[test]
    fn test_metrics_timer() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        let timer = collector.start_timer();

        std::thread::sleep(Duration::from_millis(10));
        let duration = timer.elapsed();

        assert!(duration >= Duration::from_millis(10));

        let final_duration = timer.stop();
        assert!(final_duration >= Duration::from_millis(10));
    }
}
