//! Metrics for rating runs
//!
//! Prometheus counters for throughput and data-quality signals, exported as
//! text at the end of a run.

pub mod collector;

pub use collector::{
    BatchMetrics, MetricsCollector, MetricsTimer, PerformanceMetrics, QualityMetrics,
};
