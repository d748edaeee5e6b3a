//! Metrics for the logging pipeline
//!
//! Two layers live here:
//!
//! - [`MetricsCollector`] is the pluggable boundary: anything that wants to
//!   observe logging activity (entries per level, histograms, gauges)
//!   implements it. Implementations must be non-blocking; collectors are
//!   called on the logging hot path.
//! - [`LoggerStats`] is the always-on internal counter block the logger
//!   updates with relaxed atomics regardless of whether a collector is
//!   installed. Readers take a [`StatsSnapshot`] copy.

mod collector;
mod stats;

pub use collector::{
    DefaultMetricsCollector, HistogramStats, MetricsCollector, NoopCollector,
};
pub use stats::{LoggerStats, StatsSnapshot, LEVEL_SLOTS};
