//! Pluggable metrics collection
//!
//! The collector trait is the seam between the logger and whatever metrics
//! backend the host application runs. The default implementation keeps
//! everything in memory and is mainly useful for tests and small tools;
//! production deployments are expected to bridge to their own pipeline.

use std::collections::HashMap;

use parking_lot::RwLock;

/// Maximum samples retained per histogram series. Older samples are
/// discarded once the window is full so memory stays bounded under
/// sustained load.
const HISTOGRAM_WINDOW: usize = 1024;

/// Receiver for logging activity metrics.
///
/// All methods are fire-and-forget and must not block: they are invoked
/// synchronously on the logging hot path. Tags arrive as borrowed
/// key/value pairs; implementations that need to retain them must copy.
pub trait MetricsCollector: Send + Sync {
    /// Count one log entry at the given level (upper-case level name).
    fn increment_counter(&self, level: &str, tags: &[(&str, &str)]);

    /// Record one sample into a named histogram series.
    fn record_histogram(&self, name: &str, value: f64, tags: &[(&str, &str)]);

    /// Set a named gauge to the given value.
    fn record_gauge(&self, name: &str, value: f64, tags: &[(&str, &str)]);
}

/// Collector that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCollector;

impl MetricsCollector for NoopCollector {
    fn increment_counter(&self, _level: &str, _tags: &[(&str, &str)]) {}
    fn record_histogram(&self, _name: &str, _value: f64, _tags: &[(&str, &str)]) {}
    fn record_gauge(&self, _name: &str, _value: f64, _tags: &[(&str, &str)]) {}
}

/// Summary statistics for one histogram series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p95: f64,
}

/// In-memory collector backed by `parking_lot::RwLock` maps.
///
/// Series are keyed by `name{k=v,...}` with tags in caller order, so the
/// same tags in a different order produce a distinct series.
#[derive(Debug, Default)]
pub struct DefaultMetricsCollector {
    counters: RwLock<HashMap<String, u64>>,
    histograms: RwLock<HashMap<String, Vec<f64>>>,
    gauges: RwLock<HashMap<String, f64>>,
}

impl DefaultMetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter series, 0 if never incremented.
    pub fn counter(&self, level: &str, tags: &[(&str, &str)]) -> u64 {
        let key = series_key(level, tags);
        self.counters.read().get(&key).copied().unwrap_or(0)
    }

    /// Current value of a gauge series, if any sample was recorded.
    pub fn gauge(&self, name: &str, tags: &[(&str, &str)]) -> Option<f64> {
        let key = series_key(name, tags);
        self.gauges.read().get(&key).copied()
    }

    /// Summary of a histogram series, `None` when the series is empty.
    pub fn histogram_stats(&self, name: &str, tags: &[(&str, &str)]) -> Option<HistogramStats> {
        let key = series_key(name, tags);
        let map = self.histograms.read();
        let samples = map.get(&key)?;
        if samples.is_empty() {
            return None;
        }

        let mut sorted = samples.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let count = sorted.len();
        let sum: f64 = sorted.iter().sum();
        let p95_idx = ((count as f64) * 0.95).ceil() as usize;
        let p95 = sorted[p95_idx.saturating_sub(1).min(count - 1)];

        Some(HistogramStats {
            count,
            min: sorted[0],
            max: sorted[count - 1],
            mean: sum / count as f64,
            p95,
        })
    }

    /// Drop all recorded series.
    pub fn reset(&self) {
        self.counters.write().clear();
        self.histograms.write().clear();
        self.gauges.write().clear();
    }
}

impl MetricsCollector for DefaultMetricsCollector {
    fn increment_counter(&self, level: &str, tags: &[(&str, &str)]) {
        let key = series_key(level, tags);
        *self.counters.write().entry(key).or_insert(0) += 1;
    }

    fn record_histogram(&self, name: &str, value: f64, tags: &[(&str, &str)]) {
        let key = series_key(name, tags);
        let mut map = self.histograms.write();
        let samples = map.entry(key).or_default();
        if samples.len() >= HISTOGRAM_WINDOW {
            samples.remove(0);
        }
        samples.push(value);
    }

    fn record_gauge(&self, name: &str, value: f64, tags: &[(&str, &str)]) {
        let key = series_key(name, tags);
        self.gauges.write().insert(key, value);
    }
}

fn series_key(name: &str, tags: &[(&str, &str)]) -> String {
    if tags.is_empty() {
        return name.to_string();
    }
    let mut key = String::with_capacity(name.len() + tags.len() * 16);
    key.push_str(name);
    key.push('{');
    for (i, (k, v)) in tags.iter().enumerate() {
        if i > 0 {
            key.push(',');
        }
        key.push_str(k);
        key.push('=');
        key.push_str(v);
    }
    key.push('}');
    key
}

#[cfg(test)]
#[path = "collector_test.rs"]
mod collector_test;
