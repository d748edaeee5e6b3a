//! Rate-limited internal error reporting
//!
//! A failing sink can fail thousands of times per second. The throttle
//! emits at most one `tracing` event per interval and carries the count of
//! suppressed occurrences in the next emitted event, so the failure rate
//! stays visible without flooding the host's diagnostics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Default minimum interval between emitted events.
pub const DEFAULT_THROTTLE_INTERVAL: Duration = Duration::from_secs(10);

pub struct ErrorThrottle {
    min_interval: Duration,
    last_emit: Mutex<Option<Instant>>,
    suppressed: AtomicU64,
    total: AtomicU64,
}

impl ErrorThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_emit: Mutex::new(None),
            suppressed: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    /// Record a failure; emits a `tracing::error!` event unless one was
    /// emitted within the interval. Returns whether the event was emitted.
    pub fn record(&self, what: &str, err: &dyn std::fmt::Display) -> bool {
        self.suppressed.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);

        let should_emit = {
            let mut last = self.last_emit.lock();
            let now = Instant::now();
            match *last {
                Some(prev) if now.duration_since(prev) < self.min_interval => false,
                _ => {
                    *last = Some(now);
                    true
                }
            }
        };

        if should_emit {
            let batch = self.suppressed.swap(0, Ordering::Relaxed);
            let total = self.total.load(Ordering::Relaxed);
            if batch > 1 {
                tracing::error!(
                    error = %err,
                    suppressed = batch - 1,
                    total_errors = total,
                    "{what} (throttled)"
                );
            } else {
                tracing::error!(error = %err, total_errors = total, "{what}");
            }
        }
        should_emit
    }

    pub fn total_errors(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

impl Default for ErrorThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_THROTTLE_INTERVAL)
    }
}
