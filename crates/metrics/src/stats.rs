//! Internal logger counters
//!
//! Always-on counters the logger bumps with relaxed atomics. Slot indices
//! correspond to severity levels, lowest first; the level type itself lives
//! upstream, so this module only sees the index.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Number of per-level counter slots.
pub const LEVEL_SLOTS: usize = 8;

/// Lock-free counters updated on every accepted log call.
#[derive(Debug)]
pub struct LoggerStats {
    per_level: [AtomicU64; LEVEL_SLOTS],
    bytes_written: AtomicU64,
    dropped: AtomicU64,
    errors: AtomicU64,
    started: Instant,
}

/// Point-in-time copy of [`LoggerStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub per_level: [u64; LEVEL_SLOTS],
    pub total: u64,
    pub bytes_written: u64,
    pub dropped: u64,
    pub errors: u64,
    pub uptime: Duration,
}

impl LoggerStats {
    pub fn new() -> Self {
        Self {
            per_level: std::array::from_fn(|_| AtomicU64::new(0)),
            bytes_written: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Count one entry at the given level slot. Out-of-range slots are
    /// ignored rather than panicking.
    pub fn record(&self, level_slot: usize) {
        if let Some(counter) = self.per_level.get(level_slot) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn add_bytes(&self, n: u64) {
        self.bytes_written.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let per_level: [u64; LEVEL_SLOTS] =
            std::array::from_fn(|i| self.per_level[i].load(Ordering::Relaxed));
        StatsSnapshot {
            per_level,
            total: per_level.iter().sum(),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            uptime: self.started.elapsed(),
        }
    }
}

impl Default for LoggerStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "stats_test.rs"]
mod stats_test;
