//! Deterministic 1-of-N sampling.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counter-based sampling gate: with rate N, every Nth call passes.
///
/// Deterministic by design so load tests and replay produce the same
/// accepted set. A rate of 0 or 1 passes everything.
#[derive(Debug)]
pub struct SamplingGate {
    rate: u32,
    counter: AtomicU64,
}

impl SamplingGate {
    pub fn new(rate: u32) -> Self {
        Self {
            rate,
            counter: AtomicU64::new(0),
        }
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Returns whether this call is part of the sample.
    #[inline]
    pub fn sample(&self) -> bool {
        if self.rate <= 1 {
            return true;
        }
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        n % u64::from(self.rate) == 0
    }

    /// Calls observed so far, sampled or not.
    pub fn observed(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[path = "sampler_test.rs"]
mod sampler_test;
