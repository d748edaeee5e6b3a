//! Severity levels and the bitmask filter.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// Severity, lowest first. `Fatal` terminates the process after emission;
/// `Panic` raises a panic carrying the message.
#[repr(u8)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Notice = 3,
    Warn = 4,
    Error = 5,
    Fatal = 6,
    Panic = 7,
}

impl Level {
    pub const ALL: [Level; 8] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Notice,
        Level::Warn,
        Level::Error,
        Level::Fatal,
        Level::Panic,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Notice => "NOTICE",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
            Level::Panic => "PANIC",
        }
    }

    /// Slot index for per-level counters.
    pub const fn index(self) -> usize {
        self as usize
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown level name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level: {input:?}")]
pub struct ParseLevelError {
    pub input: String,
}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.to_ascii_uppercase().as_str() {
            "TRACE" => Level::Trace,
            "DEBUG" => Level::Debug,
            "INFO" => Level::Info,
            "NOTICE" => Level::Notice,
            "WARN" | "WARNING" => Level::Warn,
            "ERROR" => Level::Error,
            "FATAL" => Level::Fatal,
            "PANIC" => Level::Panic,
            _ => {
                return Err(ParseLevelError {
                    input: s.to_string(),
                })
            }
        };
        Ok(level)
    }
}

impl TryFrom<u8> for Level {
    type Error = ParseLevelError;

    fn try_from(v: u8) -> Result<Self, ParseLevelError> {
        Level::ALL
            .get(v as usize)
            .copied()
            .ok_or_else(|| ParseLevelError {
                input: v.to_string(),
            })
    }
}

/// Precomputed per-level enable mask.
///
/// The hot-path check is one relaxed load and an AND; recomputing the mask
/// on threshold changes is the slow path and nobody cares how slow it is.
#[derive(Debug)]
pub struct LevelFilter {
    mask: AtomicU8,
}

impl LevelFilter {
    /// Enable `min` and everything above it.
    pub fn new(min: Level) -> Self {
        Self {
            mask: AtomicU8::new(mask_from(min)),
        }
    }

    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        self.mask.load(Ordering::Relaxed) & level.bit() != 0
    }

    pub fn set_min_level(&self, min: Level) {
        self.mask.store(mask_from(min), Ordering::Relaxed);
    }

    /// Toggle a single level independent of the threshold.
    pub fn set_enabled(&self, level: Level, on: bool) {
        if on {
            self.mask.fetch_or(level.bit(), Ordering::Relaxed);
        } else {
            self.mask.fetch_and(!level.bit(), Ordering::Relaxed);
        }
    }

    pub fn mask(&self) -> u8 {
        self.mask.load(Ordering::Relaxed)
    }

    pub fn set_mask(&self, mask: u8) {
        self.mask.store(mask, Ordering::Relaxed);
    }
}

fn mask_from(min: Level) -> u8 {
    // All bits at and above the threshold.
    0xFFu8 << (min as u8)
}

#[cfg(test)]
#[path = "level_test.rs"]
mod level_test;
