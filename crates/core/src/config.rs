//! Logger configuration and validation.

use crate::entry::OwnedValue;
use crate::level::Level;

/// Invalid logger configuration, rejected at construction.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("sampling enabled with rate 0")]
    ZeroSampleRate,

    #[error("async mode enabled with 0 workers")]
    NoWorkers,

    #[error("async mode enabled with queue size 0")]
    EmptyQueue,

    #[error("entry pool size must be at least 1")]
    EmptyPool,

    #[error("maximum message length must be at least 1")]
    ZeroMessageLength,

    #[error("no formatter configured")]
    MissingFormatter,

    #[error("no sink configured")]
    MissingSink,
}

/// Static configuration for a [`crate::Logger`].
///
/// Built with `with_*` methods and validated once when the logger is
/// constructed; invalid combinations never produce a half-working logger.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: Level,
    pub sampling: bool,
    pub sample_rate: u32,
    pub async_mode: bool,
    pub workers: usize,
    pub queue_size: usize,
    pub pool_size: usize,
    pub max_message_len: usize,
    pub capture_stack_trace: bool,
    /// Skip the per-logger write mutex. Callers accept that entries from
    /// different threads may interleave at the sink.
    pub disable_locking: bool,
    pub hostname: String,
    pub application: String,
    pub version: String,
    pub environment: String,
    pub global_fields: Vec<(String, OwnedValue)>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: Level::Info,
            sampling: false,
            sample_rate: 1,
            async_mode: false,
            workers: 2,
            queue_size: 8192,
            pool_size: crate::pool::DEFAULT_POOL_SIZE,
            max_message_len: 1024,
            capture_stack_trace: false,
            disable_locking: false,
            hostname: String::new(),
            application: String::new(),
            version: String::new(),
            environment: String::new(),
            global_fields: Vec::new(),
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    #[must_use]
    pub fn with_sampling(mut self, rate: u32) -> Self {
        self.sampling = true;
        self.sample_rate = rate;
        self
    }

    #[must_use]
    pub fn with_async(mut self, workers: usize, queue_size: usize) -> Self {
        self.async_mode = true;
        self.workers = workers;
        self.queue_size = queue_size;
        self
    }

    #[must_use]
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    #[must_use]
    pub fn with_max_message_len(mut self, len: usize) -> Self {
        self.max_message_len = len;
        self
    }

    #[must_use]
    pub fn with_stack_traces(mut self, on: bool) -> Self {
        self.capture_stack_trace = on;
        self
    }

    #[must_use]
    pub fn with_locking_disabled(mut self) -> Self {
        self.disable_locking = true;
        self
    }

    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    #[must_use]
    pub fn with_application(mut self, name: impl Into<String>) -> Self {
        self.application = name.into();
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn with_environment(mut self, env: impl Into<String>) -> Self {
        self.environment = env.into();
        self
    }

    /// Attach a field to every entry this logger emits.
    #[must_use]
    pub fn with_global_field(mut self, key: impl Into<String>, value: OwnedValue) -> Self {
        self.global_fields.push((key.into(), value));
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sampling && self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if self.async_mode && self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.async_mode && self.queue_size == 0 {
            return Err(ConfigError::EmptyQueue);
        }
        if self.pool_size == 0 {
            return Err(ConfigError::EmptyPool);
        }
        if self.max_message_len == 0 {
            return Err(ConfigError::ZeroMessageLength);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
