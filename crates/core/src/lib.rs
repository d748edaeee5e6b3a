//! Core logging engine
//!
//! The write path is allocation-free in the steady state: entries are
//! fixed-capacity blocks recycled through a lock-free pool, level checks
//! are one atomic load against a bitmask, and sampling is a counter
//! modulo. Formatting happens into pooled byte buffers and the result is
//! handed to a sink, either inline or through the bounded async
//! dispatcher.
//!
//! ```text
//!  log() ──filter──sample──▶ EntryPool ──populate──▶ Formatter ──▶ Sink
//!                                │                                 ▲
//!                                └──────▶ AsyncDispatcher ─────────┘
//!                                         (bounded, N workers)
//! ```

mod bounded;
mod config;
mod context;
mod dispatch;
mod entry;
mod error;
mod format;
mod level;
mod logger;
mod pool;
mod sampler;

pub use bounded::BoundedStr;
pub use config::{ConfigError, LoggerConfig};
pub use context::LogContext;
pub use dispatch::AsyncDispatcher;
pub use entry::{
    Entry, Field, FieldValue, Metric, OwnedValue, Value, MAX_FIELDS, MAX_METRICS, MAX_TAGS,
    TRUNCATION_MARKER,
};
pub use error::{ErrorHandler, LogError};
pub use format::{BytesWriter, FormatError, Formatter};
pub use level::{Level, LevelFilter, ParseLevelError};
pub use logger::{Logger, LoggerBuilder};
pub use pool::{EntryPool, EntryPoolStats, PooledEntry};
pub use sampler::SamplingGate;
