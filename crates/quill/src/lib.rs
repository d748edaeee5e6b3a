//! Structured logging engine for latency-sensitive services
//!
//! Facade over the workspace crates. A minimal setup:
//!
//! ```no_run
//! use std::sync::Arc;
//! use quill::{ConsoleSink, Level, Logger, LoggerConfig, TextFormatter, Value};
//!
//! let logger = Logger::builder(LoggerConfig::new().with_min_level(Level::Debug))
//!     .formatter(Arc::new(TextFormatter::new()))
//!     .sink(Arc::new(ConsoleSink::stdout()))
//!     .build()
//!     .unwrap();
//!
//! logger.info("service started", &[("port", Value::Int(8080))]);
//! ```

pub use quill_core::{
    AsyncDispatcher, BoundedStr, BytesWriter, ConfigError, Entry, EntryPool, EntryPoolStats,
    ErrorHandler, Field, FieldValue, FormatError, Formatter, Level, LevelFilter, LogContext,
    LogError, Logger, LoggerBuilder, LoggerConfig, Metric, OwnedValue, ParseLevelError,
    PooledEntry, SamplingGate, Value, MAX_FIELDS, MAX_METRICS, MAX_TAGS, TRUNCATION_MARKER,
};
pub use quill_format::{CsvColumn, CsvFormatter, JsonFormatter, MaskPolicy, TextFormatter};
pub use quill_metrics::{
    DefaultMetricsCollector, HistogramStats, LoggerStats, MetricsCollector, NoopCollector,
    StatsSnapshot,
};
pub use quill_sinks::{
    BufferedStats, BufferedWriter, BufferedWriterConfig, ConsoleSink, ConsoleStream, FileSink,
    RotatingFileSink, RotationConfig, Sink, SinkError,
};
