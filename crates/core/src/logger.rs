//! The logging front end
//!
//! `Logger::log` runs the cheap rejections first (level mask, sampling
//! gate) before touching the pool, then populates a pooled entry, renders
//! it through the formatter into a pooled buffer, and hands the bytes to
//! a sink. In async mode the populated entry crosses the dispatcher
//! instead and a worker runs the render-and-write half.
//!
//! Two levels have side effects beyond emission: `Fatal` flushes the
//! sinks and invokes the exit function (`process::exit(1)` unless
//! overridden), `Panic` raises a panic carrying the message after the
//! entry has been released back to the pool.

use std::panic::Location;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;

use quill_metrics::{LoggerStats, MetricsCollector, StatsSnapshot};
use quill_sinks::util::BufferPool;
use quill_sinks::Sink;

use crate::config::{ConfigError, LoggerConfig};
use crate::context::LogContext;
use crate::dispatch::AsyncDispatcher;
use crate::entry::{Entry, Value};
use crate::error::{default_error_handler, ErrorHandler, LogError};
use crate::format::Formatter;
use crate::level::{Level, LevelFilter};
use crate::pool::{EntryPool, EntryPoolStats, PooledEntry};
use crate::sampler::SamplingGate;

type Hook = Arc<dyn Fn(&mut Entry) + Send + Sync>;
type ExitFn = Arc<dyn Fn(i32) + Send + Sync>;

/// Everything needed to turn a populated entry into bytes at a sink.
/// Shared between the logger and async dispatcher workers.
pub(crate) struct Pipeline {
    pub(crate) formatter: Arc<dyn Formatter>,
    pub(crate) sink: Arc<dyn Sink>,
    pub(crate) error_sink: Option<Arc<dyn Sink>>,
    pub(crate) buffers: Arc<BufferPool>,
    pub(crate) stats: Arc<LoggerStats>,
    pub(crate) collector: Option<Arc<dyn MetricsCollector>>,
    pub(crate) error_handler: ErrorHandler,
    pub(crate) write_lock: Option<Mutex<()>>,
}

impl Pipeline {
    /// Render and write one entry. Failures go to the error handler; the
    /// caller's control flow is never affected.
    pub(crate) fn emit(&self, entry: &Entry) {
        let mut buf = self.buffers.acquire();
        if let Err(err) = self.formatter.format(entry, &mut buf) {
            self.stats.record_error();
            (self.error_handler)(&LogError::Format(err));
            return;
        }

        let sink = match (&self.error_sink, entry.level() >= Level::Error) {
            (Some(error_sink), true) => error_sink,
            _ => &self.sink,
        };

        let result = {
            let _guard = self.write_lock.as_ref().map(|m| m.lock());
            sink.write(&buf)
        };

        match result {
            Ok(n) => {
                self.stats.record(entry.level().index());
                self.stats.add_bytes(n as u64);
                if let Some(collector) = &self.collector {
                    collector.increment_counter(entry.level().as_str(), &[]);
                }
            }
            Err(err) => {
                self.stats.record_error();
                (self.error_handler)(&LogError::Sink(err));
            }
        }
    }

    fn flush_all(&self) {
        if let Err(err) = self.sink.flush() {
            (self.error_handler)(&LogError::Sink(err));
        }
        if let Some(error_sink) = &self.error_sink {
            if let Err(err) = error_sink.flush() {
                (self.error_handler)(&LogError::Sink(err));
            }
        }
    }
}

/// Structured logger over pooled entries. Cheap to share behind an `Arc`;
/// all methods take `&self`.
pub struct Logger {
    config: LoggerConfig,
    filter: LevelFilter,
    sampler: Option<SamplingGate>,
    pool: Arc<EntryPool>,
    pipeline: Arc<Pipeline>,
    dispatcher: Option<AsyncDispatcher>,
    hooks: Vec<Hook>,
    on_fatal: Option<Arc<dyn Fn() + Send + Sync>>,
    on_panic: Option<Arc<dyn Fn() + Send + Sync>>,
    exit_fn: ExitFn,
    pid: u32,
}

impl Logger {
    pub fn builder(config: LoggerConfig) -> LoggerBuilder {
        LoggerBuilder::new(config)
    }

    // Per-level front doors. `#[track_caller]` keeps the recorded
    // file/line pointing at the user's call site.

    #[track_caller]
    pub fn trace(&self, message: &str, fields: &[(&str, Value<'_>)]) {
        self.log(Level::Trace, message, fields);
    }

    #[track_caller]
    pub fn debug(&self, message: &str, fields: &[(&str, Value<'_>)]) {
        self.log(Level::Debug, message, fields);
    }

    #[track_caller]
    pub fn info(&self, message: &str, fields: &[(&str, Value<'_>)]) {
        self.log(Level::Info, message, fields);
    }

    #[track_caller]
    pub fn notice(&self, message: &str, fields: &[(&str, Value<'_>)]) {
        self.log(Level::Notice, message, fields);
    }

    #[track_caller]
    pub fn warn(&self, message: &str, fields: &[(&str, Value<'_>)]) {
        self.log(Level::Warn, message, fields);
    }

    #[track_caller]
    pub fn error(&self, message: &str, fields: &[(&str, Value<'_>)]) {
        self.log(Level::Error, message, fields);
    }

    /// Emit at `Fatal`, flush, then terminate the process via the
    /// configured exit function.
    #[track_caller]
    pub fn fatal(&self, message: &str, fields: &[(&str, Value<'_>)]) {
        self.log(Level::Fatal, message, fields);
    }

    /// Emit at `Panic`, then panic with the message.
    #[track_caller]
    pub fn panic_log(&self, message: &str, fields: &[(&str, Value<'_>)]) {
        self.log(Level::Panic, message, fields);
    }

    #[track_caller]
    pub fn log(&self, level: Level, message: &str, fields: &[(&str, Value<'_>)]) {
        let caller = Location::caller();
        self.emit_entry(level, message, fields, None, None, caller);
    }

    #[track_caller]
    pub fn log_with_context(
        &self,
        level: Level,
        message: &str,
        fields: &[(&str, Value<'_>)],
        ctx: &LogContext,
    ) {
        let caller = Location::caller();
        self.emit_entry(level, message, fields, Some(ctx), None, caller);
    }

    /// Log with an operation duration attached to the entry.
    #[track_caller]
    pub fn log_timed(
        &self,
        level: Level,
        message: &str,
        duration: std::time::Duration,
        fields: &[(&str, Value<'_>)],
    ) {
        let caller = Location::caller();
        self.emit_entry(level, message, fields, None, Some(duration), caller);
    }

    fn emit_entry(
        &self,
        level: Level,
        message: &str,
        fields: &[(&str, Value<'_>)],
        ctx: Option<&LogContext>,
        duration: Option<std::time::Duration>,
        caller: &Location<'_>,
    ) {
        // Rejections happen before any pool traffic.
        if !self.filter.enabled(level) {
            return;
        }
        if let Some(sampler) = &self.sampler {
            if !sampler.sample() {
                return;
            }
        }

        let mut entry = self.pool.acquire();
        self.populate(&mut entry, level, message, fields, ctx, duration, caller);
        for hook in &self.hooks {
            hook(&mut entry);
        }

        match level {
            Level::Fatal => {
                self.pipeline.emit(&entry);
                drop(entry);
                self.pipeline.flush_all();
                if let Some(f) = &self.on_fatal {
                    f();
                }
                (self.exit_fn)(1);
            }
            Level::Panic => {
                self.pipeline.emit(&entry);
                let message = entry.message().to_string();
                drop(entry);
                self.pipeline.flush_all();
                if let Some(f) = &self.on_panic {
                    f();
                }
                panic!("{message}");
            }
            _ => match &self.dispatcher {
                Some(dispatcher) => dispatcher.submit(entry),
                None => self.pipeline.emit(&entry),
            },
        }
    }

    fn populate(
        &self,
        entry: &mut PooledEntry,
        level: Level,
        message: &str,
        fields: &[(&str, Value<'_>)],
        ctx: Option<&LogContext>,
        duration: Option<std::time::Duration>,
        caller: &Location<'_>,
    ) {
        entry.set_timestamp(Utc::now());
        entry.set_level(level);
        entry.set_message(message, self.config.max_message_len);
        entry.set_caller(caller.file(), caller.line());
        entry.set_process_meta(
            self.pid,
            &self.config.hostname,
            &self.config.application,
            &self.config.version,
            &self.config.environment,
        );

        for (key, value) in &self.config.global_fields {
            entry.add_field(key, value.as_value());
        }
        if let Some(ctx) = ctx {
            ctx.apply(entry);
        }
        for (key, value) in fields {
            entry.add_field(key, *value);
        }
        if let Some(d) = duration {
            entry.set_duration(d);
        }

        if self.config.capture_stack_trace && level >= Level::Error {
            let trace = std::backtrace::Backtrace::force_capture().to_string();
            entry.set_stack_trace(&trace);
        }
    }

    /// Change the threshold at runtime.
    pub fn set_min_level(&self, level: Level) {
        self.filter.set_min_level(level);
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.filter.enabled(level)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.pipeline.stats.snapshot()
    }

    pub fn pool_stats(&self) -> EntryPoolStats {
        self.pool.stats()
    }

    /// Entries dropped by the async dispatcher, 0 in sync mode.
    pub fn dropped(&self) -> u64 {
        self.dispatcher.as_ref().map_or(0, AsyncDispatcher::dropped)
    }

    /// Drain the dispatcher (async mode), flush, and close the sinks.
    pub async fn close(&self) {
        if let Some(dispatcher) = &self.dispatcher {
            dispatcher.close().await;
        }
        self.pipeline.flush_all();
        if let Err(err) = self.pipeline.sink.close() {
            (self.pipeline.error_handler)(&LogError::Sink(err));
        }
        if let Some(error_sink) = &self.pipeline.error_sink {
            if let Err(err) = error_sink.close() {
                (self.pipeline.error_handler)(&LogError::Sink(err));
            }
        }
    }
}

/// Wires runtime collaborators (formatter, sinks, callbacks) onto a
/// validated [`LoggerConfig`].
pub struct LoggerBuilder {
    config: LoggerConfig,
    formatter: Option<Arc<dyn Formatter>>,
    sink: Option<Arc<dyn Sink>>,
    error_sink: Option<Arc<dyn Sink>>,
    collector: Option<Arc<dyn MetricsCollector>>,
    error_handler: Option<ErrorHandler>,
    hooks: Vec<Hook>,
    on_fatal: Option<Arc<dyn Fn() + Send + Sync>>,
    on_panic: Option<Arc<dyn Fn() + Send + Sync>>,
    exit_fn: Option<ExitFn>,
}

impl LoggerBuilder {
    fn new(config: LoggerConfig) -> Self {
        Self {
            config,
            formatter: None,
            sink: None,
            error_sink: None,
            collector: None,
            error_handler: None,
            hooks: Vec::new(),
            on_fatal: None,
            on_panic: None,
            exit_fn: None,
        }
    }

    #[must_use]
    pub fn formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Route entries at `Error` and above here instead of the main sink.
    #[must_use]
    pub fn error_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.error_sink = Some(sink);
        self
    }

    #[must_use]
    pub fn collector(mut self, collector: Arc<dyn MetricsCollector>) -> Self {
        self.collector = Some(collector);
        self
    }

    #[must_use]
    pub fn error_handler(mut self, handler: ErrorHandler) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Run on every populated entry before formatting.
    #[must_use]
    pub fn hook(mut self, hook: impl Fn(&mut Entry) + Send + Sync + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn on_fatal(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_fatal = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_panic(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_panic = Some(Arc::new(f));
        self
    }

    /// Replace `process::exit` on the fatal path. Intended for tests and
    /// embedders that must not terminate the process.
    #[must_use]
    pub fn exit_fn(mut self, f: impl Fn(i32) + Send + Sync + 'static) -> Self {
        self.exit_fn = Some(Arc::new(f));
        self
    }

    /// Validate the configuration and assemble the logger. Async mode
    /// spawns worker tasks and therefore requires a tokio runtime.
    pub fn build(self) -> Result<Logger, ConfigError> {
        self.config.validate()?;
        let formatter = self.formatter.ok_or(ConfigError::MissingFormatter)?;
        let sink = self.sink.ok_or(ConfigError::MissingSink)?;

        let pipeline = Arc::new(Pipeline {
            formatter,
            sink,
            error_sink: self.error_sink,
            buffers: BufferPool::with_defaults(),
            stats: Arc::new(LoggerStats::new()),
            collector: self.collector,
            error_handler: self.error_handler.unwrap_or_else(default_error_handler),
            write_lock: (!self.config.disable_locking).then(|| Mutex::new(())),
        });

        let dispatcher = self.config.async_mode.then(|| {
            AsyncDispatcher::new(
                Arc::clone(&pipeline),
                self.config.queue_size,
                self.config.workers,
            )
        });

        let sampler = self
            .config
            .sampling
            .then(|| SamplingGate::new(self.config.sample_rate));

        Ok(Logger {
            filter: LevelFilter::new(self.config.min_level),
            sampler,
            pool: EntryPool::new(self.config.pool_size),
            pipeline,
            dispatcher,
            hooks: self.hooks,
            on_fatal: self.on_fatal,
            on_panic: self.on_panic,
            exit_fn: self
                .exit_fn
                .unwrap_or_else(|| Arc::new(|code| std::process::exit(code))),
            pid: std::process::id(),
            config: self.config,
        })
    }
}

#[cfg(test)]
#[path = "logger_test.rs"]
mod logger_test;
