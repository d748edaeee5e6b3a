use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use bytes::BytesMut;
use parking_lot::Mutex;

use quill_sinks::{Sink, SinkError};

use super::*;
use crate::format::{BytesWriter, FormatError};
use crate::OwnedValue;

/// Line-per-entry formatter for assertions.
struct PlainFormatter;

impl Formatter for PlainFormatter {
    fn format(&self, entry: &Entry, out: &mut BytesMut) -> Result<(), FormatError> {
        let mut w = BytesWriter(out);
        write!(w, "{} {}", entry.level(), entry.message())?;
        for field in entry.fields() {
            match field.value() {
                crate::FieldValue::Str(s) => write!(w, " {}={}", field.key(), s)?,
                crate::FieldValue::Int(v) => write!(w, " {}={}", field.key(), v)?,
                crate::FieldValue::Float(v) => write!(w, " {}={}", field.key(), v)?,
                crate::FieldValue::Bool(v) => write!(w, " {}={}", field.key(), v)?,
                crate::FieldValue::Empty => {}
            }
        }
        if !entry.trace_id().is_empty() {
            write!(w, " trace_id={}", entry.trace_id())?;
        }
        writeln!(w)?;
        Ok(())
    }
}

#[derive(Default)]
struct MemorySink {
    data: Mutex<Vec<u8>>,
    fail: AtomicBool,
    flushes: AtomicU32,
}

impl MemorySink {
    fn text(&self) -> String {
        String::from_utf8(self.data.lock().clone()).unwrap()
    }

    fn lines(&self) -> Vec<String> {
        self.text().lines().map(str::to_string).collect()
    }
}

impl Sink for MemorySink {
    fn write(&self, payload: &[u8]) -> Result<usize, SinkError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(SinkError::Closed);
        }
        self.data.lock().extend_from_slice(payload);
        Ok(payload.len())
    }

    fn flush(&self) -> Result<(), SinkError> {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

fn build_logger(config: LoggerConfig) -> (Logger, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::default());
    let logger = Logger::builder(config)
        .formatter(Arc::new(PlainFormatter))
        .sink(sink.clone())
        .exit_fn(|_| {})
        .build()
        .unwrap();
    (logger, sink)
}

#[test]
fn test_below_threshold_never_touches_pool() {
    let (logger, sink) = build_logger(LoggerConfig::default().with_min_level(Level::Warn));

    logger.debug("invisible", &[]);
    logger.info("invisible", &[]);

    assert!(sink.text().is_empty());
    let pool = logger.pool_stats();
    assert_eq!(pool.hits + pool.misses, 0);
}

#[test]
fn test_runtime_level_change() {
    let (logger, sink) = build_logger(LoggerConfig::default().with_min_level(Level::Error));

    logger.info("dropped", &[]);
    logger.set_min_level(Level::Info);
    logger.info("kept", &[]);

    assert_eq!(sink.lines(), vec!["INFO kept"]);
}

#[test]
fn test_sampling_passes_every_nth() {
    let (logger, sink) = build_logger(LoggerConfig::default().with_sampling(100));

    for i in 0..250 {
        logger.info(&format!("msg {i}"), &[]);
    }

    assert_eq!(sink.lines().len(), 2);
    assert_eq!(logger.stats().per_level[Level::Info.index()], 2);
}

#[test]
fn test_fields_context_and_globals_rendered() {
    let sink = Arc::new(MemorySink::default());
    let logger = Logger::builder(
        LoggerConfig::default()
            .with_global_field("region", OwnedValue::Str("eu".into())),
    )
    .formatter(Arc::new(PlainFormatter))
    .sink(sink.clone())
    .build()
    .unwrap();

    let ctx = LogContext::new().with_trace_id("t-123");
    logger.log_with_context(
        Level::Info,
        "request done",
        &[("status", Value::Int(200)), ("cached", Value::Bool(false))],
        &ctx,
    );

    let line = sink.lines().pop().unwrap();
    assert!(line.contains("request done"));
    assert!(line.contains("region=eu"));
    assert!(line.contains("status=200"));
    assert!(line.contains("cached=false"));
    assert!(line.contains("trace_id=t-123"));
}

#[test]
fn test_error_routed_to_error_sink() {
    let main = Arc::new(MemorySink::default());
    let errors = Arc::new(MemorySink::default());
    let logger = Logger::builder(LoggerConfig::default())
        .formatter(Arc::new(PlainFormatter))
        .sink(main.clone())
        .error_sink(errors.clone())
        .build()
        .unwrap();

    logger.info("normal", &[]);
    logger.error("broken", &[]);

    assert_eq!(main.lines(), vec!["INFO normal"]);
    assert_eq!(errors.lines(), vec!["ERROR broken"]);
}

#[test]
fn test_hooks_mutate_entries() {
    let sink = Arc::new(MemorySink::default());
    let logger = Logger::builder(LoggerConfig::default())
        .formatter(Arc::new(PlainFormatter))
        .sink(sink.clone())
        .hook(|entry| {
            entry.add_field("hooked", Value::Bool(true));
        })
        .build()
        .unwrap();

    logger.info("hi", &[]);
    assert!(sink.text().contains("hooked=true"));
}

#[test]
fn test_stats_count_per_level() {
    let (logger, _sink) = build_logger(LoggerConfig::default().with_min_level(Level::Trace));

    logger.trace("t", &[]);
    logger.info("i", &[]);
    logger.info("i", &[]);
    logger.warn("w", &[]);

    let stats = logger.stats();
    assert_eq!(stats.per_level[Level::Trace.index()], 1);
    assert_eq!(stats.per_level[Level::Info.index()], 2);
    assert_eq!(stats.per_level[Level::Warn.index()], 1);
    assert_eq!(stats.total, 4);
    assert!(stats.bytes_written > 0);
}

#[test]
fn test_sink_failure_hits_error_handler_not_caller() {
    let sink = Arc::new(MemorySink::default());
    sink.fail.store(true, Ordering::Relaxed);
    let seen = Arc::new(AtomicU32::new(0));
    let seen_in_handler = seen.clone();

    let logger = Logger::builder(LoggerConfig::default())
        .formatter(Arc::new(PlainFormatter))
        .sink(sink.clone())
        .error_handler(Arc::new(move |err| {
            assert!(matches!(err, LogError::Sink(_)));
            seen_in_handler.fetch_add(1, Ordering::Relaxed);
        }))
        .build()
        .unwrap();

    logger.info("lost", &[]);
    assert_eq!(seen.load(Ordering::Relaxed), 1);
    assert_eq!(logger.stats().errors, 1);
}

#[test]
fn test_fatal_flushes_and_invokes_exit() {
    let sink = Arc::new(MemorySink::default());
    let exit_code = Arc::new(AtomicU32::new(u32::MAX));
    let fatal_seen = Arc::new(AtomicBool::new(false));

    let exit_code_w = exit_code.clone();
    let fatal_seen_w = fatal_seen.clone();
    let logger = Logger::builder(LoggerConfig::default())
        .formatter(Arc::new(PlainFormatter))
        .sink(sink.clone())
        .on_fatal(move || fatal_seen_w.store(true, Ordering::Relaxed))
        .exit_fn(move |code| exit_code_w.store(code as u32, Ordering::Relaxed))
        .build()
        .unwrap();

    logger.fatal("unrecoverable", &[]);

    assert_eq!(sink.lines(), vec!["FATAL unrecoverable"]);
    assert!(sink.flushes.load(Ordering::Relaxed) >= 1);
    assert!(fatal_seen.load(Ordering::Relaxed));
    assert_eq!(exit_code.load(Ordering::Relaxed), 1);
}

#[test]
fn test_panic_level_panics_with_message() {
    let (logger, sink) = build_logger(LoggerConfig::default());

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        logger.panic_log("invariant violated", &[]);
    }));

    let payload = result.unwrap_err();
    let msg = payload.downcast_ref::<String>().unwrap();
    assert_eq!(msg, "invariant violated");
    // Entry was emitted and returned to the pool before unwinding.
    assert_eq!(sink.lines(), vec!["PANIC invariant violated"]);
    assert_eq!(logger.pool_stats().returns, 1);
}

#[test]
fn test_entries_recycle_through_pool() {
    let (logger, _sink) = build_logger(LoggerConfig::default().with_pool_size(4));

    for _ in 0..100 {
        logger.info("spin", &[]);
    }

    let pool = logger.pool_stats();
    assert_eq!(pool.hits + pool.misses, 100);
    assert_eq!(pool.misses, 0);
    assert_eq!(pool.available, 4);
}

#[test]
fn test_caller_recorded() {
    let sink = Arc::new(MemorySink::default());
    let caller_file: Arc<Mutex<String>> = Arc::default();
    let caller_file_w = caller_file.clone();
    let logger = Logger::builder(LoggerConfig::default())
        .formatter(Arc::new(PlainFormatter))
        .sink(sink)
        .hook(move |entry| {
            if let Some((file, line)) = entry.caller() {
                *caller_file_w.lock() = format!("{file}:{line}");
            }
        })
        .build()
        .unwrap();

    logger.info("here", &[]);
    assert!(caller_file.lock().contains("logger_test.rs"));
}
