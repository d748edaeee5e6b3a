//! Whole-pipeline tests: logger → formatter → buffered writer → rotating
//! file sink, exercised together the way a service would wire them.

use std::sync::Arc;
use std::time::Duration;

use quill::{
    BufferedWriter, BufferedWriterConfig, FileSink, JsonFormatter, Level, LogContext, Logger,
    LoggerConfig, MaskPolicy, RotatingFileSink, RotationConfig, TextFormatter, Value,
};

#[tokio::test]
async fn test_text_pipeline_through_buffered_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("service.log");

    let file = Arc::new(FileSink::open(&path).unwrap());
    let buffered = Arc::new(BufferedWriter::new(
        file,
        BufferedWriterConfig::default()
            .with_batch_size(4)
            .with_flush_interval(Duration::from_millis(20)),
    ));

    let logger = Logger::builder(
        LoggerConfig::new()
            .with_min_level(Level::Debug)
            .with_application("billing"),
    )
    .formatter(Arc::new(TextFormatter::new().with_caller(false)))
    .sink(buffered.clone())
    .build()
    .unwrap();

    for i in 0..20 {
        logger.info(
            "invoice processed",
            &[("invoice", Value::Int(i)), ("ok", Value::Bool(true))],
        );
    }
    logger.debug("cache warmup", &[]);
    buffered.shutdown().await.unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 21);
    assert!(contents.contains("[INFO] billing invoice processed invoice=7 ok=true"));
    assert!(contents.contains("[DEBUG] billing cache warmup"));
    assert_eq!(logger.stats().per_level[Level::Info.index()], 20);
}

#[tokio::test]
async fn test_json_pipeline_with_context_and_masking() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("service.json");

    let logger = Logger::builder(LoggerConfig::new())
        .formatter(Arc::new(
            JsonFormatter::new()
                .with_key_mapping("level", "severity")
                .with_mask(MaskPolicy::default()),
        ))
        .sink(Arc::new(FileSink::open(&path).unwrap()))
        .build()
        .unwrap();

    let ctx = LogContext::new()
        .with_trace_id("trace-42")
        .with_user_id("user-7");
    logger.log_with_context(
        Level::Warn,
        "login throttled",
        &[
            ("attempts", Value::Int(5)),
            ("password", Value::Str("hunter2")),
        ],
        &ctx,
    );
    logger.close().await;

    let contents = std::fs::read_to_string(&path).unwrap();
    let obj: serde_json::Value = serde_json::from_str(contents.trim()).unwrap();
    assert_eq!(obj["severity"], "WARN");
    assert_eq!(obj["message"], "login throttled");
    assert_eq!(obj["trace_id"], "trace-42");
    assert_eq!(obj["user_id"], "user-7");
    assert_eq!(obj["fields"]["attempts"], 5);
    assert_eq!(obj["fields"]["password"], "***");
    assert!(!contents.contains("hunter2"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_logger_over_rotating_sink() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rotated.log");

    let rotating = Arc::new(
        RotatingFileSink::open(&path, RotationConfig::default().with_max_size(2048)).unwrap(),
    );
    let logger = Logger::builder(LoggerConfig::new().with_async(2, 4096))
        .formatter(Arc::new(TextFormatter::new().with_caller(false)))
        .sink(rotating.clone())
        .build()
        .unwrap();

    for i in 0..500 {
        logger.info("steady traffic", &[("seq", Value::Int(i))]);
    }
    logger.close().await;

    assert_eq!(logger.dropped(), 0);
    assert!(rotating.rotations() > 0);

    // Every line that was written survives across the active file and
    // the rotated backups.
    let mut total = 0;
    for entry in std::fs::read_dir(dir.path()).unwrap().flatten() {
        let contents = std::fs::read_to_string(entry.path()).unwrap();
        total += contents.lines().count();
    }
    assert_eq!(total, 500);
}

#[tokio::test]
async fn test_sampling_and_truncation_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sampled.log");

    let logger = Logger::builder(
        LoggerConfig::new()
            .with_sampling(100)
            .with_max_message_len(50),
    )
    .formatter(Arc::new(
        TextFormatter::new().with_timestamps(false).with_caller(false),
    ))
    .sink(Arc::new(FileSink::open(&path).unwrap()))
    .build()
    .unwrap();

    let long = "m".repeat(400);
    for _ in 0..250 {
        logger.info(&long, &[]);
    }
    logger.close().await;

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        assert!(line.ends_with("... [truncated]"));
        assert!(!line.contains(&"m".repeat(51)));
    }
}
