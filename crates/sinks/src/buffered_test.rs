use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::*;

/// Sink that records every write it receives.
#[derive(Default)]
struct RecordingSink {
    writes: Mutex<Vec<Vec<u8>>>,
    fail: std::sync::atomic::AtomicBool,
}

impl RecordingSink {
    fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().clone()
    }

    fn all_bytes(&self) -> Vec<u8> {
        self.writes.lock().iter().flatten().copied().collect()
    }
}

impl Sink for RecordingSink {
    fn write(&self, payload: &[u8]) -> Result<usize, SinkError> {
        if self.fail.load(std::sync::atomic::Ordering::Relaxed) {
            return Err(SinkError::Closed);
        }
        self.writes.lock().push(payload.to_vec());
        Ok(payload.len())
    }
}

fn quick_config() -> BufferedWriterConfig {
    BufferedWriterConfig::default()
        .with_queue_size(256)
        .with_batch_size(8)
        .with_flush_interval(Duration::from_millis(50))
        .with_batch_timeout(Duration::from_millis(10))
}

#[tokio::test]
async fn test_batch_concatenated_into_single_write() {
    let sink = Arc::new(RecordingSink::default());
    let writer = BufferedWriter::new(sink.clone(), quick_config());

    for i in 0..8 {
        writer.write(format!("line {i}\n").as_bytes()).unwrap();
    }
    writer.shutdown().await.unwrap();

    let all = sink.all_bytes();
    let text = String::from_utf8(all).unwrap();
    for i in 0..8 {
        assert!(text.contains(&format!("line {i}\n")));
    }
    // Full batch lands as one downstream write.
    assert!(sink.writes().iter().any(|w| w.len() > 10));
    assert_eq!(writer.stats().accepted(), 8);
    assert_eq!(writer.stats().direct_writes(), 0);
}

#[tokio::test]
async fn test_partial_batch_flushed_by_timeout() {
    let sink = Arc::new(RecordingSink::default());
    let writer = BufferedWriter::new(
        sink.clone(),
        quick_config().with_flush_interval(Duration::from_secs(60)),
    );

    writer.write(b"lonely\n").unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(sink.all_bytes(), b"lonely\n");
    writer.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_full_queue_falls_back_to_direct_write() {
    let sink = Arc::new(RecordingSink::default());
    // Queue of 1 with a worker that will not keep up within the test body.
    let writer = BufferedWriter::new(
        sink.clone(),
        BufferedWriterConfig::default()
            .with_queue_size(1)
            .with_batch_size(64)
            .with_flush_interval(Duration::from_secs(60))
            .with_batch_timeout(Duration::from_secs(60)),
    );

    for i in 0..50 {
        writer.write(format!("{i}\n").as_bytes()).unwrap();
    }
    writer.shutdown().await.unwrap();

    // Every payload arrived exactly once, queued or direct.
    let text = String::from_utf8(sink.all_bytes()).unwrap();
    let mut lines: Vec<i32> = text.lines().map(|l| l.parse().unwrap()).collect();
    lines.sort_unstable();
    assert_eq!(lines, (0..50).collect::<Vec<_>>());

    let stats = writer.stats();
    assert_eq!(stats.accepted(), 50);
    assert!(stats.direct_writes() > 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_overflow_loses_nothing() {
    let sink = Arc::new(RecordingSink::default());
    let writer = Arc::new(BufferedWriter::new(
        sink.clone(),
        BufferedWriterConfig::default()
            .with_queue_size(1)
            .with_batch_size(4)
            .with_batch_timeout(Duration::from_millis(1)),
    ));

    // Eight producers hammer a queue of one; overflowing writes take the
    // direct path.
    let mut handles = Vec::new();
    for t in 0..8 {
        let writer = Arc::clone(&writer);
        handles.push(std::thread::spawn(move || {
            for i in 0..50 {
                writer.write(format!("w{t}-{i}\n").as_bytes()).unwrap();
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
    writer.shutdown().await.unwrap();

    // Every payload arrived exactly once, queued or direct.
    let text = String::from_utf8(sink.all_bytes()).unwrap();
    let mut lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 400);
    lines.sort_unstable();
    lines.dedup();
    assert_eq!(lines.len(), 400, "a payload was lost or duplicated");

    let stats = writer.stats();
    assert_eq!(stats.accepted(), 400);
    assert!(stats.direct_writes() > 0);
    assert!(stats.direct_writes() <= stats.accepted());
}

#[tokio::test]
async fn test_zero_flush_interval_is_clamped() {
    let sink = Arc::new(RecordingSink::default());
    let writer = BufferedWriter::new(
        sink.clone(),
        quick_config().with_flush_interval(Duration::ZERO),
    );

    writer.write(b"tick\n").unwrap();
    writer.shutdown().await.unwrap();
    assert_eq!(sink.all_bytes(), b"tick\n");
}

#[tokio::test]
async fn test_shutdown_drains_queue() {
    let sink = Arc::new(RecordingSink::default());
    let writer = BufferedWriter::new(
        sink.clone(),
        BufferedWriterConfig::default()
            .with_queue_size(256)
            .with_batch_size(1000)
            .with_flush_interval(Duration::from_secs(60))
            .with_batch_timeout(Duration::from_secs(60)),
    );

    for i in 0..100 {
        writer.write(format!("{i}\n").as_bytes()).unwrap();
    }
    // Nothing flushed yet; shutdown must not lose the queue.
    writer.shutdown().await.unwrap();

    let text = String::from_utf8(sink.all_bytes()).unwrap();
    assert_eq!(text.lines().count(), 100);
}

#[tokio::test]
async fn test_write_after_shutdown_goes_direct() {
    let sink = Arc::new(RecordingSink::default());
    let writer = BufferedWriter::new(sink.clone(), quick_config());
    writer.shutdown().await.unwrap();

    writer.write(b"late\n").unwrap();
    assert_eq!(writer.stats().direct_writes(), 1);
    assert_eq!(sink.all_bytes(), b"late\n");
}

#[tokio::test]
async fn test_flush_error_does_not_kill_worker() {
    let sink = Arc::new(RecordingSink::default());
    let writer = BufferedWriter::new(
        sink.clone(),
        quick_config().with_batch_size(1),
    );

    sink.fail.store(true, std::sync::atomic::Ordering::Relaxed);
    writer.write(b"lost to the failing sink\n").unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    sink.fail.store(false, std::sync::atomic::Ordering::Relaxed);
    writer.write(b"recovered\n").unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let text = String::from_utf8(sink.all_bytes()).unwrap();
    assert!(text.contains("recovered"));
    writer.shutdown().await.unwrap();
}
