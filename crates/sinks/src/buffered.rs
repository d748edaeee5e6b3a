//! Buffered writer with batched background flushing
//!
//! Wraps any [`Sink`] with a bounded queue and one flush task. Producers
//! enqueue with `try_send` and never block; the task drains the queue and
//! concatenates each batch into a single downstream write, so a chatty
//! logger costs the underlying sink one syscall per batch instead of one
//! per record.
//!
//! A batch is flushed when the first of three conditions fires:
//!
//! - the pending batch reaches `batch_size` records
//! - the periodic `flush_interval` tick elapses
//! - `batch_timeout` passes since the first record of a partial batch
//!
//! When the queue is full the payload is written synchronously to the
//! underlying sink instead of being dropped. The `direct_writes` counter
//! records every such fallback; no payload is ever discarded, the cost is
//! one blocking write on the producer's thread.

use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::util::ErrorThrottle;
use crate::{Sink, SinkError};

/// Tuning knobs for [`BufferedWriter`].
#[derive(Debug, Clone)]
pub struct BufferedWriterConfig {
    /// Capacity of the submission queue.
    pub queue_size: usize,
    /// Flush as soon as this many records are pending.
    pub batch_size: usize,
    /// Periodic flush regardless of batch fill.
    pub flush_interval: Duration,
    /// Maximum time a partial batch may wait before being flushed.
    pub batch_timeout: Duration,
}

impl Default for BufferedWriterConfig {
    fn default() -> Self {
        Self {
            queue_size: 1024,
            batch_size: 64,
            flush_interval: Duration::from_secs(1),
            batch_timeout: Duration::from_millis(100),
        }
    }
}

impl BufferedWriterConfig {
    #[must_use]
    pub fn with_queue_size(mut self, n: usize) -> Self {
        self.queue_size = n.max(1);
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n.max(1);
        self
    }

    #[must_use]
    pub fn with_flush_interval(mut self, d: Duration) -> Self {
        self.flush_interval = d.max(Duration::from_millis(1));
        self
    }

    #[must_use]
    pub fn with_batch_timeout(mut self, d: Duration) -> Self {
        self.batch_timeout = d;
        self
    }
}

/// Monotonic counters for one [`BufferedWriter`].
#[derive(Debug, Default)]
pub struct BufferedStats {
    accepted: AtomicU64,
    direct_writes: AtomicU64,
    batches: AtomicU64,
    bytes_written: AtomicU64,
}

impl BufferedStats {
    /// Payloads accepted by `write`, queued or not.
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Payloads written synchronously because the queue was full or the
    /// writer was shutting down.
    pub fn direct_writes(&self) -> u64 {
        self.direct_writes.load(Ordering::Relaxed)
    }

    /// Batches flushed by the background task.
    pub fn batches(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }

    /// Bytes written downstream by the background task.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }
}

/// Non-blocking batching layer over a [`Sink`].
///
/// Must be created inside a tokio runtime; the flush task is spawned at
/// construction. For an ordered shutdown call [`BufferedWriter::shutdown`],
/// which drains the queue, performs a final flush, and closes the
/// underlying sink.
pub struct BufferedWriter {
    tx: Mutex<Option<mpsc::Sender<BytesMut>>>,
    sink: Arc<dyn Sink>,
    stats: Arc<BufferedStats>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl BufferedWriter {
    pub fn new(sink: Arc<dyn Sink>, config: BufferedWriterConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_size.max(1));
        let stats = Arc::new(BufferedStats::default());
        let worker = tokio::spawn(run_flush_task(
            rx,
            Arc::clone(&sink),
            Arc::clone(&stats),
            config,
        ));
        Self {
            tx: Mutex::new(Some(tx)),
            sink,
            stats: Arc::clone(&stats),
            worker: Mutex::new(Some(worker)),
        }
    }

    pub fn stats(&self) -> &BufferedStats {
        &self.stats
    }

    /// Drain the queue, flush the final batch, and close the underlying
    /// sink. Idempotent.
    pub async fn shutdown(&self) -> Result<(), SinkError> {
        // Dropping the sender lets the flush task drain remaining
        // payloads from the channel and exit.
        let tx = self.tx.lock().take();
        drop(tx);

        let worker = self.worker.lock().take();
        if let Some(handle) = worker {
            let _ = handle.await;
        }

        self.sink.flush()?;
        self.sink.close()
    }
}

impl Sink for BufferedWriter {
    fn write(&self, payload: &[u8]) -> Result<usize, SinkError> {
        self.stats.accepted.fetch_add(1, Ordering::Relaxed);

        let mut buf = BytesMut::with_capacity(payload.len());
        buf.extend_from_slice(payload);

        let guard = self.tx.lock();
        let Some(tx) = guard.as_ref() else {
            // Shutting down: keep the payload by writing it directly.
            drop(guard);
            self.stats.direct_writes.fetch_add(1, Ordering::Relaxed);
            return self.sink.write(payload);
        };

        match tx.try_send(buf) {
            Ok(()) => Ok(payload.len()),
            Err(mpsc::error::TrySendError::Full(_))
            | Err(mpsc::error::TrySendError::Closed(_)) => {
                drop(guard);
                self.stats.direct_writes.fetch_add(1, Ordering::Relaxed);
                self.sink.write(payload)
            }
        }
    }

    fn flush(&self) -> Result<(), SinkError> {
        self.sink.flush()
    }

    fn close(&self) -> Result<(), SinkError> {
        // Sync close cannot await the flush task; drop the sender so it
        // drains in the background. Prefer `shutdown` for ordered close.
        let tx = self.tx.lock().take();
        drop(tx);
        Ok(())
    }
}

async fn run_flush_task(
    mut rx: mpsc::Receiver<BytesMut>,
    sink: Arc<dyn Sink>,
    stats: Arc<BufferedStats>,
    config: BufferedWriterConfig,
) {
    let throttle = ErrorThrottle::default();
    let mut pending: Vec<BytesMut> = Vec::with_capacity(config.batch_size);
    let mut pending_bytes = 0usize;

    // A zero period would panic inside tokio; the config builder clamps,
    // but the field is public.
    let mut interval = tokio::time::interval(config.flush_interval.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut batch_deadline = tokio::time::Instant::now();
    let mut batch_armed = false;

    loop {
        tokio::select! {
            maybe = rx.recv() => match maybe {
                Some(buf) => {
                    pending_bytes += buf.len();
                    pending.push(buf);
                    if pending.len() >= config.batch_size {
                        flush_batch(&sink, &stats, &throttle, &mut pending, &mut pending_bytes);
                        batch_armed = false;
                    } else if !batch_armed {
                        batch_deadline = tokio::time::Instant::now() + config.batch_timeout;
                        batch_armed = true;
                    }
                }
                None => {
                    flush_batch(&sink, &stats, &throttle, &mut pending, &mut pending_bytes);
                    break;
                }
            },
            _ = interval.tick() => {
                flush_batch(&sink, &stats, &throttle, &mut pending, &mut pending_bytes);
                batch_armed = false;
            }
            _ = tokio::time::sleep_until(batch_deadline), if batch_armed => {
                flush_batch(&sink, &stats, &throttle, &mut pending, &mut pending_bytes);
                batch_armed = false;
            }
        }
    }
}

/// Concatenate the pending batch and hand it downstream as one write.
fn flush_batch(
    sink: &Arc<dyn Sink>,
    stats: &BufferedStats,
    throttle: &ErrorThrottle,
    pending: &mut Vec<BytesMut>,
    pending_bytes: &mut usize,
) {
    if pending.is_empty() {
        return;
    }

    let mut combined = BytesMut::with_capacity(*pending_bytes);
    for buf in pending.drain(..) {
        combined.extend_from_slice(&buf);
    }
    *pending_bytes = 0;

    match sink.write(&combined) {
        Ok(n) => {
            stats.batches.fetch_add(1, Ordering::Relaxed);
            stats.bytes_written.fetch_add(n as u64, Ordering::Relaxed);
        }
        Err(err) => {
            throttle.record("batch flush failed", &err);
        }
    }
}

#[cfg(test)]
#[path = "buffered_test.rs"]
mod buffered_test;
