//! Bounded async dispatch
//!
//! Populated entries cross a bounded MPMC channel to N worker tasks, each
//! running the render-and-write half of the pipeline. Submission never
//! blocks: a full queue drops the entry (back to the pool, counted,
//! reported through the error handler) rather than stalling the caller.
//!
//! Ordering is per-worker arrival order only; entries handled by
//! different workers may reach the sink out of global order. Closing
//! drops the sender and awaits the workers; the channel delivers every
//! queued entry before disconnecting, so a clean shutdown loses nothing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::error::LogError;
use crate::logger::Pipeline;
use crate::pool::PooledEntry;

pub struct AsyncDispatcher {
    tx: Mutex<Option<flume::Sender<PooledEntry>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    pipeline: Arc<Pipeline>,
    dropped: AtomicU64,
}

impl AsyncDispatcher {
    /// Spawn `worker_count` tasks draining a queue of `queue_size`.
    /// Requires a tokio runtime.
    pub(crate) fn new(pipeline: Arc<Pipeline>, queue_size: usize, worker_count: usize) -> Self {
        let (tx, rx) = flume::bounded::<PooledEntry>(queue_size.max(1));

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let rx = rx.clone();
            let pipeline = Arc::clone(&pipeline);
            workers.push(tokio::spawn(async move {
                while let Ok(entry) = rx.recv_async().await {
                    pipeline.emit(&entry);
                }
                tracing::debug!(worker_id, "dispatch worker drained");
            }));
        }

        Self {
            tx: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
            pipeline,
            dropped: AtomicU64::new(0),
        }
    }

    /// Hand an entry to the workers without blocking. On a full or closed
    /// queue the entry drops back to the pool and the error handler is
    /// told.
    pub(crate) fn submit(&self, entry: PooledEntry) {
        let guard = self.tx.lock();
        let result = match guard.as_ref() {
            Some(tx) => tx.try_send(entry),
            None => Err(flume::TrySendError::Disconnected(entry)),
        };
        drop(guard);

        if let Err(err) = result {
            // The entry inside the error returns to the pool here.
            drop(err.into_inner());
            self.dropped.fetch_add(1, Ordering::Relaxed);
            self.pipeline.stats.record_dropped();
            (self.pipeline.error_handler)(&LogError::QueueFull);
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop accepting entries and wait for the workers to drain the
    /// queue. Idempotent.
    pub async fn close(&self) {
        let tx = self.tx.lock().take();
        drop(tx);

        let workers = std::mem::take(&mut *self.workers.lock());
        for handle in workers {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod dispatch_test;
