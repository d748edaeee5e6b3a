//! Reusable byte buffers for formatted payloads
//!
//! Formatting a log record needs a scratch `BytesMut`; allocating one per
//! record puts the allocator on the hot path. The pool keeps a fixed number
//! of buffers in a lock-free queue and hands them out through an RAII
//! guard, so a buffer returns to the pool when the guard drops no matter
//! how the write path exits.
//!
//! When the pool is empty a fresh buffer is allocated (a miss); when a
//! buffer comes back to a full pool it is simply dropped. Both cases are
//! counted so sizing problems show up in the stats rather than as errors.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::BytesMut;
use crossbeam::queue::ArrayQueue;

/// Default number of pooled buffers.
pub const DEFAULT_POOL_SIZE: usize = 64;

/// Default capacity of each pooled buffer, enough for a typical formatted
/// record without growth.
pub const DEFAULT_BUFFER_CAPACITY: usize = 4 * 1024;

/// Lock-free pool of `BytesMut` scratch buffers.
pub struct BufferPool {
    queue: ArrayQueue<BytesMut>,
    buffer_capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    returns: AtomicU64,
    drops: AtomicU64,
}

/// Counter snapshot for one [`BufferPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferPoolStats {
    pub hits: u64,
    pub misses: u64,
    pub returns: u64,
    pub drops: u64,
    pub available: usize,
}

impl BufferPool {
    pub fn new(pool_size: usize, buffer_capacity: usize) -> Arc<Self> {
        let queue = ArrayQueue::new(pool_size.max(1));
        let pool = Arc::new(Self {
            queue,
            buffer_capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            returns: AtomicU64::new(0),
            drops: AtomicU64::new(0),
        });
        // Pre-warm so the first writes do not all miss.
        for _ in 0..pool_size {
            let _ = pool.queue.push(BytesMut::with_capacity(buffer_capacity));
        }
        pool
    }

    pub fn with_defaults() -> Arc<Self> {
        Self::new(DEFAULT_POOL_SIZE, DEFAULT_BUFFER_CAPACITY)
    }

    /// Take a cleared buffer from the pool, allocating on a miss.
    pub fn acquire(self: &Arc<Self>) -> PooledBuffer {
        let buf = match self.queue.pop() {
            Some(mut buf) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                buf.clear();
                buf
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                BytesMut::with_capacity(self.buffer_capacity)
            }
        };
        PooledBuffer {
            buf: Some(buf),
            pool: Arc::clone(self),
        }
    }

    fn release(&self, buf: BytesMut) {
        // Oversized buffers are not retained; keeping them would let one
        // huge record pin memory for the lifetime of the pool.
        if buf.capacity() > self.buffer_capacity * 2 {
            self.drops.fetch_add(1, Ordering::Relaxed);
            return;
        }
        match self.queue.push(buf) {
            Ok(()) => {
                self.returns.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.drops.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn stats(&self) -> BufferPoolStats {
        BufferPoolStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            returns: self.returns.load(Ordering::Relaxed),
            drops: self.drops.load(Ordering::Relaxed),
            available: self.queue.len(),
        }
    }
}

/// RAII guard over a pooled buffer; returns it to the pool on drop.
pub struct PooledBuffer {
    buf: Option<BytesMut>,
    pool: Arc<BufferPool>,
}

impl std::ops::Deref for PooledBuffer {
    type Target = BytesMut;

    fn deref(&self) -> &BytesMut {
        // Invariant: `buf` is only None after drop.
        self.buf.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl std::ops::DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut BytesMut {
        self.buf.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.release(buf);
        }
    }
}

#[cfg(test)]
#[path = "buffer_pool_test.rs"]
mod buffer_pool_test;
