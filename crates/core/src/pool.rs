//! Lock-free entry recycling
//!
//! Entries are several kilobytes; allocating one per log call would put
//! the allocator on the hot path. The pool pre-warms a fixed number of
//! boxed entries and recycles them through a lock-free queue. Acquire
//! returns an RAII guard, so an entry goes back to the pool exactly once
//! no matter how the call exits, including the fatal and panic paths.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam::queue::ArrayQueue;

use crate::entry::Entry;

/// Default number of pooled entries.
pub const DEFAULT_POOL_SIZE: usize = 256;

/// Pool of recycled [`Entry`] blocks.
pub struct EntryPool {
    queue: ArrayQueue<Box<Entry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    returns: AtomicU64,
    drops: AtomicU64,
}

/// Counter snapshot for one [`EntryPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoolStats {
    pub hits: u64,
    pub misses: u64,
    pub returns: u64,
    pub drops: u64,
    pub available: usize,
}

impl EntryPool {
    pub fn new(size: usize) -> Arc<Self> {
        let pool = Arc::new(Self {
            queue: ArrayQueue::new(size.max(1)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            returns: AtomicU64::new(0),
            drops: AtomicU64::new(0),
        });
        for _ in 0..size {
            let _ = pool.queue.push(Box::new(Entry::new()));
        }
        pool
    }

    /// Take a reset entry, allocating a fresh one when the pool is empty.
    /// An empty pool is a sizing signal (visible in the miss counter), not
    /// an error.
    pub fn acquire(self: &Arc<Self>) -> PooledEntry {
        let entry = match self.queue.pop() {
            Some(mut entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                entry.reset();
                entry
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Box::new(Entry::new())
            }
        };
        PooledEntry {
            entry: Some(entry),
            pool: Arc::clone(self),
        }
    }

    fn release(&self, entry: Box<Entry>) {
        match self.queue.push(entry) {
            Ok(()) => {
                self.returns.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.drops.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn stats(&self) -> EntryPoolStats {
        EntryPoolStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            returns: self.returns.load(Ordering::Relaxed),
            drops: self.drops.load(Ordering::Relaxed),
            available: self.queue.len(),
        }
    }
}

/// RAII guard over a pooled entry; returns it on drop.
pub struct PooledEntry {
    entry: Option<Box<Entry>>,
    pool: Arc<EntryPool>,
}

impl std::ops::Deref for PooledEntry {
    type Target = Entry;

    fn deref(&self) -> &Entry {
        // Invariant: `entry` is only None after drop.
        self.entry.as_deref().unwrap_or_else(|| unreachable!())
    }
}

impl std::ops::DerefMut for PooledEntry {
    fn deref_mut(&mut self) -> &mut Entry {
        self.entry.as_deref_mut().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for PooledEntry {
    fn drop(&mut self) {
        if let Some(entry) = self.entry.take() {
            self.pool.release(entry);
        }
    }
}

#[cfg(test)]
#[path = "pool_test.rs"]
mod pool_test;
