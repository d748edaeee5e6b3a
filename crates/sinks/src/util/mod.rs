//! Shared sink utilities.

mod buffer_pool;
mod throttle;

pub use buffer_pool::{BufferPool, BufferPoolStats, PooledBuffer};
pub use throttle::{ErrorThrottle, DEFAULT_THROTTLE_INTERVAL};
