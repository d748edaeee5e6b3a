//! Output destinations for formatted log payloads
//!
//! A [`Sink`] receives fully formatted bytes and gets them somewhere
//! durable. Sinks are internally synchronized: `write` takes `&self` and a
//! single sink instance may be shared across threads behind an `Arc`.
//!
//! The building blocks compose:
//!
//! ```text
//!  formatter bytes ──▶ BufferedWriter ──▶ RotatingFileSink ──▶ disk
//!                      (batching)          (rotation, gzip)
//! ```
//!
//! [`BufferedWriter`] wraps any sink with a bounded queue and a background
//! flush task. [`RotatingFileSink`] owns a file and rotates it by size,
//! age, or wall-clock interval. [`ConsoleSink`] and [`FileSink`] are the
//! plain terminals of the chain.

mod buffered;
mod console;
mod file;
mod rotating;
pub mod util;

use std::io;

pub use buffered::{BufferedStats, BufferedWriter, BufferedWriterConfig};
pub use console::{ConsoleSink, ConsoleStream};
pub use file::FileSink;
pub use rotating::{RotatingFileSink, RotationConfig};

/// Errors surfaced by sink operations.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Underlying I/O failure.
    #[error("sink i/o error: {0}")]
    Io(#[from] io::Error),

    /// Write attempted after the sink was closed.
    #[error("sink is closed")]
    Closed,

    /// File rotation failed.
    #[error("rotation failed for {path}: {source}")]
    Rotation {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl SinkError {
    pub fn rotation(path: impl Into<String>, source: io::Error) -> Self {
        Self::Rotation {
            path: path.into(),
            source,
        }
    }
}

/// Destination for formatted log payloads.
///
/// Implementations synchronize internally; callers may invoke `write` from
/// any thread. A payload is one or more complete, newline-terminated
/// records: sinks never split or reorder within a payload.
pub trait Sink: Send + Sync {
    /// Write one payload, returning the number of bytes written.
    fn write(&self, payload: &[u8]) -> Result<usize, SinkError>;

    /// Push any buffered bytes to the underlying destination.
    fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Flush and release resources. Writes after close return
    /// [`SinkError::Closed`].
    fn close(&self) -> Result<(), SinkError> {
        Ok(())
    }
}
