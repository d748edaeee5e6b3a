//! Console sink writing to stdout or stderr.

use std::io::Write;

use parking_lot::Mutex;

use crate::{Sink, SinkError};

/// Which standard stream to write to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStream {
    Stdout,
    Stderr,
}

/// Sink that writes payloads to a standard stream.
///
/// A local mutex serializes writes so interleaved payloads from different
/// threads stay whole even when the process also writes to the same stream
/// elsewhere.
pub struct ConsoleSink {
    stream: ConsoleStream,
    lock: Mutex<()>,
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        Self::new(ConsoleStream::Stdout)
    }

    pub fn stderr() -> Self {
        Self::new(ConsoleStream::Stderr)
    }

    pub fn new(stream: ConsoleStream) -> Self {
        Self {
            stream,
            lock: Mutex::new(()),
        }
    }
}

impl Sink for ConsoleSink {
    fn write(&self, payload: &[u8]) -> Result<usize, SinkError> {
        let _guard = self.lock.lock();
        match self.stream {
            ConsoleStream::Stdout => {
                let mut out = std::io::stdout().lock();
                out.write_all(payload)?;
            }
            ConsoleStream::Stderr => {
                let mut out = std::io::stderr().lock();
                out.write_all(payload)?;
            }
        }
        Ok(payload.len())
    }

    fn flush(&self) -> Result<(), SinkError> {
        let _guard = self.lock.lock();
        match self.stream {
            ConsoleStream::Stdout => std::io::stdout().lock().flush()?,
            ConsoleStream::Stderr => std::io::stderr().lock().flush()?,
        }
        Ok(())
    }
}
