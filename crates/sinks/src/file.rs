//! Plain append-only file sink.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::{Sink, SinkError};

/// Sink appending payloads to a single file, no rotation.
///
/// The file is opened in append mode at construction and held for the
/// lifetime of the sink. After [`Sink::close`] further writes fail with
/// [`SinkError::Closed`].
pub struct FileSink {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl FileSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(Some(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for FileSink {
    fn write(&self, payload: &[u8]) -> Result<usize, SinkError> {
        let mut guard = self.file.lock();
        let file = guard.as_mut().ok_or(SinkError::Closed)?;
        file.write_all(payload)?;
        Ok(payload.len())
    }

    fn flush(&self) -> Result<(), SinkError> {
        let mut guard = self.file.lock();
        let file = guard.as_mut().ok_or(SinkError::Closed)?;
        file.flush()?;
        Ok(())
    }

    fn close(&self) -> Result<(), SinkError> {
        let mut guard = self.file.lock();
        if let Some(mut file) = guard.take() {
            file.flush()?;
        }
        Ok(())
    }
}
