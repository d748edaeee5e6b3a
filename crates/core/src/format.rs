//! Formatter boundary
//!
//! The engine hands a populated [`Entry`] and a pooled output buffer to a
//! [`Formatter`]; concrete renderings (text, JSON, CSV) live downstream.
//! Formatting must be deterministic for a given entry and must never
//! panic on a well-formed one.

use bytes::BytesMut;

use crate::entry::Entry;

/// Rendering failure. The entry is dropped and reported through the
/// logger's error handler; the engine keeps running.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("formatting failed: {0}")]
    Fmt(#[from] std::fmt::Error),
}

/// Renders entries into bytes.
pub trait Formatter: Send + Sync {
    /// Append the rendered entry (including any record terminator) to
    /// `out`. `out` may hold earlier records; implementations only append.
    fn format(&self, entry: &Entry, out: &mut BytesMut) -> Result<(), FormatError>;
}

/// `std::fmt::Write` adapter over a `BytesMut`, so formatters can use
/// `write!` without an intermediate `String`.
pub struct BytesWriter<'a>(pub &'a mut BytesMut);

impl std::fmt::Write for BytesWriter<'_> {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.0.extend_from_slice(s.as_bytes());
        Ok(())
    }
}
