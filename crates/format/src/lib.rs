//! Entry renderings
//!
//! Implementations of the core [`Formatter`] boundary: a human-oriented
//! text layout, one-object-per-line JSON, and CSV with a caller-chosen
//! column order. All three neutralize log injection (raw newlines in
//! untrusted text never produce extra records) and mask values of
//! sensitive-looking field keys via a shared [`MaskPolicy`].
//!
//! [`Formatter`]: quill_core::Formatter

mod csv;
mod json;
mod mask;
mod text;

pub use csv::{CsvColumn, CsvFormatter};
pub use json::JsonFormatter;
pub use mask::MaskPolicy;
pub use text::TextFormatter;
