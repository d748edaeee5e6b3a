//! CSV rendering with a caller-chosen column order
//!
//! One row per entry. Values containing commas, quotes, or line breaks
//! are quoted per RFC 4180, with embedded quotes doubled; newlines in the
//! message are additionally escaped to `\n` so a row stays on one line.
//! Missing values render as empty cells, keeping every row the same
//! width.

use std::fmt::Write as _;

use bytes::BytesMut;
use chrono::SecondsFormat;

use quill_core::{BytesWriter, Entry, FieldValue, FormatError, Formatter};

use crate::mask::MaskPolicy;

/// One column of the emitted row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvColumn {
    Timestamp,
    Level,
    Message,
    Hostname,
    Application,
    Environment,
    TraceId,
    SpanId,
    RequestId,
    UserId,
    SessionId,
    Caller,
    DurationMs,
    Error,
    /// A named structured field; empty cell when the entry lacks it.
    Field(String),
}

#[derive(Debug, Clone)]
pub struct CsvFormatter {
    columns: Vec<CsvColumn>,
    mask: MaskPolicy,
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self {
            columns: vec![CsvColumn::Timestamp, CsvColumn::Level, CsvColumn::Message],
            mask: MaskPolicy::default(),
        }
    }
}

impl CsvFormatter {
    pub fn new(columns: Vec<CsvColumn>) -> Self {
        Self {
            columns,
            mask: MaskPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_mask(mut self, mask: MaskPolicy) -> Self {
        self.mask = mask;
        self
    }

    /// Header row matching the configured columns.
    pub fn header(&self) -> String {
        let names: Vec<&str> = self
            .columns
            .iter()
            .map(|c| match c {
                CsvColumn::Timestamp => "timestamp",
                CsvColumn::Level => "level",
                CsvColumn::Message => "message",
                CsvColumn::Hostname => "hostname",
                CsvColumn::Application => "application",
                CsvColumn::Environment => "environment",
                CsvColumn::TraceId => "trace_id",
                CsvColumn::SpanId => "span_id",
                CsvColumn::RequestId => "request_id",
                CsvColumn::UserId => "user_id",
                CsvColumn::SessionId => "session_id",
                CsvColumn::Caller => "caller",
                CsvColumn::DurationMs => "duration_ms",
                CsvColumn::Error => "error",
                CsvColumn::Field(name) => name.as_str(),
            })
            .collect();
        names.join(",")
    }

    fn cell(&self, entry: &Entry, column: &CsvColumn) -> String {
        match column {
            CsvColumn::Timestamp => entry
                .timestamp()
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            CsvColumn::Level => entry.level().as_str().to_string(),
            CsvColumn::Message => entry.message().replace('\n', "\\n").replace('\r', "\\r"),
            CsvColumn::Hostname => entry.hostname().to_string(),
            CsvColumn::Application => entry.application().to_string(),
            CsvColumn::Environment => entry.environment().to_string(),
            CsvColumn::TraceId => entry.trace_id().to_string(),
            CsvColumn::SpanId => entry.span_id().to_string(),
            CsvColumn::RequestId => entry.request_id().to_string(),
            CsvColumn::UserId => entry.user_id().to_string(),
            CsvColumn::SessionId => entry.session_id().to_string(),
            CsvColumn::Caller => entry
                .caller()
                .map(|(file, line)| format!("{file}:{line}"))
                .unwrap_or_default(),
            CsvColumn::DurationMs => entry
                .duration()
                .map(|d| format!("{:.2}", d.as_secs_f64() * 1000.0))
                .unwrap_or_default(),
            CsvColumn::Error => entry.error().replace('\n', "\\n").replace('\r', "\\r"),
            CsvColumn::Field(name) => {
                if self.mask.is_sensitive(name) && entry.field(name).is_some() {
                    return self.mask.mask().to_string();
                }
                match entry.field(name) {
                    Some(FieldValue::Str(s)) => {
                        s.as_str().replace('\n', "\\n").replace('\r', "\\r")
                    }
                    Some(FieldValue::Int(v)) => v.to_string(),
                    Some(FieldValue::Float(v)) => v.to_string(),
                    Some(FieldValue::Bool(v)) => v.to_string(),
                    Some(FieldValue::Empty) | None => String::new(),
                }
            }
        }
    }
}

/// Quote a cell when it contains a separator, quote, or line break.
fn write_cell(w: &mut BytesWriter<'_>, cell: &str) -> std::fmt::Result {
    if cell.contains([',', '"', '\n', '\r']) {
        w.write_char('"')?;
        for c in cell.chars() {
            if c == '"' {
                w.write_str("\"\"")?;
            } else {
                w.write_char(c)?;
            }
        }
        w.write_char('"')
    } else {
        w.write_str(cell)
    }
}

impl Formatter for CsvFormatter {
    fn format(&self, entry: &Entry, out: &mut BytesMut) -> Result<(), FormatError> {
        let mut w = BytesWriter(out);
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                w.write_char(',')?;
            }
            let cell = self.cell(entry, column);
            write_cell(&mut w, &cell)?;
        }
        w.write_char('\n')?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "csv_test.rs"]
mod csv_test;
