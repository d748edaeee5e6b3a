//! Human-oriented single-line text layout
//!
//! One line per entry:
//!
//! ```text
//! [2026-08-26 10:15:42.123] [WARN] api cache miss storm shard=7 #cache duration_ms=12.40 trace_id=abc (src/cache.rs:88)
//! ```
//!
//! Raw newlines and carriage returns in the message and in string field
//! values are escaped to the literal two-character sequences `\n` and
//! `\r`, so untrusted input cannot fabricate additional records. An
//! optional stack trace follows as indented continuation lines.

use std::fmt::Write as _;

use bytes::BytesMut;
use owo_colors::{OwoColorize, Style};

use quill_core::{BytesWriter, Entry, FieldValue, FormatError, Formatter, Level};

use crate::mask::MaskPolicy;

const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Configurable text renderer.
#[derive(Debug, Clone)]
pub struct TextFormatter {
    colors: bool,
    timestamps: bool,
    timestamp_format: String,
    show_caller: bool,
    show_pid: bool,
    mask: MaskPolicy,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self {
            colors: false,
            timestamps: true,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            show_caller: true,
            show_pid: false,
            mask: MaskPolicy::default(),
        }
    }
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_colors(mut self, on: bool) -> Self {
        self.colors = on;
        self
    }

    #[must_use]
    pub fn with_timestamps(mut self, on: bool) -> Self {
        self.timestamps = on;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, fmt: impl Into<String>) -> Self {
        self.timestamp_format = fmt.into();
        self
    }

    #[must_use]
    pub fn with_caller(mut self, on: bool) -> Self {
        self.show_caller = on;
        self
    }

    #[must_use]
    pub fn with_pid(mut self, on: bool) -> Self {
        self.show_pid = on;
        self
    }

    #[must_use]
    pub fn with_mask(mut self, mask: MaskPolicy) -> Self {
        self.mask = mask;
        self
    }
}

fn level_style(level: Level) -> Style {
    match level {
        Level::Trace => Style::new().dimmed(),
        Level::Debug => Style::new().cyan(),
        Level::Info => Style::new().green(),
        Level::Notice => Style::new().blue(),
        Level::Warn => Style::new().yellow(),
        Level::Error => Style::new().red(),
        Level::Fatal | Level::Panic => Style::new().bright_red().bold(),
    }
}

/// Write `s` with record-splitting characters escaped.
fn write_escaped(w: &mut BytesWriter<'_>, s: &str) -> std::fmt::Result {
    for c in s.chars() {
        match c {
            '\n' => w.write_str("\\n")?,
            '\r' => w.write_str("\\r")?,
            c => w.write_char(c)?,
        }
    }
    Ok(())
}

impl Formatter for TextFormatter {
    fn format(&self, entry: &Entry, out: &mut BytesMut) -> Result<(), FormatError> {
        let mut w = BytesWriter(out);

        if self.timestamps {
            write!(
                w,
                "[{}] ",
                entry.timestamp().format(&self.timestamp_format)
            )?;
        }

        if self.colors {
            write!(w, "[{}]", entry.level().as_str().style(level_style(entry.level())))?;
        } else {
            write!(w, "[{}]", entry.level())?;
        }

        if !entry.application().is_empty() {
            write!(w, " {}", entry.application())?;
        }
        if self.show_pid && entry.pid() != 0 {
            write!(w, " pid={}", entry.pid())?;
        }

        w.write_str(" ")?;
        write_escaped(&mut w, entry.message())?;

        for field in entry.fields() {
            write!(w, " {}=", field.key())?;
            if self.mask.is_sensitive(field.key()) {
                w.write_str(self.mask.mask())?;
                continue;
            }
            match field.value() {
                FieldValue::Str(s) => write_escaped(&mut w, s.as_str())?,
                FieldValue::Int(v) => write!(w, "{v}")?,
                FieldValue::Float(v) => write!(w, "{v}")?,
                FieldValue::Bool(v) => write!(w, "{v}")?,
                FieldValue::Empty => {}
            }
        }

        for tag in entry.tags() {
            write!(w, " #{tag}")?;
        }
        for metric in entry.metrics() {
            write!(w, " {}={:.2}", metric.key(), metric.value())?;
        }

        if let Some(d) = entry.duration() {
            write!(w, " duration_ms={:.2}", d.as_secs_f64() * 1000.0)?;
        }
        if !entry.trace_id().is_empty() {
            write!(w, " trace_id={}", entry.trace_id())?;
        }
        if !entry.span_id().is_empty() {
            write!(w, " span_id={}", entry.span_id())?;
        }
        if !entry.request_id().is_empty() {
            write!(w, " request_id={}", entry.request_id())?;
        }
        if !entry.user_id().is_empty() {
            write!(w, " user_id={}", entry.user_id())?;
        }
        if !entry.session_id().is_empty() {
            write!(w, " session_id={}", entry.session_id())?;
        }
        if !entry.error().is_empty() {
            w.write_str(" error=\"")?;
            write_escaped(&mut w, entry.error())?;
            w.write_str("\"")?;
        }

        if self.show_caller {
            if let Some((file, line)) = entry.caller() {
                write!(w, " ({file}:{line})")?;
            }
        }
        w.write_str("\n")?;

        if !entry.stack_trace().is_empty() {
            for line in entry.stack_trace().lines() {
                writeln!(w, "    {line}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "text_test.rs"]
mod text_test;
