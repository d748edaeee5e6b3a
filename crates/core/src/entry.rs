//! Pooled log entry
//!
//! An [`Entry`] is one contiguous fixed-capacity block: message, fields,
//! tags, metrics, trace context, caller info, and process metadata all
//! live inline in bounded buffers. Populating an entry allocates nothing;
//! anything that does not fit is silently truncated or dropped, with the
//! bounded types cutting at character boundaries.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::bounded::BoundedStr;
use crate::level::Level;

/// Maximum structured fields per entry; extras are dropped.
pub const MAX_FIELDS: usize = 16;
/// Maximum tags per entry.
pub const MAX_TAGS: usize = 8;
/// Maximum inline metric samples per entry.
pub const MAX_METRICS: usize = 8;

/// Appended to a message that hit the length limit.
pub const TRUNCATION_MARKER: &str = "... [truncated]";

const MESSAGE_CAPACITY: usize = 1024;

/// Borrowed field value, used at the logging call site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Str(&'a str),
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// Owned field value, used for configured global fields.
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl OwnedValue {
    pub(crate) fn as_value(&self) -> Value<'_> {
        match self {
            OwnedValue::Str(s) => Value::Str(s),
            OwnedValue::Int(v) => Value::Int(*v),
            OwnedValue::Float(v) => Value::Float(*v),
            OwnedValue::Bool(v) => Value::Bool(*v),
        }
    }
}

/// Field value stored inside an entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Empty,
    Str(BoundedStr<256>),
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// One structured key/value pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field {
    key: BoundedStr<64>,
    value: FieldValue,
}

impl Field {
    const EMPTY: Field = Field {
        key: BoundedStr::new(),
        value: FieldValue::Empty,
    };

    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }
}

/// One inline metric sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metric {
    key: BoundedStr<64>,
    value: f64,
}

impl Metric {
    const EMPTY: Metric = Metric {
        key: BoundedStr::new(),
        value: 0.0,
    };

    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Fixed-capacity log record, recycled through [`crate::EntryPool`].
#[derive(Clone)]
pub struct Entry {
    timestamp: DateTime<Utc>,
    level: Level,
    message: BoundedStr<MESSAGE_CAPACITY>,
    message_truncated: bool,

    fields: [Field; MAX_FIELDS],
    field_count: usize,
    tags: [BoundedStr<32>; MAX_TAGS],
    tag_count: usize,
    metrics: [Metric; MAX_METRICS],
    metric_count: usize,

    trace_id: BoundedStr<32>,
    span_id: BoundedStr<32>,
    request_id: BoundedStr<32>,
    user_id: BoundedStr<64>,
    session_id: BoundedStr<64>,

    file: BoundedStr<128>,
    line: u32,

    pid: u32,
    hostname: BoundedStr<64>,
    application: BoundedStr<64>,
    version: BoundedStr<32>,
    environment: BoundedStr<32>,

    duration: Option<Duration>,
    error: BoundedStr<256>,
    stack_trace: BoundedStr<4096>,
}

impl Entry {
    pub fn new() -> Self {
        Self {
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            level: Level::Info,
            message: BoundedStr::new(),
            message_truncated: false,
            fields: [Field::EMPTY; MAX_FIELDS],
            field_count: 0,
            tags: [BoundedStr::new(); MAX_TAGS],
            tag_count: 0,
            metrics: [Metric::EMPTY; MAX_METRICS],
            metric_count: 0,
            trace_id: BoundedStr::new(),
            span_id: BoundedStr::new(),
            request_id: BoundedStr::new(),
            user_id: BoundedStr::new(),
            session_id: BoundedStr::new(),
            file: BoundedStr::new(),
            line: 0,
            pid: 0,
            hostname: BoundedStr::new(),
            application: BoundedStr::new(),
            version: BoundedStr::new(),
            environment: BoundedStr::new(),
            duration: None,
            error: BoundedStr::new(),
            stack_trace: BoundedStr::new(),
        }
    }

    /// Clear every buffer for reuse. Capacity is retained by construction;
    /// only the used lengths are touched.
    pub fn reset(&mut self) {
        self.timestamp = DateTime::<Utc>::UNIX_EPOCH;
        self.level = Level::Info;
        self.message.clear();
        self.message_truncated = false;
        self.field_count = 0;
        self.tag_count = 0;
        self.metric_count = 0;
        self.trace_id.clear();
        self.span_id.clear();
        self.request_id.clear();
        self.user_id.clear();
        self.session_id.clear();
        self.file.clear();
        self.line = 0;
        self.pid = 0;
        self.hostname.clear();
        self.application.clear();
        self.version.clear();
        self.environment.clear();
        self.duration = None;
        self.error.clear();
        self.stack_trace.clear();
    }

    pub fn set_timestamp(&mut self, ts: DateTime<Utc>) {
        self.timestamp = ts;
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn set_level(&mut self, level: Level) {
        self.level = level;
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Store the message, cutting at `max_len` bytes (character-aligned)
    /// and appending [`TRUNCATION_MARKER`] when anything was dropped.
    pub fn set_message(&mut self, msg: &str, max_len: usize) {
        let limit = max_len.min(MESSAGE_CAPACITY - TRUNCATION_MARKER.len());
        self.message.clear();
        self.message_truncated = false;

        if msg.len() <= limit {
            self.message.set(msg);
            return;
        }

        let mut cut = limit;
        while cut > 0 && !msg.is_char_boundary(cut) {
            cut -= 1;
        }
        self.message.set(&msg[..cut]);
        self.message.push_str(TRUNCATION_MARKER);
        self.message_truncated = true;
    }

    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    pub fn message_truncated(&self) -> bool {
        self.message_truncated
    }

    /// Add one field; silently dropped when the entry already holds
    /// [`MAX_FIELDS`]. Returns whether it was stored.
    pub fn add_field(&mut self, key: &str, value: Value<'_>) -> bool {
        if self.field_count >= MAX_FIELDS {
            return false;
        }
        let slot = &mut self.fields[self.field_count];
        slot.key.set(key);
        slot.value = match value {
            Value::Str(s) => FieldValue::Str(BoundedStr::from(s)),
            Value::Int(v) => FieldValue::Int(v),
            Value::Float(v) => FieldValue::Float(v),
            Value::Bool(v) => FieldValue::Bool(v),
        };
        self.field_count += 1;
        true
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields[..self.field_count]
    }

    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields().iter().find(|f| f.key() == key).map(Field::value)
    }

    pub fn add_tag(&mut self, tag: &str) -> bool {
        if self.tag_count >= MAX_TAGS {
            return false;
        }
        self.tags[self.tag_count].set(tag);
        self.tag_count += 1;
        true
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags[..self.tag_count].iter().map(BoundedStr::as_str)
    }

    pub fn tag_count(&self) -> usize {
        self.tag_count
    }

    pub fn add_metric(&mut self, key: &str, value: f64) -> bool {
        if self.metric_count >= MAX_METRICS {
            return false;
        }
        let slot = &mut self.metrics[self.metric_count];
        slot.key.set(key);
        slot.value = value;
        self.metric_count += 1;
        true
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics[..self.metric_count]
    }

    pub fn set_trace_id(&mut self, v: &str) {
        self.trace_id.set(v);
    }

    pub fn trace_id(&self) -> &str {
        self.trace_id.as_str()
    }

    pub fn set_span_id(&mut self, v: &str) {
        self.span_id.set(v);
    }

    pub fn span_id(&self) -> &str {
        self.span_id.as_str()
    }

    pub fn set_request_id(&mut self, v: &str) {
        self.request_id.set(v);
    }

    pub fn request_id(&self) -> &str {
        self.request_id.as_str()
    }

    pub fn set_user_id(&mut self, v: &str) {
        self.user_id.set(v);
    }

    pub fn user_id(&self) -> &str {
        self.user_id.as_str()
    }

    pub fn set_session_id(&mut self, v: &str) {
        self.session_id.set(v);
    }

    pub fn session_id(&self) -> &str {
        self.session_id.as_str()
    }

    pub fn set_caller(&mut self, file: &str, line: u32) {
        self.file.set(file);
        self.line = line;
    }

    pub fn caller(&self) -> Option<(&str, u32)> {
        if self.file.is_empty() {
            None
        } else {
            Some((self.file.as_str(), self.line))
        }
    }

    pub fn set_process_meta(
        &mut self,
        pid: u32,
        hostname: &str,
        application: &str,
        version: &str,
        environment: &str,
    ) {
        self.pid = pid;
        self.hostname.set(hostname);
        self.application.set(application);
        self.version.set(version);
        self.environment.set(environment);
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn hostname(&self) -> &str {
        self.hostname.as_str()
    }

    pub fn application(&self) -> &str {
        self.application.as_str()
    }

    pub fn version(&self) -> &str {
        self.version.as_str()
    }

    pub fn environment(&self) -> &str {
        self.environment.as_str()
    }

    pub fn set_duration(&mut self, d: Duration) {
        self.duration = Some(d);
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn set_error(&mut self, err: &str) {
        self.error.set(err);
    }

    pub fn error(&self) -> &str {
        self.error.as_str()
    }

    pub fn set_stack_trace(&mut self, trace: &str) {
        self.stack_trace.set(trace);
    }

    pub fn stack_trace(&self) -> &str {
        self.stack_trace.as_str()
    }
}

impl Default for Entry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("timestamp", &self.timestamp)
            .field("level", &self.level)
            .field("message", &self.message)
            .field("field_count", &self.field_count)
            .field("tag_count", &self.tag_count)
            .field("metric_count", &self.metric_count)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "entry_test.rs"]
mod entry_test;
