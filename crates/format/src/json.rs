//! One JSON object per line
//!
//! Machine-oriented rendering via `serde_json`. String escaping is the
//! injection neutralization here: a newline in any value is emitted as
//! `\n` inside a JSON string, never as a record boundary. Top-level keys
//! can be remapped for downstream schemas that expect, say, `@timestamp`
//! or `severity`.

use std::collections::HashMap;

use bytes::BytesMut;
use chrono::SecondsFormat;
use serde_json::{json, Map, Value as Json};

use quill_core::{Entry, FieldValue, FormatError, Formatter};

use crate::mask::MaskPolicy;

#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    pretty: bool,
    key_map: HashMap<String, String>,
    mask: MaskPolicy,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Multi-line indented output. Meant for local debugging; the
    /// one-line default is what log shippers expect.
    #[must_use]
    pub fn with_pretty(mut self, on: bool) -> Self {
        self.pretty = on;
        self
    }

    /// Rename a top-level key in the emitted object.
    #[must_use]
    pub fn with_key_mapping(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.key_map.insert(from.into(), to.into());
        self
    }

    #[must_use]
    pub fn with_mask(mut self, mask: MaskPolicy) -> Self {
        self.mask = mask;
        self
    }

    fn key(&self, name: &str) -> String {
        self.key_map.get(name).cloned().unwrap_or_else(|| name.to_string())
    }

    fn insert(&self, map: &mut Map<String, Json>, name: &str, value: Json) {
        map.insert(self.key(name), value);
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, entry: &Entry, out: &mut BytesMut) -> Result<(), FormatError> {
        let mut map = Map::new();

        self.insert(
            &mut map,
            "timestamp",
            json!(entry.timestamp().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        self.insert(&mut map, "level", json!(entry.level().as_str()));
        self.insert(&mut map, "message", json!(entry.message()));

        if !entry.hostname().is_empty() {
            self.insert(&mut map, "hostname", json!(entry.hostname()));
        }
        if !entry.application().is_empty() {
            self.insert(&mut map, "application", json!(entry.application()));
        }
        if !entry.version().is_empty() {
            self.insert(&mut map, "version", json!(entry.version()));
        }
        if !entry.environment().is_empty() {
            self.insert(&mut map, "environment", json!(entry.environment()));
        }
        if entry.pid() != 0 {
            self.insert(&mut map, "pid", json!(entry.pid()));
        }
        if let Some((file, line)) = entry.caller() {
            self.insert(&mut map, "caller", json!(format!("{file}:{line}")));
        }

        if !entry.fields().is_empty() {
            let mut fields = Map::new();
            for field in entry.fields() {
                let value = if self.mask.is_sensitive(field.key()) {
                    json!(self.mask.mask())
                } else {
                    match field.value() {
                        FieldValue::Str(s) => json!(s.as_str()),
                        FieldValue::Int(v) => json!(v),
                        FieldValue::Float(v) => json!(v),
                        FieldValue::Bool(v) => json!(v),
                        FieldValue::Empty => Json::Null,
                    }
                };
                fields.insert(field.key().to_string(), value);
            }
            self.insert(&mut map, "fields", Json::Object(fields));
        }

        if entry.tag_count() > 0 {
            let tags: Vec<&str> = entry.tags().collect();
            self.insert(&mut map, "tags", json!(tags));
        }
        if !entry.metrics().is_empty() {
            let mut metrics = Map::new();
            for metric in entry.metrics() {
                metrics.insert(metric.key().to_string(), json!(metric.value()));
            }
            self.insert(&mut map, "metrics", Json::Object(metrics));
        }

        if !entry.trace_id().is_empty() {
            self.insert(&mut map, "trace_id", json!(entry.trace_id()));
        }
        if !entry.span_id().is_empty() {
            self.insert(&mut map, "span_id", json!(entry.span_id()));
        }
        if !entry.request_id().is_empty() {
            self.insert(&mut map, "request_id", json!(entry.request_id()));
        }
        if !entry.user_id().is_empty() {
            self.insert(&mut map, "user_id", json!(entry.user_id()));
        }
        if !entry.session_id().is_empty() {
            self.insert(&mut map, "session_id", json!(entry.session_id()));
        }

        if let Some(d) = entry.duration() {
            self.insert(&mut map, "duration_ms", json!(d.as_secs_f64() * 1000.0));
        }
        if !entry.error().is_empty() {
            self.insert(&mut map, "error", json!(entry.error()));
        }
        if !entry.stack_trace().is_empty() {
            self.insert(&mut map, "stack_trace", json!(entry.stack_trace()));
        }

        let rendered = if self.pretty {
            serde_json::to_vec_pretty(&Json::Object(map))?
        } else {
            serde_json::to_vec(&Json::Object(map))?
        };
        out.extend_from_slice(&rendered);
        out.extend_from_slice(b"\n");
        Ok(())
    }
}

#[cfg(test)]
#[path = "json_test.rs"]
mod json_test;
