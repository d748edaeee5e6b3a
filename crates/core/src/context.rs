//! Request-scoped trace context.

use crate::entry::Entry;

/// Identifiers carried from the surrounding request into every entry
/// logged with it. All fields are optional; absent ones leave the entry
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogContext {
    trace_id: Option<String>,
    span_id: Option<String>,
    request_id: Option<String>,
    user_id: Option<String>,
    session_id: Option<String>,
}

impl LogContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_span_id(mut self, id: impl Into<String>) -> Self {
        self.span_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_user_id(mut self, id: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    pub fn span_id(&self) -> Option<&str> {
        self.span_id.as_deref()
    }

    pub(crate) fn apply(&self, entry: &mut Entry) {
        if let Some(v) = &self.trace_id {
            entry.set_trace_id(v);
        }
        if let Some(v) = &self.span_id {
            entry.set_span_id(v);
        }
        if let Some(v) = &self.request_id {
            entry.set_request_id(v);
        }
        if let Some(v) = &self.user_id {
            entry.set_user_id(v);
        }
        if let Some(v) = &self.session_id {
            entry.set_session_id(v);
        }
    }
}
