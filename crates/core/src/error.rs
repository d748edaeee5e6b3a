//! Emission errors and the error-handler callback.

use std::sync::Arc;

use quill_sinks::SinkError;

use crate::format::FormatError;

/// Failure while emitting one entry. Emission errors never propagate to
/// the logging call site; they are routed to the configured handler.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("async queue full, entry dropped")]
    QueueFull,
}

/// Callback invoked for every emission failure. Must be cheap and must
/// not log through the same logger.
pub type ErrorHandler = Arc<dyn Fn(&LogError) + Send + Sync>;

/// Default handler: report through `tracing` and move on.
pub(crate) fn default_error_handler() -> ErrorHandler {
    Arc::new(|err| {
        tracing::error!(error = %err, "log emission failed");
    })
}
