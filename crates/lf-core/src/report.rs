//! Error-reporting seam.
//!
//! Stage failures are reported fire-and-forget to an [`ErrorSink`] before
//! being returned to the caller. The default sink turns each report into a
//! structured `tracing` error event.

use crate::Error;

/// Receiver for failures that should reach an external error channel.
///
/// Implementations must not block and must not fail.
pub trait ErrorSink: Send + Sync {
    /// Report `error`, tagged with the operation that produced it.
    fn report(&self, context: &str, error: &Error);
}

/// Sink that emits every report as a `tracing::error!` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report(&self, context: &str, error: &Error) {
        tracing::error!(context, stage_failure = error.is_stage_failure(), "{error}");
    }
}
