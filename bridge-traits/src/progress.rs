//! Progress Reporting
//!
//! Human-readable progress lines emitted during a sync pass.

/// Receives progress messages, e.g. a status bar or notice area.
///
/// Any `Fn(&str)` closure is a sink.
pub trait ProgressSink: Send + Sync {
    fn report(&self, message: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, message: &str) {
        self(message)
    }
}

/// Discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _message: &str) {}
}
