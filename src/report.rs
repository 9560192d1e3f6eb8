//! External error-reporting sink.
//!
//! Failures that an operator should look at (unknown delivery failures, store
//! trouble, failed startup attempts) are handed to an [`ErrorReporter`] in
//! addition to being logged. [`LogReporter`] is the default and only logs.

use tracing::error;

/// One reportable failure.
#[derive(Clone, Copy, Debug)]
pub struct ErrorEvent<'a> {
    /// Where the failure happened, e.g. `"delivery"` or `"startup"`.
    pub context: &'static str,
    /// Stable snake_case label of the failure.
    pub label: &'static str,
    pub message: &'a str,
    /// Subscription, topic or message id the failure concerns.
    pub resource: Option<&'a str>,
}

/// Sink for operator-facing failures.
pub trait ErrorReporter: Send + Sync + 'static {
    fn report(&self, event: &ErrorEvent<'_>);
}

/// Reports through `tracing` at error level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, event: &ErrorEvent<'_>) {
        error!(
            context = event.context,
            label = event.label,
            resource = event.resource.unwrap_or("-"),
            "{}",
            event.message
        );
    }
}
