//! Error types used along the subscriber startup path.
//!
//! - [`ListenerError`] raised by the broker client when starting or stopping a listener.
//! - [`AttemptError`] one failed startup attempt (resolution or listener start).
//! - [`StartupError`] terminal outcome of `start_all`; always aborts startup.
//! - [`RunError`] outcome of the start/wait/teardown lifecycle.
//!
//! Provisioning and delivery errors live next to their modules
//! ([`ProvisionError`], [`DecodeError`](crate::DecodeError),
//! [`RouteError`](crate::RouteError)). All types provide `as_label` for
//! logs/metrics.

use std::time::Duration;

use thiserror::Error;

use crate::provision::ProvisionError;

/// Errors produced by the broker client for a single listener.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListenerError {
    /// Listener could not be bound to the subscription (broker unreachable, bad endpoint).
    #[error("failed to start listener: {reason}")]
    Start { reason: String },

    /// Stop signal could not be delivered.
    #[error("failed to stop listener: {reason}")]
    Stop { reason: String },
}

impl ListenerError {
    pub fn start(reason: impl Into<String>) -> Self {
        ListenerError::Start {
            reason: reason.into(),
        }
    }

    pub fn stop(reason: impl Into<String>) -> Self {
        ListenerError::Stop {
            reason: reason.into(),
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            ListenerError::Start { .. } => "listener_start_failed",
            ListenerError::Stop { .. } => "listener_stop_failed",
        }
    }
}

/// # Failure of one startup attempt.
///
/// Transient failures are retried by the startup actor; fatal provisioning
/// errors (permission gaps, invalid names) end the loop immediately.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum AttemptError {
    #[error("resolving subscription failed: {0}")]
    Resolve(#[from] ProvisionError),

    #[error(transparent)]
    Start(#[from] ListenerError),
}

impl AttemptError {
    pub fn as_label(&self) -> &'static str {
        match self {
            AttemptError::Resolve(e) => e.as_label(),
            AttemptError::Start(e) => e.as_label(),
        }
    }

    /// Returns `true` if a later attempt could succeed.
    ///
    /// # Example
    /// ```
    /// use subvisor::{AttemptError, ListenerError};
    ///
    /// assert!(AttemptError::Start(ListenerError::start("refused")).is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            AttemptError::Resolve(e) => !e.is_fatal(),
            AttemptError::Start(_) => true,
        }
    }
}

/// # Fatal startup outcome.
///
/// Any of these must abort process startup: a service with only part of its
/// inputs wired is unsafe to run.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum StartupError {
    /// Every attempt failed with a transient error.
    #[error(
        "could not start listener for topic {topic} ({}) after {attempts} attempts {delay:?} apart: {last_error}",
        .subscription.as_deref().unwrap_or("unresolved subscription")
    )]
    RetriesExhausted {
        topic: String,
        /// Final subscription name, if resolution got that far.
        subscription: Option<String>,
        attempts: u32,
        delay: Duration,
        #[source]
        last_error: AttemptError,
    },

    /// Provisioning hit an unrecoverable configuration error. Never retried.
    #[error("provisioning for topic {topic} failed: {source}")]
    Provisioning {
        topic: String,
        #[source]
        source: ProvisionError,
    },

    /// The retry budget allows no attempt at all.
    #[error("no startup attempt allowed for topic {topic}: retry budget is zero")]
    NoAttempts { topic: String },

    /// Startup for this topic was abandoned because a sibling failed or shutdown began.
    #[error("startup for topic {topic} was cancelled")]
    Cancelled { topic: String },

    /// The startup task for this topic panicked.
    #[error("startup for topic {topic} panicked: {reason}")]
    Panicked { topic: String, reason: String },
}

impl StartupError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use subvisor::StartupError;
    ///
    /// let err = StartupError::Cancelled { topic: "orders".into() };
    /// assert_eq!(err.as_label(), "startup_cancelled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StartupError::RetriesExhausted { .. } => "startup_retries_exhausted",
            StartupError::Provisioning { .. } => "startup_provisioning_failed",
            StartupError::NoAttempts { .. } => "startup_no_attempts",
            StartupError::Cancelled { .. } => "startup_cancelled",
            StartupError::Panicked { .. } => "startup_panicked",
        }
    }

    /// Topic base name the error refers to.
    pub fn topic(&self) -> &str {
        match self {
            StartupError::RetriesExhausted { topic, .. }
            | StartupError::Provisioning { topic, .. }
            | StartupError::NoAttempts { topic }
            | StartupError::Cancelled { topic }
            | StartupError::Panicked { topic, .. } => topic,
        }
    }
}

/// # Errors produced by [`SubscriberManager::run`](crate::SubscriberManager::run).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Startup(#[from] StartupError),

    /// OS signal handlers could not be installed; listeners were stopped.
    #[error("failed to install shutdown signal handlers: {0}")]
    Signal(#[from] std::io::Error),
}

impl RunError {
    pub fn as_label(&self) -> &'static str {
        match self {
            RunError::Startup(e) => e.as_label(),
            RunError::Signal(_) => "run_signal_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::ResourceKind;

    #[test]
    fn permission_gaps_are_not_retryable() {
        let err = AttemptError::from(ProvisionError::PermissionDenied {
            kind: ResourceKind::Subscription,
            name: "orders-core".into(),
            missing: vec!["pubsub.subscriptions.create"],
        });
        assert!(!err.is_retryable());
        assert_eq!(err.as_label(), "provision_permission_denied");
    }

    #[test]
    fn exhaustion_message_names_topic_and_budget() {
        let err = StartupError::RetriesExhausted {
            topic: "orders".into(),
            subscription: Some("orders-core".into()),
            attempts: 3,
            delay: Duration::from_secs(1),
            last_error: AttemptError::Start(ListenerError::start("connection refused")),
        };
        let msg = err.to_string();
        assert!(msg.contains("orders"));
        assert!(msg.contains("orders-core"));
        assert!(msg.contains("3 attempts"));
        assert!(msg.contains("connection refused"));
        assert_eq!(err.topic(), "orders");
    }
}
