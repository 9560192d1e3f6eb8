//! # Lifecycle events emitted by the subscriber manager.
//!
//! The [`EventKind`] enum classifies events across two groups:
//! - **Startup events**: per-subscription attempt flow (starting, failed, retry, running, exhausted)
//! - **Shutdown / runtime events**: stop requests, listener stops and failures
//!
//! Each [`Event`] carries a globally unique `seq` that increases monotonically,
//! so observers can restore order if deliveries interleave.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use subvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RetryScheduled)
//!     .with_subscription("orders-core")
//!     .with_attempt(2)
//!     .with_delay(Duration::from_secs(1))
//!     .with_reason("broker unavailable");
//!
//! assert_eq!(ev.kind, EventKind::RetryScheduled);
//! assert_eq!(ev.subscription.as_deref(), Some("orders-core"));
//! assert_eq!(ev.delay_ms, Some(1000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Startup ===
    /// One startup attempt begins.
    ///
    /// Sets `subscription` (topic base name), `attempt` (1-based).
    AttemptStarting,

    /// One startup attempt failed.
    ///
    /// Sets `subscription`, `attempt`, `reason`.
    AttemptFailed,

    /// Next attempt scheduled after a failure.
    ///
    /// Sets `subscription`, `attempt` (the failed one), `delay_ms`, `reason`.
    RetryScheduled,

    /// Listener is bound and running.
    ///
    /// Sets `subscription` (final resource name), `attempt`.
    ListenerRunning,

    /// Retry budget spent or a fatal error hit; startup will abort.
    ///
    /// Sets `subscription`, `attempt` (last), `reason`.
    StartupExhausted,

    // === Shutdown / runtime ===
    /// Teardown started (signal or explicit call).
    ShutdownRequested,

    /// Stop signal issued to a listener.
    ///
    /// Sets `subscription`, and `reason` if the stop call itself failed.
    ListenerStopped,

    /// A running listener reported a fatal failure.
    ///
    /// Sets `subscription`, `reason`.
    ListenerFailed,
}

/// Lifecycle event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Subscription the event refers to.
    pub subscription: Option<Arc<str>>,
    /// Attempt number (starting from 1).
    pub attempt: Option<u32>,
    /// Delay before the next attempt in milliseconds.
    pub delay_ms: Option<u32>,
    /// Human-readable reason (error text).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates an event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            subscription: None,
            attempt: None,
            delay_ms: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_subscription(mut self, name: impl Into<Arc<str>>) -> Self {
        self.subscription = Some(name.into());
        self
    }

    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a delay (stored as milliseconds, saturating).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
