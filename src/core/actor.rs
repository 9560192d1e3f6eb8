//! # StartupActor: bounded retry for one subscription.
//!
//! ## Event flow
//! ```text
//! AttemptStarting → [resolve + start] → ListenerRunning        (success)
//!                                     → AttemptFailed
//!                                         ├─ fatal       → StartupExhausted
//!                                         ├─ budget left → RetryScheduled → [sleep] → next attempt
//!                                         └─ budget spent → StartupExhausted
//! ```
//!
//! ## Rules
//! - Attempts run sequentially within one actor; actors run concurrently.
//! - Cancellation is checked before each attempt and during the retry sleep.
//!   An attempt in progress always completes so a started listener is never leaked.
//! - No sleep after the final failed attempt.
//! - A zero budget fails immediately with [`StartupError::NoAttempts`].

use std::sync::Arc;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::attempt::{StartupContext, run_attempt};
use super::spec::SubscriptionSpec;
use crate::error::{AttemptError, StartupError};
use crate::events::{Event, EventKind};
use crate::listener::SubscriptionHandle;
use crate::report::ErrorEvent;

/// Brings up one subscription or reports why it could not.
pub(crate) struct StartupActor {
    spec: SubscriptionSpec,
    ctx: Arc<StartupContext>,
}

impl StartupActor {
    pub(crate) fn new(spec: SubscriptionSpec, ctx: Arc<StartupContext>) -> Self {
        Self { spec, ctx }
    }

    pub(crate) async fn run(
        self,
        token: CancellationToken,
    ) -> Result<SubscriptionHandle, StartupError> {
        let topic = self.spec.topic.as_str();
        let retry = self.spec.retry;
        let mut resolved: Option<String> = None;
        let mut attempt: u32 = 0;

        if retry.max_attempts() == 0 {
            let reason = "retry budget is zero";
            self.exhausted(0, reason);
            self.ctx.reporter.report(&ErrorEvent {
                context: "startup",
                label: "startup_no_attempts",
                message: reason,
                resource: Some(topic),
            });
            return Err(StartupError::NoAttempts {
                topic: topic.to_string(),
            });
        }

        loop {
            if token.is_cancelled() {
                return Err(self.cancelled());
            }
            attempt += 1;
            info!(topic, attempt, max = retry.max_attempts(), "starting subscriber");
            self.ctx.bus.publish(
                Event::new(EventKind::AttemptStarting)
                    .with_subscription(topic)
                    .with_attempt(attempt),
            );

            let err = match run_attempt(&self.ctx, &self.spec, &mut resolved).await {
                Ok(handle) => {
                    info!(
                        topic,
                        subscription = %handle.identity().name(),
                        attempt,
                        "subscriber running"
                    );
                    self.ctx.bus.publish(
                        Event::new(EventKind::ListenerRunning)
                            .with_subscription(handle.identity().name())
                            .with_attempt(attempt),
                    );
                    return Ok(handle);
                }
                Err(e) => e,
            };

            let reason = err.to_string();
            warn!(topic, attempt, error = %reason, label = err.as_label(), "subscriber attempt failed");
            self.ctx.bus.publish(
                Event::new(EventKind::AttemptFailed)
                    .with_subscription(topic)
                    .with_attempt(attempt)
                    .with_reason(reason.as_str()),
            );
            self.ctx.reporter.report(&ErrorEvent {
                context: "startup",
                label: err.as_label(),
                message: &reason,
                resource: Some(topic),
            });

            if !err.is_retryable() {
                self.exhausted(attempt, &reason);
                return Err(match err {
                    AttemptError::Resolve(source) => StartupError::Provisioning {
                        topic: topic.to_string(),
                        source,
                    },
                    last_error => self.retries_exhausted(attempt, resolved, last_error),
                });
            }
            if !retry.has_next(attempt) {
                self.exhausted(attempt, &reason);
                return Err(self.retries_exhausted(attempt, resolved, err));
            }

            let delay = retry.next_delay();
            self.ctx.bus.publish(
                Event::new(EventKind::RetryScheduled)
                    .with_subscription(topic)
                    .with_attempt(attempt)
                    .with_delay(delay)
                    .with_reason(reason.as_str()),
            );

            let sleep = time::sleep(delay);
            tokio::pin!(sleep);
            select! {
                _ = &mut sleep => {}
                _ = token.cancelled() => return Err(self.cancelled()),
            }
        }
    }

    fn exhausted(&self, attempt: u32, reason: &str) {
        error!(
            topic = %self.spec.topic,
            attempts = attempt,
            delay = ?self.spec.retry.delay,
            error = reason,
            "unable to start subscriber; aborting startup"
        );
        self.ctx.bus.publish(
            Event::new(EventKind::StartupExhausted)
                .with_subscription(self.spec.topic.as_str())
                .with_attempt(attempt)
                .with_reason(reason),
        );
    }

    fn retries_exhausted(
        &self,
        attempts: u32,
        subscription: Option<String>,
        last_error: AttemptError,
    ) -> StartupError {
        StartupError::RetriesExhausted {
            topic: self.spec.topic.clone(),
            subscription,
            attempts,
            delay: self.spec.retry.delay,
            last_error,
        }
    }

    fn cancelled(&self) -> StartupError {
        info!(topic = %self.spec.topic, "subscriber startup cancelled");
        StartupError::Cancelled {
            topic: self.spec.topic.clone(),
        }
    }
}
