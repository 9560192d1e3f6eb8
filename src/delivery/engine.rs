//! # Acknowledgment engine.
//!
//! ```text
//! receive(msg, reply)
//!   ├─ pubsub_receive_counter += 1
//!   ├─ decode (panic caught) ──Err───────┐
//!   ├─ route (panic caught) ─────────────┤
//!   │                                    ▼
//!   │                         DeliveryOutcome ─► log / report
//!   └─ settle: reply.ack() | reply.nack()  +  exactly one of ack/autoack/nack counters
//! ```
//!
//! The engine holds no per-message state and is shared across listeners and
//! worker threads. A router that never returns blocks its delivery slot.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use metrics::Label;
use tracing::{debug, error, info, trace, warn};

use super::decode::{Decoder, Envelope};
use super::message::InboundMessage;
use super::outcome::{AckAction, AckDecision, DeliveryOutcome, RECEIVE_COUNTER};
use super::route::{DeliveryContext, RouteError, Router};
use crate::report::{ErrorEvent, ErrorReporter, LogReporter};
use crate::subscribers::panic_message;

/// Default message attributes copied onto outcome counters.
pub const DEFAULT_METRIC_TAGS: &[&str] = &["action"];

/// Label value used when a tagged attribute is absent.
const MISSING_TAG: &str = "unknown";

/// Broker acknowledgment handle for one delivery.
///
/// Both methods consume the reply, so a delivery is settled at most once.
pub trait AckReply: Send + 'static {
    fn ack(self: Box<Self>);
    fn nack(self: Box<Self>);
}

/// Message sink a listener feeds deliveries into.
#[async_trait]
pub trait MessageReceiver: Send + Sync + 'static {
    async fn receive(&self, message: InboundMessage, reply: Box<dyn AckReply>);
}

/// Decodes, routes and settles deliveries.
pub struct AckEngine {
    decoder: Arc<dyn Decoder>,
    router: Arc<dyn Router>,
    reporter: Arc<dyn ErrorReporter>,
    metric_tags: Vec<String>,
}

impl AckEngine {
    pub fn new(decoder: Arc<dyn Decoder>, router: Arc<dyn Router>) -> Self {
        Self {
            decoder,
            router,
            reporter: Arc::new(LogReporter),
            metric_tags: DEFAULT_METRIC_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Attribute names to copy onto the ack/autoack/nack counters.
    #[must_use]
    pub fn with_metric_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metric_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Decodes and routes `message`, logging and reporting the outcome.
    ///
    /// Does not touch the broker or any counter.
    pub async fn process(&self, message: &InboundMessage) -> DeliveryOutcome {
        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(
                message_id = %message.id,
                raw = %String::from_utf8_lossy(&message.payload),
                "got message from pubsub"
            );
        }

        let format = message.format_version();
        info!(message_id = %message.id, ?format, "processing message");
        let decoded = std::panic::catch_unwind(AssertUnwindSafe(|| self.decoder.decode(message)));

        let result = match decoded {
            Ok(Ok(env)) => self.dispatch(&env, message).await,
            Ok(Err(e)) => Err(RouteError::Invalid(e)),
            Err(panic) => Err(RouteError::other(format!(
                "decoder panicked: {}",
                panic_message(panic.as_ref())
            ))),
        };
        let outcome = DeliveryOutcome::from_route(&result);
        self.observe(message, outcome, result.err());
        outcome
    }

    /// Applies the decision for `outcome`: exactly one broker action and one counter.
    pub fn settle(
        &self,
        message: &InboundMessage,
        outcome: DeliveryOutcome,
        reply: Box<dyn AckReply>,
    ) -> AckDecision {
        let decision = outcome.decision();
        match decision.action {
            AckAction::Ack => reply.ack(),
            AckAction::Nack => reply.nack(),
        }
        metrics::counter!(decision.counter.metric_name(), self.labels(message)).increment(1);
        trace!(
            message_id = %message.id,
            outcome = outcome.as_label(),
            action = ?decision.action,
            "delivery settled"
        );
        decision
    }

    async fn dispatch(&self, env: &Envelope, message: &InboundMessage) -> Result<(), RouteError> {
        let ctx = DeliveryContext {
            message_id: &message.id,
            attributes: &message.attributes,
            delivery_attempt: message.delivery_attempt,
        };
        match AssertUnwindSafe(self.router.route(env, &ctx))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => Err(RouteError::other(format!(
                "router panicked: {}",
                panic_message(panic.as_ref())
            ))),
        }
    }

    fn observe(&self, message: &InboundMessage, outcome: DeliveryOutcome, err: Option<RouteError>) {
        let id = message.id.as_str();
        let reason = err.as_ref().map(ToString::to_string).unwrap_or_default();
        match outcome {
            DeliveryOutcome::Success => debug!(message_id = id, "message processed"),
            DeliveryOutcome::Unsupported => {
                info!(message_id = id, %reason, "unsupported message acked")
            }
            DeliveryOutcome::Malformed {
                not_configured: true,
            } => info!(message_id = id, %reason, "message not configured for this service, acked"),
            DeliveryOutcome::Malformed {
                not_configured: false,
            } => error!(message_id = id, %reason, "invalid message acked"),
            DeliveryOutcome::BusinessRejection => {
                warn!(message_id = id, %reason, "message rejected by business rules, acked")
            }
            DeliveryOutcome::DataConflict { already_exists } => {
                warn!(message_id = id, already_exists, %reason, "store conflict");
                self.report(outcome, id, &reason);
            }
            DeliveryOutcome::PersistenceFailure { already_applied } => {
                warn!(message_id = id, already_applied, %reason, "persistence failure");
                self.report(outcome, id, &reason);
            }
            DeliveryOutcome::TransientFailure => {
                error!(message_id = id, %reason, "unclassified failure, message nacked");
                self.report(outcome, id, &reason);
            }
        }
    }

    fn report(&self, outcome: DeliveryOutcome, message_id: &str, reason: &str) {
        self.reporter.report(&ErrorEvent {
            context: "delivery",
            label: outcome.as_label(),
            message: reason,
            resource: Some(message_id),
        });
    }

    fn labels(&self, message: &InboundMessage) -> Vec<Label> {
        self.metric_tags
            .iter()
            .map(|tag| {
                let value = message.attribute(tag).unwrap_or(MISSING_TAG).to_string();
                Label::new(tag.clone(), value)
            })
            .collect()
    }
}

#[async_trait]
impl MessageReceiver for AckEngine {
    async fn receive(&self, message: InboundMessage, reply: Box<dyn AckReply>) {
        metrics::counter!(RECEIVE_COUNTER).increment(1);
        let outcome = self.process(&message).await;
        self.settle(&message, outcome, reply);
    }
}
