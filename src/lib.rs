//! # subvisor
//!
//! **Subvisor** is the reliability layer wrapped around a pub/sub broker
//! client. It provisions topics and subscriptions, starts listeners with
//! bounded fixed-delay retry, aborts startup when any listener cannot be
//! bound, and turns every delivery's processing outcome into exactly one
//! ack or nack plus one counter.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────┐
//!   │ SubscriptionSpec │ │ SubscriptionSpec │ │ SubscriptionSpec │
//!   │ (topic, retry)   │ │ (topic, retry)   │ │ (topic, retry)   │
//!   └────────┬─────────┘ └────────┬─────────┘ └────────┬─────────┘
//!            ▼                    ▼                    ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  SubscriberManager                                                │
//! │  - Bus (broadcast lifecycle events)                               │
//! │  - SubscriberSet (fans out to user observers)                     │
//! │  - Registry (started SubscriptionHandles)                         │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!   │ StartupActor │   │ StartupActor │   │ StartupActor │
//!   │ (retry loop) │   │ (retry loop) │   │ (retry loop) │
//!   └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!          ▼                  ▼                  ▼
//!   ResourceResolver ──► ResourceNamer (contextualized names)
//!          │         └─► Provisioner   (exists? editor? create)
//!          ▼
//!   ListenerFactory::start ──► Listener ──► MessageReceiver (AckEngine)
//!                                              │
//!                                  Decoder ──► Router ──► DeliveryOutcome
//!                                              │
//!                                    AckReply::ack / nack + counter
//! ```
//!
//! ### Startup
//! ```text
//! start_all(specs) ──► one StartupActor per spec (joined)
//!
//! budget == 0 ──► StartupError::NoAttempts
//! loop {
//!   ├─► attempt += 1, publish AttemptStarting
//!   ├─► resolve subscription (name + provision topic/subscription)
//!   ├─► factory.start(subscription, endpoint, receiver, observer)
//!   │       ├─ Ok  ──► handle Running, publish ListenerRunning, exit
//!   │       └─ Err ──► publish AttemptFailed
//!   │                  ├─ fatal provisioning ─► StartupError::Provisioning
//!   │                  ├─ budget spent       ─► StartupError::RetriesExhausted
//!   │                  └─ publish RetryScheduled, sleep(delay) (cancellable)
//! }
//!
//! First error cancels sibling actors and stops every handle already started.
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                            |
//! |-------------------|----------------------------------------------------------|-----------------------------------------------|
//! | **Naming**        | Branch/local/client aware resource names.                | [`ResourceNamer`], [`DeploymentContext`]      |
//! | **Provisioning**  | Idempotent topic/subscription creation behind a gate.    | [`Provisioner`], [`ResourceResolver`]         |
//! | **Lifecycle**     | Fail-fast startup with bounded retry and teardown.       | [`SubscriberManager`], [`SubscriptionSpec`]   |
//! | **Delivery**      | Outcome classification and ack/nack settlement.          | [`AckEngine`], [`Decoder`], [`Router`]        |
//! | **Buffering**     | Bounded drop-on-full message buffer.                     | [`MessageBuffer`]                             |
//! | **Observers**     | Hook into lifecycle events.                              | [`Subscribe`], [`Event`]                      |
//! | **Configuration** | YAML plus environment overrides.                         | [`PubSubConfig`]                              |
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use subvisor::{
//!     AckEngine, BrokerAdmin, JsonDecoder, ListenerFactory, Provisioner, PubSubConfig,
//!     ResourceNamer, ResourceResolver, Router, SubscriberManager,
//! };
//!
//! async fn serve(
//!     admin: Arc<dyn BrokerAdmin>,
//!     factory: Arc<dyn ListenerFactory>,
//!     router: Arc<dyn Router>,
//! ) -> Result<(), Box<dyn std::error::Error>> {
//!     let Some(cfg) = PubSubConfig::load("pubsub.yaml")? else {
//!         return Ok(());
//!     };
//!     let resolver = Arc::new(ResourceResolver::new(
//!         ResourceNamer::new(cfg.deployment.clone()),
//!         Provisioner::new(admin, cfg.project_id.clone()),
//!     ));
//!     let engine = AckEngine::new(Arc::new(JsonDecoder::new()), router)
//!         .with_metric_tags(cfg.metric_tags.clone());
//!
//!     let mgr = SubscriberManager::builder(resolver, factory, Arc::new(engine))
//!         .with_endpoint(cfg.endpoint())
//!         .build();
//!     mgr.run(&cfg.subscription_specs()).await?;
//!     Ok(())
//! }
//! ```
mod buffer;
mod config;
mod core;
mod delivery;
mod error;
mod events;
mod listener;
mod naming;
mod policies;
mod provision;
mod report;
mod subscribers;

#[cfg(test)]
mod test_support;

// ---- Public re-exports ----

pub use buffer::{DEFAULT_BUFFER_CAPACITY, MessageBuffer};
pub use config::{ConfigError, PubSubConfig, SubscriptionConfig};
pub use core::{DEFAULT_BUS_CAPACITY, SubscriberManager, SubscriberManagerBuilder, SubscriptionSpec};
pub use delivery::{
    ACK_COUNTER, AUTOACK_COUNTER, AckAction, AckCounter, AckDecision, AckEngine, AckReply,
    COMMON_FORMAT_ATTRIBUTE, DEFAULT_METRIC_TAGS, DecodeError, Decoder, DeliveryContext,
    DeliveryOutcome, Envelope, FormatVersion, InboundMessage, JsonDecoder, MessageReceiver,
    NACK_COUNTER, RECEIVE_COUNTER, RouteError, Router,
};
pub use error::{AttemptError, ListenerError, RunError, StartupError};
pub use events::{Bus, Event, EventKind};
pub use listener::{
    Endpoint, Listener, ListenerFactory, ListenerObserver, ListenerState, StateCell, StopReason,
    SubscriptionHandle,
};
pub use naming::{
    DeploymentContext, LOCAL_PREFIX, MAX_NAME_LEN, NameError, ResourceIdentity, ResourceKind,
    ResourceNamer, TRUNK_BRANCH, validate_name,
};
pub use policies::{DEFAULT_ATTEMPTS, DEFAULT_DELAY, JitterPolicy, RetryPolicy};
pub use provision::{
    ACK_DEADLINE, AdminError, BrokerAdmin, EDITOR_PERMISSIONS, ProvisionError, ProvisionState,
    Provisioner, ResourceInventory, ResourceResolver, SubscriptionSettings,
};
pub use report::{ErrorEvent, ErrorReporter, LogReporter};
pub use subscribers::{Subscribe, SubscriberSet};
