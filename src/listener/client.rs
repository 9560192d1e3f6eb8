//! Broker client seam.
//!
//! The crate never speaks the broker's wire protocol. A [`ListenerFactory`]
//! binds a streaming pull to one subscription and feeds every delivery into a
//! [`MessageReceiver`]; the returned [`Listener`] is the stop switch.

use std::sync::Arc;

use async_trait::async_trait;

use super::endpoint::Endpoint;
use crate::delivery::MessageReceiver;
use crate::error::ListenerError;
use crate::naming::ResourceIdentity;

/// Why a listener stopped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Stop was requested through [`Listener::stop`].
    Requested,
    /// The client gave up on its own (stream broken, credentials revoked).
    Failed(String),
}

/// Callback notified when a running listener terminates.
pub trait ListenerObserver: Send + Sync + 'static {
    fn on_stopped(&self, reason: StopReason);
}

/// A started listener.
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    /// Signals the listener to stop. Must not wait for in-flight deliveries to drain;
    /// acknowledgments already underway are still allowed to complete.
    async fn stop(&self) -> Result<(), ListenerError>;
}

/// Starts listeners bound to subscriptions.
#[async_trait]
pub trait ListenerFactory: Send + Sync + 'static {
    /// Starts a listener and resolves once it is running.
    async fn start(
        &self,
        subscription: &ResourceIdentity,
        endpoint: &Endpoint,
        receiver: Arc<dyn MessageReceiver>,
        observer: Arc<dyn ListenerObserver>,
    ) -> Result<Box<dyn Listener>, ListenerError>;
}
