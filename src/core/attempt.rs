//! One startup attempt: resolve the subscription, then start its listener.

use std::sync::Arc;

use tracing::warn;

use crate::core::observer::HandleObserver;
use crate::delivery::MessageReceiver;
use crate::error::{AttemptError, ListenerError};
use crate::events::Bus;
use crate::listener::{Endpoint, ListenerFactory, ListenerState, StateCell, SubscriptionHandle};
use crate::provision::ResourceResolver;
use crate::report::ErrorReporter;

use super::spec::SubscriptionSpec;

/// Collaborators shared by every startup actor.
pub(crate) struct StartupContext {
    pub(crate) resolver: Arc<ResourceResolver>,
    pub(crate) factory: Arc<dyn ListenerFactory>,
    pub(crate) receiver: Arc<dyn MessageReceiver>,
    pub(crate) endpoint: Endpoint,
    pub(crate) bus: Bus,
    pub(crate) reporter: Arc<dyn ErrorReporter>,
}

/// Runs one attempt.
///
/// `resolved` receives the subscription name as soon as resolution succeeds,
/// so an exhausted loop can still name what it was trying to start.
pub(crate) async fn run_attempt(
    ctx: &StartupContext,
    spec: &SubscriptionSpec,
    resolved: &mut Option<String>,
) -> Result<SubscriptionHandle, AttemptError> {
    let identity = ctx
        .resolver
        .resolve_subscription(&spec.topic, spec.force)
        .await?;
    *resolved = Some(identity.name().to_string());

    let state = StateCell::new();
    let observer = Arc::new(HandleObserver {
        subscription: Arc::from(identity.name()),
        state: state.clone(),
        bus: ctx.bus.clone(),
        reporter: Arc::clone(&ctx.reporter),
    });

    let listener = ctx
        .factory
        .start(&identity, &ctx.endpoint, Arc::clone(&ctx.receiver), observer)
        .await?;

    let handle = SubscriptionHandle::new(spec.topic.clone(), identity, state, listener);
    if handle.state() == ListenerState::Failed {
        warn!(subscription = %handle.identity().name(), "listener failed before it was running");
        if let Err(e) = handle.stop().await {
            warn!(subscription = %handle.identity().name(), error = %e, "failed to stop failed listener");
        }
        return Err(AttemptError::Start(ListenerError::start(
            "listener failed before it was running",
        )));
    }
    Ok(handle)
}
