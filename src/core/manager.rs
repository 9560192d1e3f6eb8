//! # SubscriberManager: startup, registry and teardown of subscription listeners.
//!
//! ```text
//! start_all(specs)
//!   ├─► spawn one StartupActor per spec (JoinSet, child token)
//!   ├─► join all
//!   │     ├─ all Ok       → register handles
//!   │     └─ first Err    → cancel siblings, stop started listeners, return Err
//!   ▼
//! run(specs) = start_all → termination signal → shutdown
//!
//! shutdown()
//!   ├─► publish ShutdownRequested
//!   └─► stop every registered handle concurrently (failures logged, never fatal)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::actor::StartupActor;
use super::attempt::StartupContext;
use super::builder::SubscriberManagerBuilder;
use super::registry::Registry;
use super::spec::SubscriptionSpec;
use crate::delivery::MessageReceiver;
use crate::error::{RunError, StartupError};
use crate::events::{Bus, Event, EventKind};
use crate::listener::{ListenerFactory, SubscriptionHandle};
use crate::provision::{ResourceInventory, ResourceResolver};
use crate::subscribers::panic_message;

/// Starts, tracks and stops the listeners of one service.
pub struct SubscriberManager {
    ctx: Arc<StartupContext>,
    registry: Registry,
    token: CancellationToken,
    forwarder: CancellationToken,
}

impl SubscriberManager {
    /// Entry point for configuring a manager.
    pub fn builder(
        resolver: Arc<ResourceResolver>,
        factory: Arc<dyn ListenerFactory>,
        receiver: Arc<dyn MessageReceiver>,
    ) -> SubscriberManagerBuilder {
        SubscriberManagerBuilder::new(resolver, factory, receiver)
    }

    pub(crate) fn new_internal(ctx: StartupContext, forwarder: CancellationToken) -> Self {
        Self {
            ctx: Arc::new(ctx),
            registry: Registry::default(),
            token: CancellationToken::new(),
            forwarder,
        }
    }

    /// Lifecycle event bus. Receivers see events published after subscribing.
    pub fn bus(&self) -> &Bus {
        &self.ctx.bus
    }

    pub fn resolver(&self) -> &Arc<ResourceResolver> {
        &self.ctx.resolver
    }

    /// Resources resolved so far.
    pub fn inventory(&self) -> ResourceInventory {
        self.ctx.resolver.inventory()
    }

    /// Snapshot of registered handles.
    pub async fn handles(&self) -> Vec<Arc<SubscriptionHandle>> {
        self.registry.snapshot().await
    }

    /// Sorted names of subscriptions with a running listener.
    pub async fn running(&self) -> Vec<String> {
        self.registry.running().await
    }

    /// Starts one listener per spec, all or nothing.
    ///
    /// Specs start concurrently, each with its own retry budget. The first
    /// fatal error cancels the others, stops every listener already started
    /// in this batch, and is returned.
    pub async fn start_all(&self, specs: &[SubscriptionSpec]) -> Result<(), StartupError> {
        if specs.is_empty() {
            return Ok(());
        }
        info!(count = specs.len(), "starting subscribers");

        let batch = self.token.child_token();
        let mut set = JoinSet::new();
        let mut topics = HashMap::with_capacity(specs.len());
        for spec in specs {
            let actor = StartupActor::new(spec.clone(), Arc::clone(&self.ctx));
            let handle = set.spawn(actor.run(batch.clone()));
            topics.insert(handle.id(), spec.topic.clone());
        }

        let mut started: Vec<SubscriptionHandle> = Vec::with_capacity(specs.len());
        let mut failure: Option<StartupError> = None;
        while let Some(joined) = set.join_next_with_id().await {
            let result = match joined {
                Ok((_, result)) => result,
                Err(join_err) => Err(StartupError::Panicked {
                    topic: topics.get(&join_err.id()).cloned().unwrap_or_default(),
                    reason: if join_err.is_panic() {
                        panic_message(join_err.into_panic().as_ref())
                    } else {
                        "startup task aborted".to_string()
                    },
                }),
            };
            match result {
                Ok(handle) => started.push(handle),
                Err(e) if failure.is_none() => {
                    batch.cancel();
                    failure = Some(e);
                }
                Err(StartupError::Cancelled { .. }) => {}
                Err(e) => warn!(error = %e, "additional subscriber startup failure"),
            }
        }

        if let Some(err) = failure {
            error!(error = %err, label = err.as_label(), rolled_back = started.len(), "subscriber startup failed");
            self.stop_handles(started.iter()).await;
            return Err(err);
        }

        info!(count = started.len(), "all subscribers running");
        self.registry.extend(started).await;
        Ok(())
    }

    /// Stops every registered listener. Best-effort: a failing stop is logged
    /// and never prevents the others from being stopped.
    pub async fn shutdown(&self) {
        self.token.cancel();
        self.ctx.bus.publish(Event::new(EventKind::ShutdownRequested));
        let handles = self.registry.drain().await;
        info!(count = handles.len(), "shutting down subscribers");
        self.stop_handles(handles.iter().map(Arc::as_ref)).await;
    }

    /// Process hook: [`start_all`](Self::start_all), wait for a termination
    /// signal, then [`shutdown`](Self::shutdown).
    pub async fn run(&self, specs: &[SubscriptionSpec]) -> Result<(), RunError> {
        self.start_all(specs).await?;
        let waited = termination_signal().await;
        if let Err(e) = &waited {
            error!(error = %e, "cannot wait for shutdown signal; stopping subscribers");
        }
        self.shutdown().await;
        waited.map_err(RunError::from)
    }

    async fn stop_handles<'a>(&self, handles: impl Iterator<Item = &'a SubscriptionHandle>) {
        join_all(handles.map(|h| self.stop_one(h))).await;
    }

    async fn stop_one(&self, handle: &SubscriptionHandle) {
        let name = handle.identity().name();
        info!(subscription = name, "stopping subscriber");
        let ev = Event::new(EventKind::ListenerStopped).with_subscription(name);
        match handle.stop().await {
            Ok(()) => self.ctx.bus.publish(ev),
            Err(e) => {
                warn!(subscription = name, error = %e, "failed to stop subscriber");
                self.ctx.bus.publish(ev.with_reason(e.to_string()));
            }
        }
    }
}

/// Resolves on SIGINT, SIGTERM or SIGQUIT.
#[cfg(unix)]
async fn termination_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut streams = [
        SignalKind::interrupt(),
        SignalKind::terminate(),
        SignalKind::quit(),
    ]
    .into_iter()
    .map(signal)
    .collect::<std::io::Result<Vec<_>>>()?;
    let received = streams.iter_mut().map(|s| Box::pin(s.recv()));
    futures::future::select_all(received).await;
    info!("termination signal received");
    Ok(())
}

/// Resolves on Ctrl-C.
#[cfg(not(unix))]
async fn termination_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("termination signal received");
    Ok(())
}

impl Drop for SubscriberManager {
    fn drop(&mut self) {
        self.token.cancel();
        self.forwarder.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;
    use crate::listener::{ListenerState, StopReason};
    use crate::naming::{DeploymentContext, ResourceNamer};
    use crate::provision::{AdminError, Provisioner};
    use crate::test_support::{AckingReceiver, RecordingAdmin, ScriptedFactory};

    fn resolver(admin: Arc<RecordingAdmin>) -> Arc<ResourceResolver> {
        Arc::new(ResourceResolver::new(
            ResourceNamer::new(DeploymentContext::trunk("asn-core")),
            Provisioner::new(admin, "proj"),
        ))
    }

    fn manager(admin: Arc<RecordingAdmin>, factory: Arc<ScriptedFactory>) -> SubscriberManager {
        SubscriberManager::builder(resolver(admin), factory, Arc::new(AckingReceiver)).build()
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_listener_starts() {
        let factory = Arc::new(ScriptedFactory::failing_first(2));
        let mgr = manager(Arc::new(RecordingAdmin::editor()), factory.clone());
        let delay = Duration::from_millis(1500);

        let begin = Instant::now();
        mgr.start_all(&[SubscriptionSpec::new("orders").with_retry(3, delay)])
            .await
            .unwrap();

        let starts = factory.start_times();
        assert_eq!(starts.len(), 3);
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= delay);
        }
        assert!(Instant::now() - begin >= delay * 2);

        let handles = mgr.handles().await;
        assert_eq!(handles.len(), 1);
        assert_eq!(handles[0].state(), ListenerState::Running);
        assert_eq!(handles[0].identity().name(), "orders-asn-core");
        assert_eq!(mgr.running().await, vec!["orders-asn-core"]);
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_resolver_exhausts_budget() {
        let admin = Arc::new(RecordingAdmin::editor());
        admin.fail_gets(AdminError::Unavailable {
            reason: "connection refused".into(),
        });
        let factory = Arc::new(ScriptedFactory::healthy());
        let mgr = manager(admin.clone(), factory.clone());

        let err = mgr
            .start_all(&[SubscriptionSpec::new("orders").with_retry(2, Duration::from_secs(1))])
            .await
            .unwrap_err();

        match err {
            StartupError::RetriesExhausted {
                topic,
                attempts,
                subscription,
                ..
            } => {
                assert_eq!(topic, "orders");
                assert_eq!(attempts, 2);
                assert_eq!(subscription, None);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(admin.topic_gets(), 2);
        assert!(factory.start_times().is_empty());
        assert!(mgr.handles().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn permission_gap_fails_without_retrying() {
        let admin = Arc::new(RecordingAdmin::with_permissions([true, true, false, true]));
        let factory = Arc::new(ScriptedFactory::healthy());
        let mgr = manager(admin.clone(), factory);

        let begin = Instant::now();
        let err = mgr
            .start_all(&[SubscriptionSpec::new("orders").with_retry(5, Duration::from_secs(10))])
            .await
            .unwrap_err();

        assert!(matches!(err, StartupError::Provisioning { .. }));
        assert_eq!(admin.topic_gets(), 1);
        assert_eq!(Instant::now(), begin);
    }

    #[tokio::test(start_paused = true)]
    async fn one_permanent_failure_rolls_back_the_batch() {
        let factory = Arc::new(ScriptedFactory::healthy().always_failing_for("payments-asn-core"));
        let mgr = manager(Arc::new(RecordingAdmin::editor()), factory.clone());

        let err = mgr
            .start_all(&[
                SubscriptionSpec::new("orders"),
                SubscriptionSpec::new("payments").with_retry(2, Duration::from_millis(10)),
            ])
            .await
            .unwrap_err();

        assert_eq!(err.topic(), "payments");
        assert!(mgr.handles().await.is_empty());
        assert_eq!(factory.stopped(), vec!["orders-asn-core"]);
    }

    #[tokio::test]
    async fn shutdown_stops_every_handle_even_if_one_fails() {
        let factory = Arc::new(ScriptedFactory::healthy().failing_stop_for("orders-asn-core"));
        let mgr = manager(Arc::new(RecordingAdmin::editor()), factory.clone());
        mgr.start_all(&[
            SubscriptionSpec::new("orders"),
            SubscriptionSpec::new("payments"),
            SubscriptionSpec::new("returns"),
        ])
        .await
        .unwrap();
        let handles = mgr.handles().await;
        let mut events = mgr.bus().subscribe();

        mgr.shutdown().await;

        let mut stopped = factory.stopped();
        stopped.sort();
        assert_eq!(
            stopped,
            vec!["orders-asn-core", "payments-asn-core", "returns-asn-core"]
        );
        for h in &handles {
            let expected = if h.identity().name() == "orders-asn-core" {
                ListenerState::Running
            } else {
                ListenerState::Stopped
            };
            assert_eq!(h.state(), expected, "{}", h.identity().name());
        }
        assert!(mgr.handles().await.is_empty());

        assert_eq!(events.recv().await.unwrap().kind, EventKind::ShutdownRequested);
        let mut with_reason = 0;
        for _ in 0..3 {
            let ev = events.recv().await.unwrap();
            assert_eq!(ev.kind, EventKind::ListenerStopped);
            with_reason += usize::from(ev.reason.is_some());
        }
        assert_eq!(with_reason, 1);
    }

    #[tokio::test]
    async fn listener_failure_after_start_marks_handle_failed() {
        let factory = Arc::new(ScriptedFactory::healthy());
        let mgr = manager(Arc::new(RecordingAdmin::editor()), factory.clone());
        mgr.start_all(&[SubscriptionSpec::new("orders")]).await.unwrap();
        let mut events = mgr.bus().subscribe();

        factory
            .observer("orders-asn-core")
            .unwrap()
            .on_stopped(StopReason::Failed("stream reset".into()));

        let handles = mgr.handles().await;
        assert_eq!(handles[0].state(), ListenerState::Failed);
        assert!(mgr.running().await.is_empty());
        let ev = events.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::ListenerFailed);
        assert_eq!(ev.reason.as_deref(), Some("stream reset"));
    }

    #[tokio::test]
    async fn lifecycle_events_trace_a_retry() {
        let factory = Arc::new(ScriptedFactory::failing_first(1));
        let mgr = manager(Arc::new(RecordingAdmin::editor()), factory);
        let mut events = mgr.bus().subscribe();

        mgr.start_all(&[SubscriptionSpec::new("orders").with_retry(2, Duration::ZERO)])
            .await
            .unwrap();

        let mut kinds = Vec::new();
        while let Ok(ev) = events.try_recv() {
            kinds.push(ev.kind);
        }
        assert_eq!(
            kinds,
            vec![
                EventKind::AttemptStarting,
                EventKind::AttemptFailed,
                EventKind::RetryScheduled,
                EventKind::AttemptStarting,
                EventKind::ListenerRunning,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retry_budget_fails_without_starting() {
        let factory = Arc::new(ScriptedFactory::healthy());
        let mgr = manager(Arc::new(RecordingAdmin::editor()), factory.clone());

        let err = mgr
            .start_all(&[SubscriptionSpec::new("orders").with_retry(0, Duration::from_secs(1))])
            .await
            .unwrap_err();

        assert!(matches!(err, StartupError::NoAttempts { ref topic } if topic == "orders"));
        assert!(factory.start_times().is_empty());
        assert!(mgr.handles().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn listener_failing_during_start_is_retried() {
        let factory = Arc::new(ScriptedFactory::healthy().failing_during_start(1));
        let mgr = manager(Arc::new(RecordingAdmin::editor()), factory.clone());
        let mut events = mgr.bus().subscribe();

        mgr.start_all(&[SubscriptionSpec::new("orders").with_retry(2, Duration::from_millis(10))])
            .await
            .unwrap();

        assert_eq!(factory.start_times().len(), 2);
        assert_eq!(factory.stopped(), vec!["orders-asn-core"]);
        let handles = mgr.handles().await;
        assert_eq!(handles.len(), 1);
        assert_eq!(handles[0].state(), ListenerState::Running);

        let mut running = 0;
        while let Ok(ev) = events.try_recv() {
            running += usize::from(ev.kind == EventKind::ListenerRunning);
        }
        assert_eq!(running, 1);
    }
}
