use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::attempt::StartupContext;
use super::manager::SubscriberManager;
use crate::delivery::MessageReceiver;
use crate::events::Bus;
use crate::listener::{Endpoint, ListenerFactory};
use crate::provision::ResourceResolver;
use crate::report::{ErrorReporter, LogReporter};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Default lifecycle bus capacity.
pub const DEFAULT_BUS_CAPACITY: usize = 1024;

/// Builder for [`SubscriberManager`].
pub struct SubscriberManagerBuilder {
    resolver: Arc<ResourceResolver>,
    factory: Arc<dyn ListenerFactory>,
    receiver: Arc<dyn MessageReceiver>,
    endpoint: Endpoint,
    reporter: Arc<dyn ErrorReporter>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    bus_capacity: usize,
}

impl SubscriberManagerBuilder {
    pub fn new(
        resolver: Arc<ResourceResolver>,
        factory: Arc<dyn ListenerFactory>,
        receiver: Arc<dyn MessageReceiver>,
    ) -> Self {
        Self {
            resolver,
            factory,
            receiver,
            endpoint: Endpoint::Default,
            reporter: Arc::new(LogReporter),
            subscribers: Vec::new(),
            bus_capacity: DEFAULT_BUS_CAPACITY,
        }
    }

    /// Broker endpoint listeners connect to.
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Lifecycle observers, each fed through its own bounded queue.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    pub fn with_bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity;
        self
    }

    /// Builds the manager.
    ///
    /// With observers configured this spawns the forwarding task, so it must
    /// run inside a tokio runtime.
    pub fn build(self) -> SubscriberManager {
        let bus = Bus::new(self.bus_capacity);
        let forwarder = CancellationToken::new();
        if !self.subscribers.is_empty() {
            spawn_forwarder(&bus, SubscriberSet::new(self.subscribers), forwarder.clone());
        }

        let ctx = StartupContext {
            resolver: self.resolver,
            factory: self.factory,
            receiver: self.receiver,
            endpoint: self.endpoint,
            bus,
            reporter: self.reporter,
        };
        SubscriberManager::new_internal(ctx, forwarder)
    }
}

fn spawn_forwarder(bus: &Bus, set: SubscriberSet, token: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(n)) => {
                        warn!(skipped = n, "lifecycle observers lagged behind the bus");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
        set.shutdown().await;
    });
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::core::SubscriptionSpec;
    use crate::events::{Event, EventKind};
    use crate::naming::{DeploymentContext, ResourceNamer};
    use crate::provision::Provisioner;
    use crate::test_support::{AckingReceiver, RecordingAdmin, ScriptedFactory};

    struct Kinds {
        seen: Arc<Mutex<Vec<EventKind>>>,
        done: tokio::sync::mpsc::UnboundedSender<()>,
    }

    #[async_trait::async_trait]
    impl Subscribe for Kinds {
        async fn on_event(&self, ev: &Event) {
            self.seen.lock().push(ev.kind);
            if ev.kind == EventKind::ListenerRunning {
                let _ = self.done.send(());
            }
        }
        fn name(&self) -> &'static str {
            "kinds"
        }
    }

    #[tokio::test]
    async fn observers_receive_lifecycle_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let resolver = Arc::new(ResourceResolver::new(
            ResourceNamer::new(DeploymentContext::trunk("asn-core")),
            Provisioner::new(Arc::new(RecordingAdmin::editor()), "proj"),
        ));
        let mgr = SubscriberManagerBuilder::new(
            resolver,
            Arc::new(ScriptedFactory::healthy()),
            Arc::new(AckingReceiver),
        )
        .with_subscribers(vec![Arc::new(Kinds {
            seen: seen.clone(),
            done: tx,
        })])
        .build();

        mgr.start_all(&[SubscriptionSpec::new("orders")]).await.unwrap();
        rx.recv().await.unwrap();

        assert_eq!(
            *seen.lock(),
            vec![EventKind::AttemptStarting, EventKind::ListenerRunning]
        );
    }
}
