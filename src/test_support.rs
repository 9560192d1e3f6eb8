//! In-memory collaborators shared by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::delivery::{AckReply, InboundMessage, MessageReceiver};
use crate::error::ListenerError;
use crate::listener::{Endpoint, Listener, ListenerFactory, ListenerObserver, StopReason};
use crate::naming::ResourceIdentity;
use crate::provision::{AdminError, BrokerAdmin, EDITOR_PERMISSIONS, SubscriptionSettings};
use crate::report::{ErrorEvent, ErrorReporter};

#[derive(Default)]
struct AdminState {
    topics: HashSet<String>,
    subscriptions: HashSet<String>,
    calls: Vec<String>,
    get_failure: Option<AdminError>,
    create_failure: Option<AdminError>,
    last_settings: Option<SubscriptionSettings>,
}

/// Broker admin keeping resources in memory and logging every call.
pub struct RecordingAdmin {
    permissions: [bool; 4],
    state: Mutex<AdminState>,
}

impl RecordingAdmin {
    pub fn editor() -> Self {
        Self::with_permissions([true; 4])
    }

    /// Flags are in [`EDITOR_PERMISSIONS`] order.
    pub fn with_permissions(permissions: [bool; 4]) -> Self {
        Self {
            permissions,
            state: Mutex::new(AdminState::default()),
        }
    }

    pub fn insert_topic(&self, name: &str) {
        self.state.lock().topics.insert(name.to_string());
    }

    /// Every later `get_*` call fails with `err`.
    pub fn fail_gets(&self, err: AdminError) {
        self.state.lock().get_failure = Some(err);
    }

    /// Every later `create_*` call fails with `err`.
    pub fn fail_creates(&self, err: AdminError) {
        self.state.lock().create_failure = Some(err);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn topic_gets(&self) -> usize {
        self.count("get_topic:")
    }

    pub fn topic_creates(&self) -> usize {
        self.count("create_topic:")
    }

    pub fn subscription_creates(&self) -> usize {
        self.count("create_subscription:")
    }

    pub fn permission_checks(&self) -> usize {
        self.count("test_iam_permissions:")
    }

    pub fn last_subscription_settings(&self) -> Option<SubscriptionSettings> {
        self.state.lock().last_settings.clone()
    }

    pub fn has_topic(&self, name: &str) -> bool {
        self.state.lock().topics.contains(name)
    }

    pub fn has_subscription(&self, name: &str) -> bool {
        self.state.lock().subscriptions.contains(name)
    }

    fn count(&self, prefix: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl BrokerAdmin for RecordingAdmin {
    async fn get_topic(&self, topic: &ResourceIdentity) -> Result<(), AdminError> {
        let mut st = self.state.lock();
        st.calls.push(format!("get_topic:{}", topic.name()));
        if let Some(err) = &st.get_failure {
            return Err(err.clone());
        }
        if st.topics.contains(topic.name()) {
            Ok(())
        } else {
            Err(AdminError::NotFound {
                resource: topic.path(),
            })
        }
    }

    async fn create_topic(&self, topic: &ResourceIdentity) -> Result<(), AdminError> {
        let mut st = self.state.lock();
        st.calls.push(format!("create_topic:{}", topic.name()));
        if let Some(err) = &st.create_failure {
            return Err(err.clone());
        }
        st.topics.insert(topic.name().to_string());
        Ok(())
    }

    async fn get_subscription(&self, subscription: &ResourceIdentity) -> Result<(), AdminError> {
        let mut st = self.state.lock();
        st.calls
            .push(format!("get_subscription:{}", subscription.name()));
        if let Some(err) = &st.get_failure {
            return Err(err.clone());
        }
        if st.subscriptions.contains(subscription.name()) {
            Ok(())
        } else {
            Err(AdminError::NotFound {
                resource: subscription.path(),
            })
        }
    }

    async fn create_subscription(
        &self,
        subscription: &ResourceIdentity,
        topic: &ResourceIdentity,
        settings: &SubscriptionSettings,
    ) -> Result<(), AdminError> {
        let mut st = self.state.lock();
        st.calls.push(format!(
            "create_subscription:{}<-{}",
            subscription.name(),
            topic.name()
        ));
        if let Some(err) = &st.create_failure {
            return Err(err.clone());
        }
        st.subscriptions.insert(subscription.name().to_string());
        st.last_settings = Some(settings.clone());
        Ok(())
    }

    async fn test_iam_permissions(
        &self,
        project: &str,
        permissions: &[&str],
    ) -> Result<Vec<bool>, AdminError> {
        self.state
            .lock()
            .calls
            .push(format!("test_iam_permissions:{project}"));
        Ok(permissions
            .iter()
            .map(|p| {
                EDITOR_PERMISSIONS
                    .iter()
                    .position(|e| e == p)
                    .is_some_and(|i| self.permissions[i])
            })
            .collect())
    }
}

#[derive(Default)]
struct FactoryState {
    start_times: Vec<Instant>,
    stopped: Vec<String>,
    observers: HashMap<String, Arc<dyn ListenerObserver>>,
}

/// Listener factory with scripted start and stop failures.
#[derive(Default)]
pub struct ScriptedFactory {
    fail_first: usize,
    always_failing: HashSet<String>,
    failing_stop: HashSet<String>,
    early_failures: AtomicUsize,
    starts: AtomicUsize,
    state: Arc<Mutex<FactoryState>>,
}

impl ScriptedFactory {
    pub fn healthy() -> Self {
        Self::default()
    }

    /// The first `n` start calls fail, whatever the subscription.
    pub fn failing_first(n: usize) -> Self {
        Self {
            fail_first: n,
            ..Self::default()
        }
    }

    pub fn always_failing_for(mut self, subscription: &str) -> Self {
        self.always_failing.insert(subscription.to_string());
        self
    }

    /// The first `n` successful starts report a failure through the observer
    /// before returning.
    pub fn failing_during_start(mut self, n: usize) -> Self {
        self.early_failures = AtomicUsize::new(n);
        self
    }

    /// Stop is recorded for `subscription` but returns an error.
    pub fn failing_stop_for(mut self, subscription: &str) -> Self {
        self.failing_stop.insert(subscription.to_string());
        self
    }

    pub fn start_times(&self) -> Vec<Instant> {
        self.state.lock().start_times.clone()
    }

    pub fn stopped(&self) -> Vec<String> {
        self.state.lock().stopped.clone()
    }

    /// Observer handed to the last successful start of `subscription`.
    pub fn observer(&self, subscription: &str) -> Option<Arc<dyn ListenerObserver>> {
        self.state.lock().observers.get(subscription).cloned()
    }
}

#[async_trait]
impl ListenerFactory for ScriptedFactory {
    async fn start(
        &self,
        subscription: &ResourceIdentity,
        _endpoint: &Endpoint,
        _receiver: Arc<dyn MessageReceiver>,
        observer: Arc<dyn ListenerObserver>,
    ) -> Result<Box<dyn Listener>, ListenerError> {
        let n = self.starts.fetch_add(1, Ordering::SeqCst);
        let name = subscription.name().to_string();
        let mut st = self.state.lock();
        st.start_times.push(Instant::now());

        if n < self.fail_first || self.always_failing.contains(&name) {
            return Err(ListenerError::start("connection refused"));
        }
        st.observers.insert(name.clone(), Arc::clone(&observer));
        drop(st);

        let fail_early = self
            .early_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail_early {
            observer.on_stopped(StopReason::Failed("stream reset during start".into()));
        }
        Ok(Box::new(ScriptedListener {
            fail_stop: self.failing_stop.contains(&name),
            name,
            state: self.state.clone(),
        }))
    }
}

struct ScriptedListener {
    name: String,
    fail_stop: bool,
    state: Arc<Mutex<FactoryState>>,
}

#[async_trait]
impl Listener for ScriptedListener {
    async fn stop(&self) -> Result<(), ListenerError> {
        self.state.lock().stopped.push(self.name.clone());
        if self.fail_stop {
            Err(ListenerError::stop("stream already closed"))
        } else {
            Ok(())
        }
    }
}

/// Receiver that acks everything.
pub struct AckingReceiver;

#[async_trait]
impl MessageReceiver for AckingReceiver {
    async fn receive(&self, _message: InboundMessage, reply: Box<dyn AckReply>) {
        reply.ack();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settled {
    Ack,
    Nack,
}

/// Shared view of what a [`RecordingReply`] was settled with.
#[derive(Clone, Default)]
pub struct ReplyLog(Arc<Mutex<Vec<Settled>>>);

impl ReplyLog {
    pub fn settled(&self) -> Vec<Settled> {
        self.0.lock().clone()
    }
}

pub struct RecordingReply(ReplyLog);

impl RecordingReply {
    pub fn new() -> (Self, ReplyLog) {
        let log = ReplyLog::default();
        (Self(log.clone()), log)
    }
}

impl AckReply for RecordingReply {
    fn ack(self: Box<Self>) {
        self.0.0.lock().push(Settled::Ack);
    }

    fn nack(self: Box<Self>) {
        self.0.0.lock().push(Settled::Nack);
    }
}

/// Collects reported labels.
#[derive(Default)]
pub struct RecordingReporter {
    labels: Mutex<Vec<&'static str>>,
}

impl RecordingReporter {
    pub fn labels(&self) -> Vec<&'static str> {
        self.labels.lock().clone()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, event: &ErrorEvent<'_>) {
        self.labels.lock().push(event.label);
    }
}

/// Recorder that only keeps counters.
#[derive(Default)]
pub struct CountingRecorder {
    counters: Mutex<Vec<(Key, Arc<AtomicU64>)>>,
}

impl CountingRecorder {
    /// Sum over every label combination of counter `name`.
    pub fn total(&self, name: &str) -> u64 {
        self.counters
            .lock()
            .iter()
            .filter(|(k, _)| k.name() == name)
            .map(|(_, v)| v.load(Ordering::SeqCst))
            .sum()
    }

    /// Value of counter `name` with exactly `labels`.
    pub fn get(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        self.counters
            .lock()
            .iter()
            .filter(|(k, _)| k.name() == name && same_labels(k, labels))
            .map(|(_, v)| v.load(Ordering::SeqCst))
            .sum()
    }
}

fn same_labels(key: &Key, labels: &[(&str, &str)]) -> bool {
    let mut have: Vec<(&str, &str)> = key.labels().map(|l| (l.key(), l.value())).collect();
    let mut want = labels.to_vec();
    have.sort_unstable();
    want.sort_unstable();
    have == want
}

impl Recorder for CountingRecorder {
    fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
        let mut counters = self.counters.lock();
        if let Some((_, v)) = counters.iter().find(|(k, _)| k == key) {
            return Counter::from_arc(v.clone());
        }
        let value = Arc::new(AtomicU64::new(0));
        counters.push((key.clone(), value.clone()));
        Counter::from_arc(value)
    }

    fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
        Gauge::noop()
    }

    fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
        Histogram::noop()
    }
}
