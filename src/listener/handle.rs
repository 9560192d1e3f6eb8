use tokio::sync::watch;

use super::client::Listener;
use super::state::{ListenerState, StateCell};
use crate::error::ListenerError;
use crate::naming::ResourceIdentity;

/// A started listener plus its observable state.
pub struct SubscriptionHandle {
    topic: String,
    identity: ResourceIdentity,
    state: StateCell,
    listener: Box<dyn Listener>,
}

impl SubscriptionHandle {
    /// Wraps a started listener and marks it `Running`.
    ///
    /// If the listener already reported a failure through its observer, the
    /// state stays `Failed`.
    pub fn new(
        topic: impl Into<String>,
        identity: ResourceIdentity,
        state: StateCell,
        listener: Box<dyn Listener>,
    ) -> Self {
        state.transition(ListenerState::Running);
        Self {
            topic: topic.into(),
            identity,
            state,
            listener,
        }
    }

    /// Configured topic base name.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn identity(&self) -> &ResourceIdentity {
        &self.identity
    }

    pub fn state(&self) -> ListenerState {
        self.state.get()
    }

    pub fn watch(&self) -> watch::Receiver<ListenerState> {
        self.state.watch()
    }

    /// Issues the stop signal. Marks the handle `Stopped` once the signal is accepted.
    pub async fn stop(&self) -> Result<(), ListenerError> {
        self.listener.stop().await?;
        self.state.transition(ListenerState::Stopped);
        Ok(())
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("topic", &self.topic)
            .field("identity", &self.identity)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
