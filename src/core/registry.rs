//! # Handle registry.
//!
//! Owns every started [`SubscriptionHandle`] until shutdown.
//!
//! ## Rules
//! - Handles are registered only after the whole startup batch succeeded.
//! - `drain` hands every handle out exactly once; later shutdowns see nothing.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::listener::{ListenerState, SubscriptionHandle};

#[derive(Default)]
pub(crate) struct Registry {
    handles: RwLock<Vec<Arc<SubscriptionHandle>>>,
}

impl Registry {
    pub(crate) async fn extend(&self, handles: impl IntoIterator<Item = SubscriptionHandle>) {
        let mut guard = self.handles.write().await;
        guard.extend(handles.into_iter().map(Arc::new));
    }

    pub(crate) async fn snapshot(&self) -> Vec<Arc<SubscriptionHandle>> {
        self.handles.read().await.clone()
    }

    pub(crate) async fn drain(&self) -> Vec<Arc<SubscriptionHandle>> {
        std::mem::take(&mut *self.handles.write().await)
    }

    /// Sorted names of subscriptions whose listener is running.
    pub(crate) async fn running(&self) -> Vec<String> {
        let handles = self.handles.read().await;
        let mut names: Vec<String> = handles
            .iter()
            .filter(|h| h.state() == ListenerState::Running)
            .map(|h| h.identity().name().to_string())
            .collect();
        names.sort_unstable();
        names
    }
}
