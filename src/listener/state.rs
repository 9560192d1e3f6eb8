//! Observable listener state.
//!
//! ```text
//! Starting ──► Running ──► Stopped
//!    │            │
//!    └────────────┴──────► Failed
//! ```
//! `Failed` and `Stopped` are terminal; later transitions are ignored.

use std::sync::Arc;

use tokio::sync::watch;

/// Lifecycle state of one subscription listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListenerState {
    Starting,
    Running,
    Failed,
    Stopped,
}

impl ListenerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ListenerState::Failed | ListenerState::Stopped)
    }

    fn can_become(self, next: ListenerState) -> bool {
        match (self, next) {
            (ListenerState::Starting, ListenerState::Running) => true,
            (from, ListenerState::Failed | ListenerState::Stopped) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// Shared, watchable state cell. Cheap to clone.
#[derive(Clone, Debug)]
pub struct StateCell {
    tx: Arc<watch::Sender<ListenerState>>,
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

impl StateCell {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ListenerState::Starting);
        Self { tx: Arc::new(tx) }
    }

    pub fn get(&self) -> ListenerState {
        *self.tx.borrow()
    }

    /// Applies `next` if the transition is legal. Returns whether it was applied.
    pub fn transition(&self, next: ListenerState) -> bool {
        self.tx.send_if_modified(|current| {
            if current.can_become(next) {
                *current = next;
                true
            } else {
                false
            }
        })
    }

    /// Receiver notified on every applied transition.
    pub fn watch(&self) -> watch::Receiver<ListenerState> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_stick() {
        let cell = StateCell::new();
        assert!(cell.transition(ListenerState::Running));
        assert!(cell.transition(ListenerState::Failed));
        assert!(!cell.transition(ListenerState::Stopped));
        assert!(!cell.transition(ListenerState::Running));
        assert_eq!(cell.get(), ListenerState::Failed);
    }

    #[test]
    fn running_is_only_reachable_from_starting() {
        let cell = StateCell::new();
        assert!(cell.transition(ListenerState::Stopped));
        assert!(!cell.transition(ListenerState::Running));
    }

    #[tokio::test]
    async fn watchers_see_transitions() {
        let cell = StateCell::new();
        let mut rx = cell.watch();
        cell.transition(ListenerState::Running);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ListenerState::Running);
    }
}
