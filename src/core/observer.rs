use std::sync::Arc;

use tracing::{error, info};

use crate::events::{Bus, Event, EventKind};
use crate::listener::{ListenerObserver, ListenerState, StateCell, StopReason};
use crate::report::{ErrorEvent, ErrorReporter};

/// Feeds listener terminations into the handle state, the bus and the reporter.
pub(crate) struct HandleObserver {
    pub(crate) subscription: Arc<str>,
    pub(crate) state: StateCell,
    pub(crate) bus: Bus,
    pub(crate) reporter: Arc<dyn ErrorReporter>,
}

impl ListenerObserver for HandleObserver {
    fn on_stopped(&self, reason: StopReason) {
        match reason {
            StopReason::Requested => {
                if self.state.transition(ListenerState::Stopped) {
                    info!(subscription = %self.subscription, "listener stopped");
                }
            }
            StopReason::Failed(cause) => {
                if !self.state.transition(ListenerState::Failed) {
                    return;
                }
                error!(subscription = %self.subscription, %cause, "listener failed");
                self.bus.publish(
                    Event::new(EventKind::ListenerFailed)
                        .with_subscription(Arc::clone(&self.subscription))
                        .with_reason(cause.as_str()),
                );
                self.reporter.report(&ErrorEvent {
                    context: "listener",
                    label: "listener_failed",
                    message: &cause,
                    resource: Some(&*self.subscription),
                });
            }
        }
    }
}
