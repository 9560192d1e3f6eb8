//! # Lifecycle observer trait
//!
//! `Subscribe` is the extension point for watching subscription lifecycle
//! events: alerting on exhausted startup, exporting attempt counts, feeding a
//! health endpoint. Each observer is driven by its own worker loop fed by a
//! bounded queue owned by the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow; they never block startup actors or other observers.
//! - On queue overflow, events for that observer are dropped (warn).
//!
//! ## Example
//! ```rust
//! use subvisor::{Event, EventKind, Subscribe};
//!
//! struct Alerts;
//!
//! #[async_trait::async_trait]
//! impl Subscribe for Alerts {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::StartupExhausted {
//!             // page someone
//!         }
//!     }
//!     fn name(&self) -> &'static str { "alerts" }
//!     fn queue_capacity(&self) -> usize { 64 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for lifecycle observers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this observer's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
