//! # Listener seam and subscription handles.
//!
//! - [`ListenerFactory`] / [`Listener`] broker client collaborator (start, stop)
//! - [`ListenerObserver`] / [`StopReason`] termination callback
//! - [`SubscriptionHandle`] started listener with observable [`ListenerState`]
//! - [`Endpoint`] managed broker or local emulator

mod client;
mod endpoint;
mod handle;
mod state;

pub use client::{Listener, ListenerFactory, ListenerObserver, StopReason};
pub use endpoint::Endpoint;
pub use handle::SubscriptionHandle;
pub use state::{ListenerState, StateCell};
