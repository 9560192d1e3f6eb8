//! Subscriber lifecycle: startup with bounded retry, registry, teardown.
//!
//! The public API is [`SubscriberManager`] (built with
//! [`SubscriberManagerBuilder`]) and [`SubscriptionSpec`].
//!
//! Internal modules:
//! - [`actor`]: bounded fixed-delay retry loop for one subscription;
//! - [`attempt`]: one resolve + start attempt;
//! - [`observer`]: listener termination callback wired into each handle;
//! - [`registry`]: started handles until shutdown;
//! - [`manager`]: all-or-nothing startup, rollback and teardown.

mod actor;
mod attempt;
mod builder;
mod manager;
mod observer;
mod registry;
mod spec;

pub use builder::{DEFAULT_BUS_CAPACITY, SubscriberManagerBuilder};
pub use manager::SubscriberManager;
pub use spec::SubscriptionSpec;
