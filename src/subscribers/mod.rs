//! # Lifecycle observers.
//!
//! ```text
//!   StartupActor ─┐
//!   Manager      ─┼─ publish(Event) ──► Bus ──► forwarder ──► SubscriberSet
//!   Listener obs ─┘                                              ├──► Subscribe::on_event
//!                                                                └──► ...
//! ```

mod set;
mod subscribe;

pub(crate) use set::panic_message;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
