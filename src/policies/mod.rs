//! Startup retry policy.
//!
//! ## Contents
//! - [`RetryPolicy`] attempt budget and fixed inter-attempt delay
//! - [`JitterPolicy`] optional randomization of that delay
//!
//! ## Wiring
//! ```text
//! SubscriptionConfig { retry_count, retry_delay_ms } ─► RetryPolicy
//!      └─► core::actor::StartupActor:
//!           - has_next(attempt) to decide retry/exhaust
//!           - next_delay() to schedule the next attempt
//! ```
//!
//! ## Defaults
//! - 3 attempts, 1000ms apart, no jitter.

mod jitter;
mod retry;

pub use jitter::JitterPolicy;
pub use retry::{DEFAULT_ATTEMPTS, DEFAULT_DELAY, RetryPolicy};
