//! # Bounded fixed-delay retry.
//!
//! [`RetryPolicy`] is the whole budget for starting one subscription:
//! `attempts` total tries (not retries) with `delay` between consecutive ones.
//! There is no sleep after the final failure.
//!
//! ```rust
//! use std::time::Duration;
//! use subvisor::RetryPolicy;
//!
//! let p = RetryPolicy::new(3, Duration::from_secs(1));
//! assert!(p.has_next(1));
//! assert!(p.has_next(2));
//! assert!(!p.has_next(3));
//! assert_eq!(p.next_delay(), Duration::from_secs(1));
//! ```

use std::time::Duration;

use super::jitter::JitterPolicy;

/// Default total attempts per subscription.
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Default pause between attempts.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);

/// Attempt budget and inter-attempt delay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts. Zero means startup fails without trying.
    pub attempts: u32,
    /// Pause between a failed attempt and the next one.
    pub delay: Duration,
    pub jitter: JitterPolicy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS, DEFAULT_DELAY)
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts,
            delay,
            jitter: JitterPolicy::None,
        }
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Attempt budget.
    pub fn max_attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether another attempt follows a failed attempt number `attempt` (1-based).
    pub fn has_next(&self, attempt: u32) -> bool {
        attempt < self.max_attempts()
    }

    /// Delay before the next attempt, jitter applied.
    pub fn next_delay(&self) -> Duration {
        self.jitter.apply(self.delay)
    }
}
