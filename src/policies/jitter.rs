//! # Jitter for retry delays.
//!
//! Many replicas restarting together against a recovering broker retry in
//! lockstep with a fixed delay. [`JitterPolicy`] spreads them out.
//!
//! - [`JitterPolicy::None`] exact delay (default)
//! - [`JitterPolicy::Full`] random delay in `[0, delay]`
//! - [`JitterPolicy::Equal`] `delay/2 + random[0, delay/2]`

use std::time::Duration;

use rand::Rng;
use serde::Deserialize;

/// Randomization applied to each retry delay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterPolicy {
    /// Use the configured delay unchanged.
    #[default]
    None,
    /// Random delay in `[0, delay]`.
    Full,
    /// Keeps at least half of the configured delay.
    Equal,
}

impl JitterPolicy {
    /// Applies jitter to the given delay.
    pub fn apply(&self, delay: Duration) -> Duration {
        let ms = delay.as_millis().min(u128::from(u64::MAX)) as u64;
        if ms == 0 {
            return Duration::ZERO;
        }
        let mut rng = rand::rng();
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Full => Duration::from_millis(rng.random_range(0..=ms)),
            JitterPolicy::Equal => {
                let half = ms / 2;
                let jitter = if half == 0 { 0 } else { rng.random_range(0..=half) };
                Duration::from_millis(half + jitter)
            }
        }
    }
}
