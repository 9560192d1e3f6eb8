use std::time::Duration;

use crate::policies::RetryPolicy;

/// One subscription the manager must bring up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionSpec {
    /// Topic base name, before contextualization.
    pub topic: String,
    /// Use `topic` verbatim as the topic name.
    pub force: bool,
    pub retry: RetryPolicy,
}

impl SubscriptionSpec {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            force: false,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn forced(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.retry.attempts = attempts;
        self.retry.delay = delay;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
