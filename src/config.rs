//! # Pub/sub configuration.
//!
//! Loaded from YAML, then overridden from the environment:
//!
//! ```yaml
//! project_id: my-project
//! emulator_host: localhost:8085      # optional
//! number_of_retries: 3               # default per subscription
//! delay_before_retry_ms: 1000
//! buffer_capacity: 10000
//! metric_tags: [action]
//! deployment:
//!   client_id: asn-core
//!   branch_name: master
//!   local: false
//!   client_tag: abc123               # falls back to $HOSTNAME, then "dev"
//! subscriptions:
//!   - topic: inventory
//!   - topic: shared-events
//!     force: true
//!     retry_count: 5
//!     retry_delay_ms: 2000
//! ```
//!
//! | Variable               | Overrides                  |
//! |------------------------|----------------------------|
//! | `PUBSUB_PROJECT_ID`    | `project_id`               |
//! | `PUBSUB_EMULATOR_HOST` | `emulator_host`            |
//! | `PUBSUB_CLIENT_ID`     | `deployment.client_id`     |
//! | `BRANCH_NAME`          | `deployment.branch_name`   |
//! | `PUBSUB_LOCAL`         | `deployment.local`         |
//! | `PUBSUB_CLIENT_TAG`    | `deployment.client_tag`    |
//!
//! Without a `project_id` or a first subscription topic the subsystem is
//! disabled: loading returns `Ok(None)`.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::buffer::{DEFAULT_BUFFER_CAPACITY, MessageBuffer};
use crate::core::SubscriptionSpec;
use crate::delivery::DEFAULT_METRIC_TAGS;
use crate::listener::Endpoint;
use crate::naming::{DeploymentContext, TRUNK_BRANCH};
use crate::policies::{DEFAULT_ATTEMPTS, DEFAULT_DELAY, JitterPolicy, RetryPolicy};

const FALLBACK_CLIENT_TAG: &str = "dev";

/// Errors raised while loading configuration.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid pubsub yaml: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("missing required setting {field}")]
    Missing { field: String },

    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
}

impl ConfigError {
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "config_io",
            ConfigError::Parse(_) => "config_parse",
            ConfigError::Missing { .. } => "config_missing",
            ConfigError::InvalidEnv { .. } => "config_invalid_env",
        }
    }
}

/// One configured subscription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionConfig {
    pub topic: String,
    pub force: bool,
    /// Overrides `number_of_retries`.
    pub retry_count: Option<u32>,
    /// Overrides `delay_before_retry_ms`.
    pub retry_delay_ms: Option<u64>,
}

/// Resolved pub/sub configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PubSubConfig {
    pub project_id: String,
    pub subscriptions: Vec<SubscriptionConfig>,
    pub number_of_retries: u32,
    pub delay_before_retry_ms: u64,
    pub retry_jitter: JitterPolicy,
    pub emulator_host: Option<String>,
    pub buffer_capacity: usize,
    pub metric_tags: Vec<String>,
    pub deployment: DeploymentContext,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PubSubConfigWire {
    project_id: Option<String>,
    subscriptions: Vec<SubscriptionWire>,
    number_of_retries: Option<u32>,
    delay_before_retry_ms: Option<u64>,
    retry_jitter: Option<JitterPolicy>,
    emulator_host: Option<String>,
    buffer_capacity: Option<usize>,
    metric_tags: Option<Vec<String>>,
    deployment: DeploymentWire,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SubscriptionWire {
    topic: Option<String>,
    force: bool,
    retry_count: Option<u32>,
    retry_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DeploymentWire {
    client_id: Option<String>,
    branch_name: Option<String>,
    local: Option<bool>,
    client_tag: Option<String>,
}

impl PubSubConfig {
    /// Reads `path` and applies process environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Parses YAML and applies process environment overrides.
    pub fn from_yaml_str(raw: &str) -> Result<Option<Self>, ConfigError> {
        Self::from_yaml_with_env(raw, |key| std::env::var(key).ok())
    }

    /// Parses YAML and applies overrides from `env`.
    pub fn from_yaml_with_env<F>(raw: &str, env: F) -> Result<Option<Self>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut wire: PubSubConfigWire = if raw.trim().is_empty() {
            PubSubConfigWire::default()
        } else {
            serde_yaml::from_str(raw)?
        };
        apply_env(&mut wire, &env)?;

        let Some(project_id) = non_blank(wire.project_id) else {
            info!("pubsub disabled: no project_id configured");
            return Ok(None);
        };
        let first_topic = wire.subscriptions.first().and_then(|s| s.topic.as_deref());
        if first_topic.is_none_or(|t| t.trim().is_empty()) {
            info!("pubsub disabled: no subscription topic configured");
            return Ok(None);
        }

        let subscriptions = wire
            .subscriptions
            .into_iter()
            .enumerate()
            .map(|(i, s)| {
                let topic = non_blank(s.topic).ok_or_else(|| ConfigError::Missing {
                    field: format!("subscriptions[{i}].topic"),
                })?;
                Ok(SubscriptionConfig {
                    topic,
                    force: s.force,
                    retry_count: s.retry_count,
                    retry_delay_ms: s.retry_delay_ms,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let d = wire.deployment;
        let client_id = non_blank(d.client_id).ok_or_else(|| ConfigError::Missing {
            field: "deployment.client_id".to_string(),
        })?;
        let client_tag = non_blank(d.client_tag)
            .or_else(|| non_blank(env("HOSTNAME")))
            .unwrap_or_else(|| FALLBACK_CLIENT_TAG.to_string());
        let deployment = DeploymentContext {
            branch_name: non_blank(d.branch_name).unwrap_or_else(|| TRUNK_BRANCH.to_string()),
            is_local: d.local.unwrap_or(false),
            client_tag,
            client_id,
        };

        Ok(Some(Self {
            project_id,
            subscriptions,
            number_of_retries: wire.number_of_retries.unwrap_or(DEFAULT_ATTEMPTS),
            delay_before_retry_ms: wire
                .delay_before_retry_ms
                .unwrap_or(DEFAULT_DELAY.as_millis() as u64),
            retry_jitter: wire.retry_jitter.unwrap_or_default(),
            emulator_host: non_blank(wire.emulator_host),
            buffer_capacity: wire.buffer_capacity.unwrap_or(DEFAULT_BUFFER_CAPACITY),
            metric_tags: wire
                .metric_tags
                .unwrap_or_else(|| DEFAULT_METRIC_TAGS.iter().map(|t| t.to_string()).collect()),
            deployment,
        }))
    }

    /// Retry policy for subscriptions without their own overrides.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.number_of_retries,
            Duration::from_millis(self.delay_before_retry_ms),
        )
        .with_jitter(self.retry_jitter)
    }

    /// Startup specs with per-subscription overrides applied.
    pub fn subscription_specs(&self) -> Vec<SubscriptionSpec> {
        let base = self.retry_policy();
        self.subscriptions
            .iter()
            .map(|s| {
                let mut retry = base;
                if let Some(n) = s.retry_count {
                    retry.attempts = n;
                }
                if let Some(ms) = s.retry_delay_ms {
                    retry.delay = Duration::from_millis(ms);
                }
                SubscriptionSpec::new(s.topic.clone())
                    .forced(s.force)
                    .with_retry_policy(retry)
            })
            .collect()
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::from_emulator_host(self.emulator_host.as_deref())
    }

    /// Empty message buffer sized by `buffer_capacity`.
    pub fn buffer<T>(&self) -> MessageBuffer<T> {
        MessageBuffer::with_capacity(self.buffer_capacity)
    }
}

fn apply_env<F>(wire: &mut PubSubConfigWire, env: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = env("PUBSUB_PROJECT_ID") {
        wire.project_id = Some(v);
    }
    if let Some(v) = env("PUBSUB_EMULATOR_HOST") {
        wire.emulator_host = Some(v);
    }
    if let Some(v) = env("PUBSUB_CLIENT_ID") {
        wire.deployment.client_id = Some(v);
    }
    if let Some(v) = env("BRANCH_NAME") {
        wire.deployment.branch_name = Some(v);
    }
    if let Some(v) = env("PUBSUB_CLIENT_TAG") {
        wire.deployment.client_tag = Some(v);
    }
    if let Some(v) = env("PUBSUB_LOCAL") {
        let local = match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" | "" => false,
            _ => {
                return Err(ConfigError::InvalidEnv {
                    var: "PUBSUB_LOCAL",
                    value: v,
                });
            }
        };
        wire.deployment.local = Some(local);
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
