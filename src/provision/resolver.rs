//! # Name resolution + provisioning.
//!
//! [`ResourceResolver`] composes [`ResourceNamer`] with [`Provisioner`] and
//! remembers every resource it handed out, so the process can report which
//! topics and subscriptions it is wired to.
//!
//! ## Naming rules
//! - Topic: `contextualize(base)`, or `base` verbatim when `force` is set.
//! - Subscription: `contextualize("{topic_base}-{client_id}")`, always. Forcing
//!   a shared topic never makes developers share a subscription.

use parking_lot::RwLock;
use serde::Serialize;
use tracing::info;

use super::provisioner::{ProvisionError, Provisioner};
use crate::naming::{ResourceIdentity, ResourceNamer};

/// Serializable snapshot of the resources resolved so far.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResourceInventory {
    /// Client id of this service.
    pub name: String,
    pub topics: Vec<String>,
    pub subscriptions: Vec<String>,
    /// Whether the caller holds create/delete rights (`false` if never checked).
    pub editor: bool,
    pub local: bool,
}

#[derive(Default)]
struct Resolved {
    topics: Vec<ResourceIdentity>,
    subscriptions: Vec<ResourceIdentity>,
}

/// Resolves base names into provisioned broker resources.
pub struct ResourceResolver {
    namer: ResourceNamer,
    provisioner: Provisioner,
    resolved: RwLock<Resolved>,
}

impl ResourceResolver {
    pub fn new(namer: ResourceNamer, provisioner: Provisioner) -> Self {
        Self {
            namer,
            provisioner,
            resolved: RwLock::new(Resolved::default()),
        }
    }

    pub fn namer(&self) -> &ResourceNamer {
        &self.namer
    }

    pub fn provisioner(&self) -> &Provisioner {
        &self.provisioner
    }

    /// Resolves and ensures a topic named after this service's client id.
    pub async fn resolve_default_topic(&self) -> Result<ResourceIdentity, ProvisionError> {
        let base = self.namer.context().client_id.clone();
        self.resolve_topic(&base, false).await
    }

    /// Resolves and ensures the topic for `base`.
    pub async fn resolve_topic(
        &self,
        base: &str,
        force: bool,
    ) -> Result<ResourceIdentity, ProvisionError> {
        info!(topic = base, force, "getting or creating topic");
        let topic = self.topic_identity(base, force)?;
        self.provisioner.ensure_topic(&topic).await?;
        remember(&mut self.resolved.write().topics, &topic);
        info!(topic = %topic.name(), "topic exists and is ready to publish");
        Ok(topic)
    }

    /// Resolves and ensures the subscription this service owns on `topic_base`.
    pub async fn resolve_subscription(
        &self,
        topic_base: &str,
        force: bool,
    ) -> Result<ResourceIdentity, ProvisionError> {
        info!(topic = topic_base, force, "getting or creating subscription");
        let topic = self.topic_identity(topic_base, force)?;
        let subscription = self.subscription_identity(topic_base)?;

        self.provisioner
            .ensure_subscription(&subscription, &topic)
            .await?;

        {
            let mut resolved = self.resolved.write();
            remember(&mut resolved.topics, &topic);
            remember(&mut resolved.subscriptions, &subscription);
        }
        info!(
            subscription = %subscription.name(),
            "subscription exists and is ready to receive"
        );
        Ok(subscription)
    }

    /// Snapshot of resolved resources.
    ///
    /// Reports the memoized editor flag only; never queries permissions.
    pub fn inventory(&self) -> ResourceInventory {
        let editor = self.provisioner.cached_editor().unwrap_or(false);
        let resolved = self.resolved.read();
        ResourceInventory {
            name: self.namer.context().client_id.clone(),
            topics: resolved.topics.iter().map(|t| t.name().to_string()).collect(),
            subscriptions: resolved
                .subscriptions
                .iter()
                .map(|s| s.name().to_string())
                .collect(),
            editor,
            local: self.namer.context().is_local,
        }
    }

    fn topic_identity(&self, base: &str, force: bool) -> Result<ResourceIdentity, ProvisionError> {
        let name = if force {
            info!(topic = base, "force = true, not adding context");
            base.to_string()
        } else {
            self.namer.contextualize(base)?
        };
        Ok(ResourceIdentity::topic(self.provisioner.project(), name)?)
    }

    fn subscription_identity(&self, topic_base: &str) -> Result<ResourceIdentity, ProvisionError> {
        let base = format!("{topic_base}-{}", self.namer.context().client_id);
        let name = self.namer.contextualize(&base)?;
        Ok(ResourceIdentity::subscription(
            self.provisioner.project(),
            name,
        )?)
    }
}

fn remember(list: &mut Vec<ResourceIdentity>, id: &ResourceIdentity) {
    if !list.contains(id) {
        list.push(id.clone());
    }
}
