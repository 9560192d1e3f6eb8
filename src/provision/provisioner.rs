//! # Idempotent topic/subscription provisioning.
//!
//! Per resource:
//! ```text
//! Unchecked ──get──► Exists  (no-op)
//!           └──────► Absent ──editor?──► Created
//!                                   └──► PermissionDenied (fatal)
//! ```
//!
//! ## Rules
//! - Only [`AdminError::NotFound`] from an existence check means `Absent`; any other
//!   failure propagates.
//! - The editor check runs at most once per provisioner that observes an answer
//!   (write-once cell). Concurrent first calls may query redundantly.
//! - A subscription's topic is ensured first, before the subscription itself.
//! - `AlreadyExists` on create is a lost creation race and counts as success.

use std::sync::{Arc, OnceLock};

use thiserror::Error;
use tracing::{error, info};

use super::admin::{AdminError, BrokerAdmin, EDITOR_PERMISSIONS, SubscriptionSettings};
use crate::naming::{NameError, ResourceIdentity, ResourceKind};

/// Result of ensuring one resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProvisionState {
    /// The resource was already present.
    Exists,
    /// The resource was absent and has been created.
    Created,
}

/// Errors raised while provisioning.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum ProvisionError {
    /// Resource is absent and the caller may not create it. Never retried.
    #[error("{kind} {name} does not exist and the caller lacks permission to create it (missing: {missing:?})")]
    PermissionDenied {
        kind: ResourceKind,
        name: String,
        missing: Vec<&'static str>,
    },

    /// Base name could not be turned into a valid resource name.
    #[error(transparent)]
    Naming(#[from] NameError),

    /// Admin call failed for a reason other than "not found".
    #[error("{op} failed for {name}: {source}")]
    Admin {
        op: &'static str,
        name: String,
        #[source]
        source: AdminError,
    },
}

impl ProvisionError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProvisionError::PermissionDenied { .. } => "provision_permission_denied",
            ProvisionError::Naming(_) => "provision_invalid_name",
            ProvisionError::Admin { .. } => "provision_admin_failed",
        }
    }

    /// Configuration errors that no amount of retrying can fix.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ProvisionError::PermissionDenied { .. } | ProvisionError::Naming(_)
        )
    }
}

/// Ensures broker resources exist, creating them when permitted.
pub struct Provisioner {
    admin: Arc<dyn BrokerAdmin>,
    project: String,
    settings: SubscriptionSettings,
    editor: OnceLock<Vec<&'static str>>,
}

impl Provisioner {
    pub fn new(admin: Arc<dyn BrokerAdmin>, project: impl Into<String>) -> Self {
        Self {
            admin,
            project: project.into(),
            settings: SubscriptionSettings::default(),
            editor: OnceLock::new(),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Returns `true` if the caller holds all four editor permissions.
    ///
    /// The first successful answer is memoized for the process lifetime; a
    /// restart is required to pick up new rights.
    pub async fn is_editor(&self) -> Result<bool, ProvisionError> {
        Ok(self.missing_permissions().await?.is_empty())
    }

    /// Memoized editor flag, if the permission check already ran.
    pub fn cached_editor(&self) -> Option<bool> {
        self.editor.get().map(|missing| missing.is_empty())
    }

    async fn missing_permissions(&self) -> Result<Vec<&'static str>, ProvisionError> {
        if let Some(missing) = self.editor.get() {
            return Ok(missing.clone());
        }
        let granted = self
            .admin
            .test_iam_permissions(&self.project, &EDITOR_PERMISSIONS)
            .await
            .map_err(|source| ProvisionError::Admin {
                op: "test_iam_permissions",
                name: self.project.clone(),
                source,
            })?;
        let missing: Vec<&'static str> = EDITOR_PERMISSIONS
            .iter()
            .enumerate()
            .filter(|(i, _)| !granted.get(*i).copied().unwrap_or(false))
            .map(|(_, p)| *p)
            .collect();
        info!(project = %self.project, editor = missing.is_empty(), "resolved pubsub editor permissions");
        // Racing initializers computed the same answer; whichever lands first wins.
        let _ = self.editor.set(missing.clone());
        Ok(missing)
    }

    /// Ensures `topic` exists.
    pub async fn ensure_topic(
        &self,
        topic: &ResourceIdentity,
    ) -> Result<ProvisionState, ProvisionError> {
        match self.admin.get_topic(topic).await {
            Ok(()) => return Ok(ProvisionState::Exists),
            Err(AdminError::NotFound { .. }) => {}
            Err(source) => {
                return Err(ProvisionError::Admin {
                    op: "get_topic",
                    name: topic.name().to_string(),
                    source,
                });
            }
        }

        self.require_editor(topic).await?;
        info!(topic = %topic, "creating topic");
        match self.admin.create_topic(topic).await {
            Ok(()) | Err(AdminError::AlreadyExists { .. }) => Ok(ProvisionState::Created),
            Err(source) => Err(ProvisionError::Admin {
                op: "create_topic",
                name: topic.name().to_string(),
                source,
            }),
        }
    }

    /// Ensures `topic` and then `subscription` exist.
    pub async fn ensure_subscription(
        &self,
        subscription: &ResourceIdentity,
        topic: &ResourceIdentity,
    ) -> Result<ProvisionState, ProvisionError> {
        self.ensure_topic(topic).await?;

        match self.admin.get_subscription(subscription).await {
            Ok(()) => return Ok(ProvisionState::Exists),
            Err(AdminError::NotFound { .. }) => {}
            Err(source) => {
                return Err(ProvisionError::Admin {
                    op: "get_subscription",
                    name: subscription.name().to_string(),
                    source,
                });
            }
        }

        self.require_editor(subscription).await?;
        info!(
            subscription = %subscription,
            topic = %topic,
            ack_deadline = ?self.settings.ack_deadline,
            "creating pull subscription"
        );
        match self
            .admin
            .create_subscription(subscription, topic, &self.settings)
            .await
        {
            Ok(()) | Err(AdminError::AlreadyExists { .. }) => Ok(ProvisionState::Created),
            Err(source) => Err(ProvisionError::Admin {
                op: "create_subscription",
                name: subscription.name().to_string(),
                source,
            }),
        }
    }

    async fn require_editor(&self, resource: &ResourceIdentity) -> Result<(), ProvisionError> {
        let missing = self.missing_permissions().await?;
        if missing.is_empty() {
            return Ok(());
        }
        error!(
            kind = %resource.kind(),
            resource = %resource,
            ?missing,
            "resource does not exist and caller lacks permission to create it"
        );
        Err(ProvisionError::PermissionDenied {
            kind: resource.kind(),
            name: resource.name().to_string(),
            missing,
        })
    }
}
