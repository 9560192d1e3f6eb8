//! # Broker admin collaborator.
//!
//! [`BrokerAdmin`] is the seam to the broker's management API. Connection and
//! authentication setup live outside this crate; the provisioner only issues
//! the calls below.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::naming::ResourceIdentity;

/// Acknowledgment deadline applied to every subscription this crate creates.
pub const ACK_DEADLINE: Duration = Duration::from_secs(60);

/// Permissions required before the provisioner may create anything.
pub const EDITOR_PERMISSIONS: [&str; 4] = [
    "pubsub.topics.create",
    "pubsub.topics.delete",
    "pubsub.subscriptions.create",
    "pubsub.subscriptions.delete",
];

/// Fixed parameters for subscription creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionSettings {
    /// Time the broker waits for an ack before redelivering.
    pub ack_deadline: Duration,
    /// Push endpoint; `None` means pull delivery.
    pub push_endpoint: Option<String>,
}

impl Default for SubscriptionSettings {
    fn default() -> Self {
        Self {
            ack_deadline: ACK_DEADLINE,
            push_endpoint: None,
        }
    }
}

/// Failures reported by admin calls.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    #[error("resource not found: {resource}")]
    NotFound { resource: String },

    #[error("resource already exists: {resource}")]
    AlreadyExists { resource: String },

    #[error("permission denied: {reason}")]
    PermissionDenied { reason: String },

    #[error("broker unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("admin call failed: {reason}")]
    Other { reason: String },
}

impl AdminError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            AdminError::NotFound { .. } => "admin_not_found",
            AdminError::AlreadyExists { .. } => "admin_already_exists",
            AdminError::PermissionDenied { .. } => "admin_permission_denied",
            AdminError::Unavailable { .. } => "admin_unavailable",
            AdminError::Other { .. } => "admin_other",
        }
    }
}

/// Management operations on topics and subscriptions.
///
/// `get_*` must return [`AdminError::NotFound`] for a missing resource; every
/// other error is treated as a failed existence check.
#[async_trait]
pub trait BrokerAdmin: Send + Sync + 'static {
    async fn get_topic(&self, topic: &ResourceIdentity) -> Result<(), AdminError>;

    async fn create_topic(&self, topic: &ResourceIdentity) -> Result<(), AdminError>;

    async fn get_subscription(&self, subscription: &ResourceIdentity) -> Result<(), AdminError>;

    async fn create_subscription(
        &self,
        subscription: &ResourceIdentity,
        topic: &ResourceIdentity,
        settings: &SubscriptionSettings,
    ) -> Result<(), AdminError>;

    /// Returns one flag per requested permission, in request order.
    async fn test_iam_permissions(
        &self,
        project: &str,
        permissions: &[&str],
    ) -> Result<Vec<bool>, AdminError>;
}
