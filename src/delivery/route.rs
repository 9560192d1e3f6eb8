use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use super::decode::{DecodeError, Envelope};

/// Per-delivery metadata handed to the router next to the envelope.
#[derive(Clone, Copy, Debug)]
pub struct DeliveryContext<'a> {
    pub message_id: &'a str,
    pub attributes: &'a HashMap<String, String>,
    pub delivery_attempt: Option<u32>,
}

/// Classified router failure.
///
/// Duplicate detection is carried as a flag set by the router, which knows
/// how its store reports a duplicate key.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RouteError {
    /// Handler-side validation refused the envelope.
    #[error(transparent)]
    Invalid(#[from] DecodeError),

    /// Domain logic understood and deliberately refused the message.
    #[error("rejected: {reason}")]
    Rejected { reason: String },

    /// The underlying store reported a conflict.
    #[error("store conflict: {detail}")]
    Conflict { already_exists: bool, detail: String },

    /// The persistence layer failed.
    #[error("persistence failure: {detail}")]
    Persistence { already_applied: bool, detail: String },

    /// Anything else. Assumed transient.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl RouteError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        RouteError::Rejected {
            reason: reason.into(),
        }
    }

    pub fn conflict(already_exists: bool, detail: impl Into<String>) -> Self {
        RouteError::Conflict {
            already_exists,
            detail: detail.into(),
        }
    }

    pub fn persistence(already_applied: bool, detail: impl Into<String>) -> Self {
        RouteError::Persistence {
            already_applied,
            detail: detail.into(),
        }
    }

    pub fn other(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        RouteError::Other(err.into())
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            RouteError::Invalid(e) => e.as_label(),
            RouteError::Rejected { .. } => "route_rejected",
            RouteError::Conflict { .. } => "route_conflict",
            RouteError::Persistence { .. } => "route_persistence",
            RouteError::Other(_) => "route_other",
        }
    }
}

/// Business routing collaborator.
#[async_trait]
pub trait Router: Send + Sync + 'static {
    async fn route(&self, envelope: &Envelope, ctx: &DeliveryContext<'_>) -> Result<(), RouteError>;
}
