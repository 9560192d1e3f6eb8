//! # Outcome classification.
//!
//! | Outcome                                  | Action | Counter   |
//! |------------------------------------------|--------|-----------|
//! | `Success`                                | ack    | `ack`     |
//! | `Unsupported`                            | ack    | `ack`     |
//! | `Malformed { .. }`                       | ack    | `autoack` |
//! | `BusinessRejection`                      | ack    | `ack`     |
//! | `DataConflict { already_exists: true }`  | ack    | `ack`     |
//! | `DataConflict { already_exists: false }` | nack   | `nack`    |
//! | `PersistenceFailure { already_applied: true }`  | ack  | `ack`  |
//! | `PersistenceFailure { already_applied: false }` | nack | `nack` |
//! | `TransientFailure`                       | nack   | `nack`    |

use super::decode::DecodeError;
use super::route::RouteError;

pub const RECEIVE_COUNTER: &str = "pubsub_receive_counter";
pub const ACK_COUNTER: &str = "pubsub_ack_counter";
pub const AUTOACK_COUNTER: &str = "pubsub_autoack_counter";
pub const NACK_COUNTER: &str = "pubsub_nack_counter";

/// Result of handling one delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Success,
    /// Version or shape this service does not handle.
    Unsupported,
    /// Structurally invalid, or an action this service is not configured for.
    Malformed { not_configured: bool },
    BusinessRejection,
    DataConflict { already_exists: bool },
    PersistenceFailure { already_applied: bool },
    TransientFailure,
}

/// Broker-facing action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AckAction {
    Ack,
    Nack,
}

/// Which terminal counter a delivery increments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AckCounter {
    Ack,
    AutoAck,
    Nack,
}

impl AckCounter {
    pub fn metric_name(self) -> &'static str {
        match self {
            AckCounter::Ack => ACK_COUNTER,
            AckCounter::AutoAck => AUTOACK_COUNTER,
            AckCounter::Nack => NACK_COUNTER,
        }
    }
}

/// The single action plus counter chosen for one delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AckDecision {
    pub action: AckAction,
    pub counter: AckCounter,
}

impl DeliveryOutcome {
    /// Classifies a decode failure.
    pub fn from_decode(err: &DecodeError) -> Self {
        match err {
            DecodeError::Unsupported { .. } => DeliveryOutcome::Unsupported,
            DecodeError::NotConfigured { .. } => DeliveryOutcome::Malformed {
                not_configured: true,
            },
            DecodeError::Malformed { .. } => DeliveryOutcome::Malformed {
                not_configured: false,
            },
        }
    }

    /// Classifies a router result.
    pub fn from_route(result: &Result<(), RouteError>) -> Self {
        match result {
            Ok(()) => DeliveryOutcome::Success,
            Err(RouteError::Invalid(e)) => Self::from_decode(e),
            Err(RouteError::Rejected { .. }) => DeliveryOutcome::BusinessRejection,
            Err(RouteError::Conflict { already_exists, .. }) => DeliveryOutcome::DataConflict {
                already_exists: *already_exists,
            },
            Err(RouteError::Persistence {
                already_applied, ..
            }) => DeliveryOutcome::PersistenceFailure {
                already_applied: *already_applied,
            },
            Err(RouteError::Other(_)) => DeliveryOutcome::TransientFailure,
        }
    }

    pub fn decision(self) -> AckDecision {
        let (action, counter) = match self {
            DeliveryOutcome::Success
            | DeliveryOutcome::Unsupported
            | DeliveryOutcome::BusinessRejection
            | DeliveryOutcome::DataConflict {
                already_exists: true,
            }
            | DeliveryOutcome::PersistenceFailure {
                already_applied: true,
            } => (AckAction::Ack, AckCounter::Ack),
            DeliveryOutcome::Malformed { .. } => (AckAction::Ack, AckCounter::AutoAck),
            DeliveryOutcome::DataConflict {
                already_exists: false,
            }
            | DeliveryOutcome::PersistenceFailure {
                already_applied: false,
            }
            | DeliveryOutcome::TransientFailure => (AckAction::Nack, AckCounter::Nack),
        };
        AckDecision { action, counter }
    }

    pub fn as_label(self) -> &'static str {
        match self {
            DeliveryOutcome::Success => "success",
            DeliveryOutcome::Unsupported => "unsupported",
            DeliveryOutcome::Malformed { .. } => "malformed",
            DeliveryOutcome::BusinessRejection => "business_rejection",
            DeliveryOutcome::DataConflict { .. } => "data_conflict",
            DeliveryOutcome::PersistenceFailure { .. } => "persistence_failure",
            DeliveryOutcome::TransientFailure => "transient_failure",
        }
    }
}
