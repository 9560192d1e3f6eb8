//! Idempotent provisioning of broker topics and subscriptions.
//!
//! - [`BrokerAdmin`] the broker management collaborator (exists / create / IAM test)
//! - [`Provisioner`] ensures one resource exists, creating it when permitted
//! - [`ResourceResolver`] names a resource via [`ResourceNamer`](crate::ResourceNamer)
//!   and provisions it, keeping an inventory of what was resolved

mod admin;
mod provisioner;
mod resolver;

pub use admin::{ACK_DEADLINE, AdminError, BrokerAdmin, EDITOR_PERMISSIONS, SubscriptionSettings};
pub use provisioner::{ProvisionError, ProvisionState, Provisioner};
pub use resolver::{ResourceInventory, ResourceResolver};
