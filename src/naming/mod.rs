//! Broker resource naming.
//!
//! This module turns raw base names (`"orders"`, `"orders-inventory-core"`) into
//! broker-safe resource names that are unique per deployment context, so that
//! feature branches and developer machines never consume each other's messages.
//!
//! ## Contents
//! - [`DeploymentContext`] branch / locality / client identity of the running process
//! - [`ResourceNamer`] applies the context to a base name (`contextualize`)
//! - [`ResourceIdentity`], [`ResourceKind`] validated, immutable broker resource names
//! - [`NameError`] empty or invalid names
//!
//! ## Pipeline
//! ```text
//! base ──► +"-{branch}" (non-trunk) ──► "local-{name}-{tag}" (local)
//!      ──► [#/] → "-" ──► drop illegal chars ──► lowercase
//!      ──► strip leading non-letters ──► truncate(255)
//! ```

mod context;
mod identity;
mod namer;

pub use context::DeploymentContext;
pub use identity::{MAX_NAME_LEN, NameError, ResourceIdentity, ResourceKind, validate_name};
pub use namer::{LOCAL_PREFIX, ResourceNamer, TRUNK_BRANCH};
