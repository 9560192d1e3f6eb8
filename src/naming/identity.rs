use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Maximum resource name length accepted by the broker.
pub const MAX_NAME_LEN: usize = 255;

/// Kind of broker resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Topic,
    Subscription,
}

impl ResourceKind {
    /// Path segment used in fully qualified names.
    pub fn collection(&self) -> &'static str {
        match self {
            ResourceKind::Topic => "topics",
            ResourceKind::Subscription => "subscriptions",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Topic => f.write_str("topic"),
            ResourceKind::Subscription => f.write_str("subscription"),
        }
    }
}

/// Errors raised while deriving or validating a resource name.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// Nothing usable remained after stripping illegal characters.
    #[error("base name {base:?} yields an empty resource name")]
    Empty { base: String },

    /// Name violates the broker naming constraint.
    #[error("invalid resource name {name:?}: {reason}")]
    Invalid { name: String, reason: &'static str },
}

impl NameError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            NameError::Empty { .. } => "name_empty",
            NameError::Invalid { .. } => "name_invalid",
        }
    }
}

/// Checks `name` against `^[a-zA-Z][a-zA-Z0-9_.~%-]{0,254}$`.
pub fn validate_name(name: &str) -> Result<(), NameError> {
    let invalid = |reason| NameError::Invalid {
        name: name.to_string(),
        reason,
    };
    let mut chars = name.chars();
    match chars.next() {
        None => return Err(invalid("name is empty")),
        Some(c) if !c.is_ascii_alphabetic() => return Err(invalid("must start with a letter")),
        Some(_) => {}
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid("longer than 255 characters"));
    }
    if !chars.all(is_name_char) {
        return Err(invalid("contains characters outside [a-zA-Z0-9_.~%-]"));
    }
    Ok(())
}

pub(crate) fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '~' | '%' | '-')
}

/// Validated, immutable identity of a topic or subscription.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceIdentity {
    project: String,
    name: String,
    kind: ResourceKind,
}

impl ResourceIdentity {
    /// Creates an identity after validating the final `name`.
    pub fn new(
        project: impl Into<String>,
        name: impl Into<String>,
        kind: ResourceKind,
    ) -> Result<Self, NameError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            project: project.into(),
            name,
            kind,
        })
    }

    /// Shorthand for a topic identity.
    pub fn topic(project: impl Into<String>, name: impl Into<String>) -> Result<Self, NameError> {
        Self::new(project, name, ResourceKind::Topic)
    }

    /// Shorthand for a subscription identity.
    pub fn subscription(
        project: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, NameError> {
        Self::new(project, name, ResourceKind::Subscription)
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Final materialized name (without project prefix).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Fully qualified path, e.g. `projects/p/topics/orders`.
    pub fn path(&self) -> String {
        format!(
            "projects/{}/{}/{}",
            self.project,
            self.kind.collection(),
            self.name
        )
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_broker_safe_names() {
        assert!(validate_name("orders").is_ok());
        assert!(validate_name("a").is_ok());
        assert!(validate_name("local-orders_v1.2~x%y").is_ok());
        assert!(validate_name(&format!("a{}", "b".repeat(254))).is_ok());
    }

    #[test]
    fn rejects_names_outside_the_constraint() {
        assert!(validate_name("").is_err());
        assert!(validate_name("1orders").is_err());
        assert!(validate_name("-orders").is_err());
        assert!(validate_name("orders/x").is_err());
        assert!(validate_name(&format!("a{}", "b".repeat(255))).is_err());
    }

    #[test]
    fn identity_path_uses_kind_collection() {
        let topic = ResourceIdentity::topic("proj", "orders").unwrap();
        let sub = ResourceIdentity::subscription("proj", "orders-core").unwrap();
        assert_eq!(topic.path(), "projects/proj/topics/orders");
        assert_eq!(sub.to_string(), "projects/proj/subscriptions/orders-core");
        assert_eq!(sub.kind(), ResourceKind::Subscription);
    }

    #[test]
    fn identity_rejects_invalid_forced_name() {
        let err = ResourceIdentity::topic("proj", "Orders#1").unwrap_err();
        assert_eq!(err.as_label(), "name_invalid");
    }
}
