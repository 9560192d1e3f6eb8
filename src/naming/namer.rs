//! # Context-aware resource names.
//!
//! [`ResourceNamer::contextualize`] is pure and deterministic for a fixed
//! [`DeploymentContext`]. It is **not** idempotent: applying it to an already
//! contextualized name prefixes it again, so callers apply it exactly once per
//! raw base name.
//!
//! ## Example
//! ```rust
//! use subvisor::{DeploymentContext, ResourceNamer};
//!
//! let ctx = DeploymentContext::trunk("inventory-core")
//!     .with_branch("feature-x")
//!     .with_local("abc123");
//! let namer = ResourceNamer::new(ctx);
//! assert_eq!(namer.contextualize("orders").unwrap(), "local-orders-feature-x-abc123");
//! ```

use tracing::{info, warn};

use super::context::DeploymentContext;
use super::identity::{MAX_NAME_LEN, NameError, is_name_char};

/// Canonical trunk branch; resources built from it carry no branch suffix.
pub const TRUNK_BRANCH: &str = "master";

/// Prefix applied to every resource created from a developer machine.
pub const LOCAL_PREFIX: &str = "local";

/// Derives broker-safe names from base names and a deployment context.
#[derive(Clone, Debug)]
pub struct ResourceNamer {
    ctx: DeploymentContext,
}

impl ResourceNamer {
    pub fn new(ctx: DeploymentContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &DeploymentContext {
        &self.ctx
    }

    /// Applies branch and locality context to `base`, then sanitizes it.
    ///
    /// The result always satisfies [`validate_name`](super::validate_name).
    /// Truncation to 255 characters may map distinct inputs to the same name;
    /// no collision avoidance is attempted.
    pub fn contextualize(&self, base: &str) -> Result<String, NameError> {
        info!(resource = base, "adding context to resource");
        let mut name = base.to_string();

        if !self.ctx.branch_name.eq_ignore_ascii_case(TRUNK_BRANCH) {
            name = format!("{name}-{}", self.ctx.branch_name);
        }
        if self.ctx.is_local {
            name = format!("{LOCAL_PREFIX}-{name}-{}", self.ctx.client_tag);
        }

        let mut name: String = name
            .chars()
            .map(|c| if matches!(c, '#' | '/') { '-' } else { c })
            .filter(|c| is_name_char(*c))
            .collect::<String>()
            .to_ascii_lowercase();

        let first_letter = name.find(|c: char| c.is_ascii_alphabetic());
        match first_letter {
            Some(idx) => {
                name.drain(..idx);
            }
            None => {
                return Err(NameError::Empty {
                    base: base.to_string(),
                });
            }
        }

        if name.len() > MAX_NAME_LEN {
            warn!(resource = %name, "resource name exceeds length limit, truncating");
            // Only ASCII survives sanitizing, so byte truncation is char-safe.
            name.truncate(MAX_NAME_LEN);
        }

        info!(resource = %name, "resource after adding context");
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::validate_name;

    fn namer(branch: &str, local: Option<&str>) -> ResourceNamer {
        let mut ctx = DeploymentContext::trunk("inventory-core").with_branch(branch);
        if let Some(tag) = local {
            ctx = ctx.with_local(tag);
        }
        ResourceNamer::new(ctx)
    }

    #[test]
    fn trunk_non_local_keeps_base_name() {
        assert_eq!(
            namer("master", None).contextualize("orders").unwrap(),
            "orders"
        );
        assert_eq!(
            namer("MASTER", None).contextualize("Orders").unwrap(),
            "orders"
        );
    }

    #[test]
    fn feature_branch_local_gets_prefix_branch_and_tag() {
        assert_eq!(
            namer("feature-x", Some("abc123"))
                .contextualize("orders")
                .unwrap(),
            "local-orders-feature-x-abc123"
        );
    }

    #[test]
    fn branch_separators_become_dashes_and_illegal_chars_drop() {
        assert_eq!(
            namer("feature/JIRA#12 fix!", None)
                .contextualize("orders")
                .unwrap(),
            "orders-feature-jira-12fix"
        );
    }

    #[test]
    fn leading_non_letters_are_stripped() {
        assert_eq!(
            namer("master", None).contextualize("-42_orders").unwrap(),
            "orders"
        );
    }

    #[test]
    fn all_illegal_input_is_an_error() {
        let err = namer("master", None).contextualize("1234").unwrap_err();
        assert_eq!(err, NameError::Empty { base: "1234".into() });
    }

    #[test]
    fn long_names_truncate_to_limit() {
        let base = "o".repeat(400);
        let name = namer("feature-x", None).contextualize(&base).unwrap();
        assert_eq!(name.len(), MAX_NAME_LEN);
        assert!(validate_name(&name).is_ok());
    }

    #[test]
    fn contextualizing_twice_double_prefixes() {
        let n = namer("master", Some("tag"));
        let once = n.contextualize("orders").unwrap();
        let twice = n.contextualize(&once).unwrap();
        assert_eq!(once, "local-orders-tag");
        assert_eq!(twice, "local-local-orders-tag-tag");
    }

    #[test]
    fn outputs_always_satisfy_naming_constraint() {
        let bases = [
            "orders",
            "ÜBER/orders",
            "__x",
            "a#b/c d",
            "~~~z",
            "9lives-Cat",
            "%%%ok%%%",
        ];
        let contexts = [
            namer("master", None),
            namer("release/2.0", None),
            namer("feature-x", Some("abc123")),
            namer("#1", Some("ÿ")),
        ];
        for n in &contexts {
            for base in bases {
                let name = n.contextualize(base).unwrap();
                assert!(validate_name(&name).is_ok(), "{base} -> {name}");
                assert!(name.len() <= MAX_NAME_LEN);
            }
        }
    }
}
