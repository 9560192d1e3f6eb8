use serde::{Deserialize, Serialize};

/// Deployment facts that make resource names unique per environment.
///
/// Supplied once at process start (see [`PubSubConfig`](crate::PubSubConfig))
/// and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentContext {
    /// Source branch the process was built from (`"master"` for trunk).
    #[serde(default = "default_branch")]
    pub branch_name: String,
    /// Whether the process runs on a developer machine.
    #[serde(default, rename = "local")]
    pub is_local: bool,
    /// Stable per-machine tag, appended to local resource names.
    #[serde(default)]
    pub client_tag: String,
    /// Logical name of the consuming service.
    pub client_id: String,
}

fn default_branch() -> String {
    super::TRUNK_BRANCH.to_string()
}

impl DeploymentContext {
    /// Context for a trunk, non-local deployment of `client_id`.
    pub fn trunk(client_id: impl Into<String>) -> Self {
        Self {
            branch_name: default_branch(),
            is_local: false,
            client_tag: String::new(),
            client_id: client_id.into(),
        }
    }

    /// Returns a copy with the given branch.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch_name = branch.into();
        self
    }

    /// Returns a copy marked as local development with the given machine tag.
    pub fn with_local(mut self, client_tag: impl Into<String>) -> Self {
        self.is_local = true;
        self.client_tag = client_tag.into();
        self
    }
}
