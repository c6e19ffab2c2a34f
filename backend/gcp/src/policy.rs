//! Wire form of a Google IAM policy, shared by the storage and
//! Pub/Sub `getIamPolicy` responses and exported policy files.

use serde::Deserialize;
use sinkaudit_core::{normalize_bindings, RoleBinding};

/// Policy version requested from every service, so conditional bindings
/// are returned instead of rejected.
pub const REQUESTED_POLICY_VERSION: u32 = 3;

/// Only the bindings are read; `etag`, `version` and binding conditions
/// are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IamPolicy {
    #[serde(default)]
    pub bindings: Vec<IamBinding>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IamBinding {
    pub role: String,
    #[serde(default)]
    pub members: Vec<String>,
}

impl IamPolicy {
    /// Flatten into role bindings with one entry per role.
    ///
    /// Conditional bindings count as grants: the condition is dropped and
    /// its members are merged into the role's other bindings.
    pub fn into_bindings(self) -> Vec<RoleBinding> {
        normalize_bindings(
            self.bindings
                .into_iter()
                .map(|b| RoleBinding::new(b.role, b.members)),
        )
    }
}
