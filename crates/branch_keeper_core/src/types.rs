//! Desired-state types for a GitLab protected branch.
//!
//! The document layout follows the usual managed resource shape: `metadata`,
//! `spec.forProvider` holding the desired policy, and `status` holding conditions.

use chrono::{DateTime, Utc};
use gitlab_client::AccessLevelValue;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;

use crate::managed::{Condition, Managed, ResourceStatus};

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;

/// Provider configuration used when a resource does not name one.
pub const DEFAULT_PROVIDER_CONFIG: &str = "default";

pub const PROTECTED_BRANCH_KIND: &str = "ProtectedBranch";

/// Reference to another resource by name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
}

/// Selects another resource by its labels.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selector {
    #[serde(default)]
    pub match_labels: BTreeMap<String, String>,
}

impl Selector {
    /// Returns `true` if every selector label is present in `labels` with the same value.
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.match_labels
            .iter()
            .all(|(k, v)| labels.get(k) == Some(v))
    }
}

/// One access grant in the desired state.
///
/// In practice only one of `user_id`, `group_id` and `deploy_key_id` identifies the
/// grantee. GitLab reports role-based grants with a zero user and group, and grants
/// compare exactly, so a role grant converges only when it sets `user_id` and
/// `group_id` to `0` explicitly.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchPermissionOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id_ref: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id_selector: Option<Selector>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_key_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_key_id_ref: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_key_id_selector: Option<Selector>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_level: Option<AccessLevelValue>,
}

/// Desired state of a protected branch.
///
/// See: https://docs.gitlab.com/ee/api/protected_branches.html
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedBranchParameters {
    /// Project the branch belongs to. Required before any remote call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id_ref: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id_selector: Option<Selector>,

    /// Identifier GitLab assigned to the protection. Never sent in payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Branch name or wildcard. The remote API keys the policy by it, so it
    /// cannot change once created.
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_to_push: Option<Vec<BranchPermissionOptions>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_to_merge: Option<Vec<BranchPermissionOptions>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_to_unprotect: Option<Vec<BranchPermissionOptions>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_force_push: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_owner_approval_required: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// Set when the user asked for the resource to be removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_timestamp: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedBranchSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_config_ref: Option<Reference>,

    pub for_provider: ProtectedBranchParameters,
}

/// A managed resource representing a protected branch.
///
/// # Examples
///
/// ```rust
/// use branch_keeper_core::ProtectedBranch;
///
/// let json = r#"{
///     "metadata": {"name": "main-protection"},
///     "spec": {
///         "forProvider": {
///             "projectId": 42,
///             "name": "main",
///             "allowedToPush": [{"accessLevel": 40, "userId": 0, "groupId": 0}]
///         }
///     }
/// }"#;
///
/// let branch: ProtectedBranch = serde_json::from_str(json).unwrap();
/// assert_eq!(branch.spec.for_provider.project_id, Some(42));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedBranch {
    pub metadata: ObjectMeta,

    pub spec: ProtectedBranchSpec,

    #[serde(default)]
    pub status: ResourceStatus,
}

impl ProtectedBranch {
    /// Creates a resource named `name` with the given desired state.
    pub fn new(name: impl Into<String>, for_provider: ProtectedBranchParameters) -> Self {
        Self {
            metadata: ObjectMeta {
                name: name.into(),
                ..Default::default()
            },
            spec: ProtectedBranchSpec {
                provider_config_ref: None,
                for_provider,
            },
            status: ResourceStatus::default(),
        }
    }
}

impl Managed for ProtectedBranch {
    fn kind(&self) -> &'static str {
        PROTECTED_BRANCH_KIND
    }

    fn name(&self) -> &str {
        &self.metadata.name
    }

    fn provider_config_name(&self) -> &str {
        self.spec
            .provider_config_ref
            .as_ref()
            .map(|r| r.name.as_str())
            .unwrap_or(DEFAULT_PROVIDER_CONFIG)
    }

    fn deletion_requested(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    fn conditions(&self) -> &[Condition] {
        &self.status.conditions
    }

    fn set_conditions(&mut self, conditions: &[Condition]) {
        self.status.set_conditions(conditions);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
