//! Request payloads for the protected branches API.
//!
//! GitLab addresses individual access grants inside a protected branch by a small
//! integer slot identifier. Sending an entry with an `id` upserts that slot, and
//! sending `{"id": n, "_destroy": true}` removes it.
//!
//! See: https://docs.gitlab.com/ee/api/protected_branches.html

use serde::{Deserialize, Serialize};

use crate::models::AccessLevelValue;

#[cfg(test)]
#[path = "protected_branch_tests.rs"]
mod tests;

/// A single access grant as sent to GitLab.
///
/// # Examples
///
/// ```rust
/// use gitlab_client::BranchPermissionOptions;
///
/// let destroy = BranchPermissionOptions::destroy(5);
/// let json = serde_json::to_string(&destroy).unwrap();
/// assert_eq!(json, r#"{"id":5,"_destroy":true}"#);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchPermissionOptions {
    /// Slot identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy_key_id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_level: Option<AccessLevelValue>,

    /// Marks the slot for removal
    #[serde(rename = "_destroy", skip_serializing_if = "Option::is_none")]
    pub destroy: Option<bool>,
}

impl BranchPermissionOptions {
    /// Creates a bare entry that removes the grant occupying `id`.
    pub fn destroy(id: i64) -> Self {
        Self {
            id: Some(id),
            destroy: Some(true),
            ..Default::default()
        }
    }
}

/// Payload for `POST /projects/:id/protected_branches`.
///
/// The three permission lists are always serialized, an empty list is sent as `[]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectRepositoryBranchesOptions {
    /// Branch name or wildcard
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_force_push: Option<bool>,

    pub allowed_to_push: Vec<BranchPermissionOptions>,

    pub allowed_to_merge: Vec<BranchPermissionOptions>,

    pub allowed_to_unprotect: Vec<BranchPermissionOptions>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_owner_approval_required: Option<bool>,
}

/// Payload for `PATCH /projects/:id/protected_branches/:name`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProtectedBranchOptions {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_force_push: Option<bool>,

    pub allowed_to_push: Vec<BranchPermissionOptions>,

    pub allowed_to_merge: Vec<BranchPermissionOptions>,

    pub allowed_to_unprotect: Vec<BranchPermissionOptions>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_owner_approval_required: Option<bool>,
}
