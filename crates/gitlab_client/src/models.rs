//! # Models
//!
//! Response types returned by the GitLab protected branches API.
//!
//! See: https://docs.gitlab.com/ee/api/protected_branches.html

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// A GitLab role level, as used by `access_level` fields.
///
/// GitLab encodes roles as integers. The named constants cover the documented
/// values; any other value is kept as-is so it survives a read/write cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessLevelValue(pub i64);

impl AccessLevelValue {
    pub const NO_PERMISSIONS: AccessLevelValue = AccessLevelValue(0);
    pub const MINIMAL_ACCESS: AccessLevelValue = AccessLevelValue(5);
    pub const GUEST: AccessLevelValue = AccessLevelValue(10);
    pub const REPORTER: AccessLevelValue = AccessLevelValue(20);
    pub const DEVELOPER: AccessLevelValue = AccessLevelValue(30);
    pub const MAINTAINER: AccessLevelValue = AccessLevelValue(40);
    pub const OWNER: AccessLevelValue = AccessLevelValue(50);
    pub const ADMIN: AccessLevelValue = AccessLevelValue(60);

    /// Returns the GitLab role name for the documented levels.
    pub fn role_name(&self) -> Option<&'static str> {
        match self.0 {
            0 => Some("No access"),
            5 => Some("Minimal access"),
            10 => Some("Guest"),
            20 => Some("Reporter"),
            30 => Some("Developer"),
            40 => Some("Maintainer"),
            50 => Some("Owner"),
            60 => Some("Admin"),
            _ => None,
        }
    }
}

impl fmt::Display for AccessLevelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.role_name() {
            Some(name) => write!(f, "{} ({})", name, self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

impl From<i64> for AccessLevelValue {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// One access grant on a protected branch as reported by GitLab.
///
/// GitLab sends `null` for the user and group of role-based grants; those decode
/// to `0`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchAccessDescription {
    /// Slot identifier assigned by GitLab
    pub id: i64,

    /// Minimum role required by this grant
    #[serde(default)]
    pub access_level: AccessLevelValue,

    /// Human readable grantee, e.g. "Maintainers" or "Deploy key"
    #[serde(default, deserialize_with = "null_as_default")]
    pub access_level_description: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub group_id: i64,
}

/// A protected branch policy.
///
/// # Examples
///
/// ```rust
/// use gitlab_client::models::ProtectedBranch;
///
/// let json = r#"{
///     "id": 1,
///     "name": "main",
///     "push_access_levels": [
///         {"id": 1, "access_level": 40, "access_level_description": "Maintainers", "user_id": null, "group_id": null}
///     ],
///     "merge_access_levels": [],
///     "allow_force_push": false,
///     "code_owner_approval_required": true
/// }"#;
///
/// let branch: ProtectedBranch = serde_json::from_str(json).unwrap();
/// assert_eq!(branch.push_access_levels[0].access_level.0, 40);
/// assert!(branch.unprotect_access_levels.is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedBranch {
    pub id: i64,

    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub push_access_levels: Vec<BranchAccessDescription>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub merge_access_levels: Vec<BranchAccessDescription>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub unprotect_access_levels: Vec<BranchAccessDescription>,

    #[serde(default)]
    pub allow_force_push: bool,

    #[serde(default)]
    pub code_owner_approval_required: bool,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
