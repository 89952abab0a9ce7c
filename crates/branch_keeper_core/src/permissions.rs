//! Conversion between desired permission entries and the GitLab wire shapes.

use gitlab_client::BranchAccessDescription;

use crate::types::BranchPermissionOptions;

#[cfg(test)]
#[path = "permissions_tests.rs"]
mod tests;

/// Description GitLab gives to grants held by a deploy key.
///
/// GitLab reports the deploy key identifier in the `user_id` field of such grants.
pub const DEPLOY_KEY_DESCRIPTION: &str = "Deploy key";

/// Decodes one observed grant into the desired-state shape.
pub fn access_level_to_permission(access: &BranchAccessDescription) -> BranchPermissionOptions {
    let mut permission = BranchPermissionOptions {
        group_id: Some(access.group_id),
        access_level: Some(access.access_level),
        ..Default::default()
    };

    if access.access_level_description == DEPLOY_KEY_DESCRIPTION {
        permission.deploy_key_id = Some(access.user_id);
    } else {
        permission.user_id = Some(access.user_id);
    }
    permission
}

/// Decodes observed grants ordered by their slot identifier.
///
/// The sort is stable so grants sharing an identifier keep their reported order.
/// The input is left untouched.
pub fn access_levels_to_permissions(
    access_levels: &[BranchAccessDescription],
) -> Vec<BranchPermissionOptions> {
    let mut sorted: Vec<&BranchAccessDescription> = access_levels.iter().collect();
    sorted.sort_by_key(|a| a.id);
    sorted.into_iter().map(access_level_to_permission).collect()
}

impl BranchPermissionOptions {
    /// Renders this entry as a wire entry occupying slot `id`.
    pub fn to_wire(&self, id: i64) -> gitlab_client::BranchPermissionOptions {
        gitlab_client::BranchPermissionOptions {
            id: Some(id),
            user_id: self.user_id,
            group_id: self.group_id,
            deploy_key_id: self.deploy_key_id,
            access_level: self.access_level,
            destroy: None,
        }
    }

    /// Compares the grant itself, ignoring references and selectors.
    pub fn same_grant(&self, other: &BranchPermissionOptions) -> bool {
        self.user_id == other.user_id
            && self.group_id == other.group_id
            && self.deploy_key_id == other.deploy_key_id
            && self.access_level == other.access_level
    }
}
