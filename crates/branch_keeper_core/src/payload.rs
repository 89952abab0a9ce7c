//! Request payloads built from desired state.
//!
//! GitLab has no "replace the permission list" operation. Grants are upserted by
//! slot identifier and removed by sending `_destroy` for their slot. Slot 1 holds
//! the grant GitLab creates by default, so desired entries occupy slots 2, 3, ...
//! in list order, and every later slot up to [`MAX_PERMISSION_SLOT_ID`] is
//! destroyed so that grants left over from a longer list disappear.

use gitlab_client::{ProtectRepositoryBranchesOptions, UpdateProtectedBranchOptions};
use tracing::debug;

use crate::types::{BranchPermissionOptions, ProtectedBranchParameters};

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;

/// First slot identifier assigned to a desired entry.
pub const FIRST_PERMISSION_SLOT_ID: i64 = 2;

/// Last slot identifier that is destroyed when it is not used.
///
/// Taken from the request examples in the GitLab protected branches documentation.
pub const MAX_PERMISSION_SLOT_ID: i64 = 99;

/// Builds the payload that protects a branch.
pub fn generate_protect_repository_branches_options(
    p: &ProtectedBranchParameters,
) -> ProtectRepositoryBranchesOptions {
    ProtectRepositoryBranchesOptions {
        name: p.name.clone(),
        allow_force_push: p.allow_force_push,
        allowed_to_push: generate_branch_permission_options(p.allowed_to_push.as_deref()),
        allowed_to_merge: generate_branch_permission_options(p.allowed_to_merge.as_deref()),
        allowed_to_unprotect: generate_branch_permission_options(
            p.allowed_to_unprotect.as_deref(),
        ),
        code_owner_approval_required: p.code_owner_approval_required,
    }
}

/// Builds the payload that updates a protected branch.
pub fn generate_update_protected_branch_options(
    p: &ProtectedBranchParameters,
) -> UpdateProtectedBranchOptions {
    UpdateProtectedBranchOptions {
        name: p.name.clone(),
        allow_force_push: p.allow_force_push,
        allowed_to_push: generate_branch_permission_options(p.allowed_to_push.as_deref()),
        allowed_to_merge: generate_branch_permission_options(p.allowed_to_merge.as_deref()),
        allowed_to_unprotect: generate_branch_permission_options(
            p.allowed_to_unprotect.as_deref(),
        ),
        code_owner_approval_required: p.code_owner_approval_required,
    }
}

/// Renders one permission category.
///
/// An absent or empty list renders as an empty list. Otherwise the entries get
/// ascending slots from [`FIRST_PERMISSION_SLOT_ID`], followed by a destroy entry for
/// every remaining slot up to and including [`MAX_PERMISSION_SLOT_ID`].
pub fn generate_branch_permission_options(
    permissions: Option<&[BranchPermissionOptions]>,
) -> Vec<gitlab_client::BranchPermissionOptions> {
    let permissions = permissions.unwrap_or_default();
    if permissions.is_empty() {
        return Vec::new();
    }

    let mut options: Vec<gitlab_client::BranchPermissionOptions> = permissions
        .iter()
        .zip(FIRST_PERMISSION_SLOT_ID..)
        .map(|(permission, id)| permission.to_wire(id))
        .collect();

    let next_free = FIRST_PERMISSION_SLOT_ID + permissions.len() as i64;
    options.extend(
        (next_free..=MAX_PERMISSION_SLOT_ID).map(gitlab_client::BranchPermissionOptions::destroy),
    );

    debug!(
        entries = permissions.len(),
        destroyed = options.len() - permissions.len(),
        "Rendered permission list"
    );
    options
}
