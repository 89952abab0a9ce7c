//! Normalization of observed state and late initialization of desired state.

use gitlab_client::ProtectedBranch as ObservedBranch;

use crate::permissions::access_levels_to_permissions;
use crate::types::{BranchPermissionOptions, ProtectedBranchParameters};

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;

/// Fills unset fields of `p` from the observed branch.
///
/// Only the remote identifier, the two flags and the three permission lists are
/// considered. A field that is already set is never overwritten; a permission
/// list counts as unset when it is absent or empty and is then replaced as a whole.
pub fn late_initialize(p: &mut ProtectedBranchParameters, g: &ObservedBranch) {
    if p.id.is_none() {
        p.id = Some(g.id);
    }

    if p.allow_force_push.is_none() {
        p.allow_force_push = Some(g.allow_force_push);
    }

    late_initialize_permissions(&mut p.allowed_to_push, &g.push_access_levels);
    late_initialize_permissions(&mut p.allowed_to_merge, &g.merge_access_levels);
    late_initialize_permissions(&mut p.allowed_to_unprotect, &g.unprotect_access_levels);

    if p.code_owner_approval_required.is_none() {
        p.code_owner_approval_required = Some(g.code_owner_approval_required);
    }
}

fn late_initialize_permissions(
    field: &mut Option<Vec<BranchPermissionOptions>>,
    observed: &[gitlab_client::BranchAccessDescription],
) {
    if field.as_ref().map_or(true, Vec::is_empty) {
        *field = Some(access_levels_to_permissions(observed));
    }
}

/// Converts an observed branch into the desired-state shape.
///
/// Permission lists are ordered by slot identifier, so the result does not depend
/// on the order GitLab reported the grants in.
pub fn protected_branch_to_parameters(g: &ObservedBranch) -> ProtectedBranchParameters {
    ProtectedBranchParameters {
        id: Some(g.id),
        name: g.name.clone(),
        allowed_to_push: Some(access_levels_to_permissions(&g.push_access_levels)),
        allowed_to_merge: Some(access_levels_to_permissions(&g.merge_access_levels)),
        allowed_to_unprotect: Some(access_levels_to_permissions(&g.unprotect_access_levels)),
        allow_force_push: Some(g.allow_force_push),
        code_owner_approval_required: Some(g.code_owner_approval_required),
        ..Default::default()
    }
}
