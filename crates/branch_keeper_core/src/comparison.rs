//! Decides whether desired and observed state agree.

use gitlab_client::ProtectedBranch as ObservedBranch;

use crate::normalize::protected_branch_to_parameters;
use crate::types::{BranchPermissionOptions, ProtectedBranchParameters};

#[cfg(test)]
#[path = "comparison_tests.rs"]
mod tests;

/// Returns `true` when `p` matches the observed branch.
///
/// A missing desired state is always up to date. References, selectors and the
/// project identifier are not compared, and an empty permission list equals an
/// absent one. Everything else must match exactly, including the order of
/// permission entries after the observed lists are sorted by slot identifier.
pub fn is_protected_branch_up_to_date(
    p: Option<&ProtectedBranchParameters>,
    g: &ObservedBranch,
) -> bool {
    match p {
        None => true,
        Some(p) => drifted_fields(p, g).is_empty(),
    }
}

/// Lists the desired-state fields that differ from the observed branch.
pub fn drifted_fields(p: &ProtectedBranchParameters, g: &ObservedBranch) -> Vec<&'static str> {
    let observed = protected_branch_to_parameters(g);
    let mut drifted = Vec::new();

    if p.id != observed.id {
        drifted.push("id");
    }
    if p.name != observed.name {
        drifted.push("name");
    }
    if !permissions_equal(p.allowed_to_push.as_deref(), observed.allowed_to_push.as_deref()) {
        drifted.push("allowedToPush");
    }
    if !permissions_equal(p.allowed_to_merge.as_deref(), observed.allowed_to_merge.as_deref()) {
        drifted.push("allowedToMerge");
    }
    if !permissions_equal(
        p.allowed_to_unprotect.as_deref(),
        observed.allowed_to_unprotect.as_deref(),
    ) {
        drifted.push("allowedToUnprotect");
    }
    if p.allow_force_push != observed.allow_force_push {
        drifted.push("allowForcePush");
    }
    if p.code_owner_approval_required != observed.code_owner_approval_required {
        drifted.push("codeOwnerApprovalRequired");
    }

    drifted
}

fn permissions_equal(
    a: Option<&[BranchPermissionOptions]>,
    b: Option<&[BranchPermissionOptions]>,
) -> bool {
    let a = a.unwrap_or_default();
    let b = b.unwrap_or_default();
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_grant(y))
}
