//! Convergence engine for GitLab protected branches.
//!
//! A [`ProtectedBranch`] resource declares the desired protection policy for a
//! branch (or wildcard) in a GitLab project. The engine observes the policy GitLab
//! actually holds, fills unset desired fields from it, decides whether the two
//! agree and sends the create, update or delete call that makes them agree.
//!
//! The pieces, bottom-up:
//!
//! - [`permissions`]: decoding observed grants into permission entries.
//! - [`normalize`]: late initialization and observed-to-desired conversion.
//! - [`payload`]: request payloads, including the slot identifier and `_destroy`
//!   protocol GitLab uses to replace permission lists.
//! - [`comparison`]: the up-to-date check.
//! - [`controller`]: Connect, Observe, Create, Update and Delete.
//! - [`references`]: resolution of project, group and deploy key references.
//! - [`reconciler`]: one Observe-then-act pass.

pub mod comparison;
pub mod controller;
pub mod errors;
pub mod managed;
pub mod normalize;
pub mod payload;
pub mod permissions;
pub mod reconciler;
pub mod references;
pub mod types;

pub use comparison::{drifted_fields, is_protected_branch_up_to_date};
pub use controller::{ClientConfig, ClientFactory, Connector, External};
pub use errors::{CoreResult, Error, ErrorKind};
pub use managed::{
    Condition, ConditionReason, ConditionStatus, ConditionType, ExternalClient,
    ExternalConnecter, ExternalCreation, ExternalObservation, ExternalUpdate, Managed,
    ResourceStatus,
};
pub use normalize::{late_initialize, protected_branch_to_parameters};
pub use payload::{
    generate_branch_permission_options, generate_protect_repository_branches_options,
    generate_update_protected_branch_options, FIRST_PERMISSION_SLOT_ID, MAX_PERMISSION_SLOT_ID,
};
pub use permissions::{access_level_to_permission, access_levels_to_permissions};
pub use reconciler::{ReconcileAction, ReconcileOutcome, Reconciler};
pub use references::{
    resolve_references, NamedId, ReferenceResolver, ReferenceTarget, ResolutionError,
    ResolutionRequest, ResolutionResponse, StaticResolver,
};
pub use types::{
    BranchPermissionOptions, ObjectMeta, ProtectedBranch, ProtectedBranchParameters,
    ProtectedBranchSpec, Reference, Selector,
};
