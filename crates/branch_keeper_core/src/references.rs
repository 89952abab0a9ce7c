//! Resolution of cross-resource references.
//!
//! A protected branch may name its project, and the groups or deploy keys in its
//! permission entries, through a [`Reference`] or a [`Selector`] instead of a
//! numeric identifier. [`resolve_references`] replaces those with identifiers
//! before the resource is handed to the controller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::errors::{CoreResult, Error};
use crate::types::{BranchPermissionOptions, ProtectedBranch, Reference, Selector};

#[cfg(test)]
#[path = "references_tests.rs"]
mod tests;

/// Kind of resource a reference points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceTarget {
    Project,
    Group,
    DeployKey,
}

impl fmt::Display for ReferenceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceTarget::Project => write!(f, "project"),
            ReferenceTarget::Group => write!(f, "group"),
            ReferenceTarget::DeployKey => write!(f, "deploy key"),
        }
    }
}

/// Input for one resolution.
#[derive(Clone, Copy, Debug)]
pub struct ResolutionRequest<'a> {
    pub current_value: Option<i64>,
    pub reference: Option<&'a Reference>,
    pub selector: Option<&'a Selector>,
    pub target: ReferenceTarget,
}

impl ResolutionRequest<'_> {
    /// Returns `true` when there is nothing to resolve.
    ///
    /// A reference always resolves. A selector only resolves while no value is set.
    pub fn is_noop(&self) -> bool {
        if self.reference.is_some() {
            return false;
        }
        self.selector.is_none() || self.current_value.is_some()
    }
}

/// Outcome of one resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolutionResponse {
    pub resolved_value: Option<i64>,

    /// Reference to the resource that supplied the value. Selectors resolve to
    /// the reference of the first matching resource.
    pub resolved_reference: Option<Reference>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("referenced {target} not found: {name}")]
    ReferenceNotFound {
        target: ReferenceTarget,
        name: String,
    },

    #[error("no {target} matches the selector")]
    NoMatchingSelector { target: ReferenceTarget },
}

/// Looks up identifiers for references and selectors.
#[async_trait]
pub trait ReferenceResolver: Send + Sync {
    async fn resolve(
        &self,
        request: ResolutionRequest<'_>,
    ) -> Result<ResolutionResponse, ResolutionError>;
}

/// Resolves every reference and selector of a protected branch in place.
///
/// The project identifier is resolved first, then the group and deploy key of
/// every entry in the three permission lists. A value that is set without a
/// reference is kept. Errors name the field that failed, e.g.
/// `spec.forProvider.allowedToPush[0].groupId`.
#[instrument(skip(cr, resolver), fields(name = %cr.metadata.name))]
pub async fn resolve_references(
    cr: &mut ProtectedBranch,
    resolver: &dyn ReferenceResolver,
) -> CoreResult<()> {
    let p = &mut cr.spec.for_provider;

    let rsp = resolve_field(
        resolver,
        ResolutionRequest {
            current_value: p.project_id,
            reference: p.project_id_ref.as_ref(),
            selector: p.project_id_selector.as_ref(),
            target: ReferenceTarget::Project,
        },
        "spec.forProvider.projectId",
    )
    .await?;
    if let Some(rsp) = rsp {
        p.project_id = rsp.resolved_value;
        p.project_id_ref = rsp.resolved_reference;
    }

    let lists = [
        ("allowedToPush", &mut p.allowed_to_push),
        ("allowedToMerge", &mut p.allowed_to_merge),
        ("allowedToUnprotect", &mut p.allowed_to_unprotect),
    ];
    for (field, list) in lists {
        if let Some(entries) = list.as_mut() {
            resolve_permission_options(resolver, field, entries).await?;
        }
    }

    Ok(())
}

async fn resolve_permission_options(
    resolver: &dyn ReferenceResolver,
    field: &str,
    entries: &mut [BranchPermissionOptions],
) -> CoreResult<()> {
    for (i, entry) in entries.iter_mut().enumerate() {
        let rsp = resolve_field(
            resolver,
            ResolutionRequest {
                current_value: entry.group_id,
                reference: entry.group_id_ref.as_ref(),
                selector: entry.group_id_selector.as_ref(),
                target: ReferenceTarget::Group,
            },
            &format!("spec.forProvider.{field}[{i}].groupId"),
        )
        .await?;
        if let Some(rsp) = rsp {
            entry.group_id = rsp.resolved_value;
            entry.group_id_ref = rsp.resolved_reference;
        }

        let rsp = resolve_field(
            resolver,
            ResolutionRequest {
                current_value: entry.deploy_key_id,
                reference: entry.deploy_key_id_ref.as_ref(),
                selector: entry.deploy_key_id_selector.as_ref(),
                target: ReferenceTarget::DeployKey,
            },
            &format!("spec.forProvider.{field}[{i}].deployKeyId"),
        )
        .await?;
        if let Some(rsp) = rsp {
            entry.deploy_key_id = rsp.resolved_value;
            entry.deploy_key_id_ref = rsp.resolved_reference;
        }
    }
    Ok(())
}

async fn resolve_field(
    resolver: &dyn ReferenceResolver,
    request: ResolutionRequest<'_>,
    field: &str,
) -> CoreResult<Option<ResolutionResponse>> {
    if request.is_noop() {
        return Ok(None);
    }

    let rsp = resolver
        .resolve(request)
        .await
        .map_err(|source| Error::ReferenceResolution {
            field: field.to_string(),
            source,
        })?;

    debug!(field, resolved = ?rsp.resolved_value, "Resolved reference");
    Ok(Some(rsp))
}

/// A named resource with a known identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedId {
    pub id: i64,

    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// Resolver backed by fixed name to identifier tables.
///
/// Selectors pick the first matching entry in name order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticResolver {
    #[serde(default)]
    pub projects: BTreeMap<String, NamedId>,

    #[serde(default)]
    pub groups: BTreeMap<String, NamedId>,

    #[serde(default)]
    pub deploy_keys: BTreeMap<String, NamedId>,
}

impl StaticResolver {
    fn table(&self, target: ReferenceTarget) -> &BTreeMap<String, NamedId> {
        match target {
            ReferenceTarget::Project => &self.projects,
            ReferenceTarget::Group => &self.groups,
            ReferenceTarget::DeployKey => &self.deploy_keys,
        }
    }
}

#[async_trait]
impl ReferenceResolver for StaticResolver {
    async fn resolve(
        &self,
        request: ResolutionRequest<'_>,
    ) -> Result<ResolutionResponse, ResolutionError> {
        let table = self.table(request.target);

        if let Some(reference) = request.reference {
            let entry =
                table
                    .get(&reference.name)
                    .ok_or_else(|| ResolutionError::ReferenceNotFound {
                        target: request.target,
                        name: reference.name.clone(),
                    })?;
            return Ok(ResolutionResponse {
                resolved_value: Some(entry.id),
                resolved_reference: Some(reference.clone()),
            });
        }

        match request.selector {
            Some(selector) => table
                .iter()
                .find(|(_, entry)| selector.matches(&entry.labels))
                .map(|(name, entry)| ResolutionResponse {
                    resolved_value: Some(entry.id),
                    resolved_reference: Some(Reference { name: name.clone() }),
                })
                .ok_or(ResolutionError::NoMatchingSelector {
                    target: request.target,
                }),
            None => Ok(ResolutionResponse {
                resolved_value: request.current_value,
                resolved_reference: None,
            }),
        }
    }
}
