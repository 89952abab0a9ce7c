//! Managed resource contract.
//!
//! A managed resource is a desired-state document whose real state lives behind a
//! remote API. The host drives it through an [`ExternalConnecter`], which yields an
//! [`ExternalClient`] exposing Observe, Create, Update and Delete.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;

use crate::CoreResult;

#[cfg(test)]
#[path = "managed_tests.rs"]
mod tests;

/// Capabilities every managed resource exposes to the engine.
///
/// Operations receive resources as `&mut dyn Managed` and downcast to the concrete
/// kind they handle through [`Managed::as_any_mut`].
pub trait Managed: Any + Send + Sync {
    /// Kind name, e.g. `ProtectedBranch`.
    fn kind(&self) -> &'static str;

    /// Name of the resource document.
    fn name(&self) -> &str;

    /// Name of the provider configuration used to reach the remote API.
    fn provider_config_name(&self) -> &str;

    /// Whether the user asked for the resource to be removed.
    fn deletion_requested(&self) -> bool;

    fn conditions(&self) -> &[Condition];

    /// Records conditions, replacing any existing condition of the same type.
    fn set_conditions(&mut self, conditions: &[Condition]);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Condition types reported in a resource status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionType {
    Ready,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionReason {
    Available,
    Creating,
    Deleting,
}

/// A single status condition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    pub status: ConditionStatus,
    pub reason: ConditionReason,
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    /// The external resource exists and is usable.
    pub fn available() -> Self {
        Self::ready(ConditionStatus::True, ConditionReason::Available)
    }

    /// The external resource is being created.
    pub fn creating() -> Self {
        Self::ready(ConditionStatus::False, ConditionReason::Creating)
    }

    /// The external resource is being deleted.
    pub fn deleting() -> Self {
        Self::ready(ConditionStatus::False, ConditionReason::Deleting)
    }

    fn ready(status: ConditionStatus, reason: ConditionReason) -> Self {
        Self {
            condition_type: ConditionType::Ready,
            status,
            reason,
            last_transition_time: Utc::now(),
        }
    }

    /// Compares two conditions ignoring their transition time.
    pub fn equivalent(&self, other: &Condition) -> bool {
        self.condition_type == other.condition_type
            && self.status == other.status
            && self.reason == other.reason
    }
}

/// Observed status of a managed resource.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl ResourceStatus {
    /// Sets the supplied conditions.
    ///
    /// A condition equivalent to the one already recorded for its type is left
    /// untouched so its transition time is kept.
    pub fn set_conditions(&mut self, conditions: &[Condition]) {
        for condition in conditions {
            match self
                .conditions
                .iter_mut()
                .find(|c| c.condition_type == condition.condition_type)
            {
                Some(existing) if existing.equivalent(condition) => {}
                Some(existing) => *existing = condition.clone(),
                None => self.conditions.push(condition.clone()),
            }
        }
    }

    pub fn get_condition(&self, condition_type: ConditionType) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
    }
}

/// Result of an Observe call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExternalObservation {
    /// The external resource exists.
    pub resource_exists: bool,

    /// Desired and observed state agree; no update is needed.
    pub resource_up_to_date: bool,

    /// Observe filled unset desired fields and the host should persist them.
    pub resource_late_initialized: bool,
}

/// Result of a Create call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExternalCreation {
    /// Identifier assigned by the remote side, also written to the resource.
    pub external_id: Option<i64>,
}

/// Result of an Update call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExternalUpdate {}

/// Produces an [`ExternalClient`] for a managed resource.
#[async_trait]
pub trait ExternalConnecter: Send + Sync {
    async fn connect(&self, mg: &dyn Managed) -> CoreResult<Box<dyn ExternalClient>>;
}

/// The four operations that converge an external resource.
///
/// Every operation validates its own inputs; the host may call them in any
/// order and may change the resource between calls.
#[async_trait]
pub trait ExternalClient: Send + Sync {
    async fn observe(&self, mg: &mut dyn Managed) -> CoreResult<ExternalObservation>;

    async fn create(&self, mg: &mut dyn Managed) -> CoreResult<ExternalCreation>;

    async fn update(&self, mg: &mut dyn Managed) -> CoreResult<ExternalUpdate>;

    async fn delete(&self, mg: &mut dyn Managed) -> CoreResult<()>;
}
