//! A single reconcile pass over one managed resource.

use std::fmt;
use tracing::{info, instrument};

use crate::errors::CoreResult;
use crate::managed::{ExternalConnecter, ExternalObservation, Managed};

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;

/// What a reconcile pass did to the external resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileAction {
    Created,
    Updated,
    Deleted,
    /// The external resource already matched; nothing was sent.
    NoOp,
}

impl fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReconcileAction::Created => "created",
            ReconcileAction::Updated => "updated",
            ReconcileAction::Deleted => "deleted",
            ReconcileAction::NoOp => "unchanged",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub action: ReconcileAction,

    /// Observe filled unset desired fields; the caller should persist the resource.
    pub late_initialized: bool,
}

/// Drives Observe followed by Create, Update or Delete.
///
/// One pass makes at most one write. There are no retries; a failed call is
/// returned to the caller, which decides when to run the next pass.
pub struct Reconciler<C: ExternalConnecter> {
    connecter: C,
}

impl<C: ExternalConnecter> Reconciler<C> {
    pub fn new(connecter: C) -> Self {
        Self { connecter }
    }

    /// Observes the resource without writing anything.
    #[instrument(skip(self, mg), fields(kind = mg.kind(), name = %mg.name()))]
    pub async fn observe(&self, mg: &mut dyn Managed) -> CoreResult<ExternalObservation> {
        let external = self.connecter.connect(mg).await?;
        external.observe(mg).await
    }

    /// Runs one reconcile pass.
    ///
    /// A resource marked for deletion is deleted if it still exists. Otherwise a
    /// missing resource is created and a drifted one is updated.
    #[instrument(skip(self, mg), fields(kind = mg.kind(), name = %mg.name()))]
    pub async fn reconcile(&self, mg: &mut dyn Managed) -> CoreResult<ReconcileOutcome> {
        let external = self.connecter.connect(mg).await?;
        let observation = external.observe(mg).await?;
        let late_initialized = observation.resource_late_initialized;

        let action = if mg.deletion_requested() {
            if observation.resource_exists {
                external.delete(mg).await?;
                ReconcileAction::Deleted
            } else {
                ReconcileAction::NoOp
            }
        } else if !observation.resource_exists {
            external.create(mg).await?;
            ReconcileAction::Created
        } else if !observation.resource_up_to_date {
            external.update(mg).await?;
            ReconcileAction::Updated
        } else {
            ReconcileAction::NoOp
        };

        info!(action = %action, late_initialized, "Reconciled resource");
        Ok(ReconcileOutcome {
            action,
            late_initialized,
        })
    }
}
