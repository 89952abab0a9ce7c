//! The observe, apply and delete commands.
//!
//! Each command reads one protected branch document, resolves its references,
//! runs the convergence engine once and optionally writes the document back so
//! late-initialized fields, the external identifier and conditions are kept.

use std::{fmt, fs, path::Path};

use branch_keeper_core::{
    resolve_references, Connector, ExternalObservation, Managed, ProtectedBranch,
    ReconcileOutcome, Reconciler, ReferenceResolver,
};
use chrono::Utc;
use tracing::{debug, error, info};

use crate::errors::Error;

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Report the state of the branch without changing it.
    Observe,
    /// Create or update the branch protection until it matches.
    Apply,
    /// Remove the branch protection.
    Delete,
}

/// What a command found or did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Report {
    Observed(ExternalObservation),
    Reconciled(ReconcileOutcome),
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Observed(o) => write!(
                f,
                "exists: {}, up to date: {}, late initialized: {}",
                o.resource_exists, o.resource_up_to_date, o.resource_late_initialized
            ),
            Report::Reconciled(o) => {
                write!(f, "{}", o.action)?;
                if o.late_initialized {
                    write!(f, " (late initialized)")?;
                }
                Ok(())
            }
        }
    }
}

/// Reads a protected branch document.
pub fn load_resource(path: &Path) -> Result<ProtectedBranch, Error> {
    debug!("Loading resource from {:?}", path);

    let content = fs::read_to_string(path).map_err(|source| Error::LoadFile {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| Error::ParseResource {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a protected branch document as pretty-printed JSON.
pub fn save_resource(path: &Path, cr: &ProtectedBranch) -> Result<(), Error> {
    let write_error = |source| Error::WriteFile {
        path: path.to_path_buf(),
        source,
    };

    let mut content = serde_json::to_string_pretty(cr).map_err(|e| write_error(e.into()))?;
    content.push('\n');
    fs::write(path, content).map_err(write_error)?;

    info!("Resource saved to {:?}", path);
    Ok(())
}

/// Runs `operation` against the document at `resource_path`.
///
/// `connect` builds the connector once the document is loaded. It receives the
/// provider config the resource names, so only that provider's settings are read.
///
/// With `write` set, the document is rewritten after the engine ran, even when
/// the remote call failed, so conditions set before the failure are kept. If the
/// engine and the write both fail, the engine error is returned and the write
/// error is logged.
pub async fn execute<F>(
    operation: Operation,
    resolver: &dyn ReferenceResolver,
    connect: F,
    resource_path: &Path,
    write: bool,
) -> Result<Report, Error>
where
    F: FnOnce(&str) -> Result<Connector, Error>,
{
    let mut cr = load_resource(resource_path)?;
    resolve_references(&mut cr, resolver).await?;

    let reconciler = Reconciler::new(connect(cr.provider_config_name())?);
    let deletion_timestamp = cr.metadata.deletion_timestamp;

    let result = match operation {
        Operation::Observe => reconciler.observe(&mut cr).await.map(Report::Observed),
        Operation::Apply => reconciler.reconcile(&mut cr).await.map(Report::Reconciled),
        Operation::Delete => {
            cr.metadata.deletion_timestamp = Some(Utc::now());
            let result = reconciler.reconcile(&mut cr).await.map(Report::Reconciled);
            cr.metadata.deletion_timestamp = deletion_timestamp;
            result
        }
    };

    if write {
        if let Err(save_error) = save_resource(resource_path, &cr) {
            match &result {
                Ok(_) => return Err(save_error),
                Err(e) => {
                    error!(
                        error = %save_error,
                        engine_error = %e,
                        "Failed to save resource after engine error"
                    );
                }
            }
        }
    }

    Ok(result?)
}
