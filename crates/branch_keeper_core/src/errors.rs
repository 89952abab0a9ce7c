//! Error types for the convergence engine.

use thiserror::Error;

use crate::references::ResolutionError;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Result type for convergence operations.
pub type CoreResult<T> = std::result::Result<T, Error>;

/// Errors returned by the convergence engine.
///
/// Remote failures keep the [`gitlab_client::Error`] that caused them as their
/// source. A missing protected branch is not an error, see
/// [`ExternalObservation`](crate::ExternalObservation).
#[derive(Error, Debug)]
pub enum Error {
    /// An operation was invoked with a managed resource of another kind.
    #[error("managed resource is not a protected branch")]
    NotProtectedBranch,

    /// The project the branch belongs to has not been set or resolved.
    #[error("ProjectID is missing")]
    ProjectIdMissing,

    #[error("cannot get protected branch: {0}")]
    GetFailed(#[source] gitlab_client::Error),

    #[error("cannot create protected branch: {0}")]
    CreateFailed(#[source] gitlab_client::Error),

    #[error("cannot update protected branch: {0}")]
    UpdateFailed(#[source] gitlab_client::Error),

    #[error("cannot delete protected branch: {0}")]
    DeleteFailed(#[source] gitlab_client::Error),

    /// No provider configuration exists under the referenced name.
    #[error("cannot find provider config: {0}")]
    ProviderConfigNotFound(String),

    /// The API client could not be built from the provider configuration.
    #[error("cannot create GitLab client: {0}")]
    Connect(#[source] gitlab_client::Error),

    /// A reference or selector could not be turned into an identifier.
    #[error("cannot resolve references: {field}: {source}")]
    ReferenceResolution {
        field: String,
        #[source]
        source: ResolutionError,
    },
}

/// Broad classification of [`Error`] used by callers to decide on retries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Desired state is incomplete; retrying cannot help until it changes.
    InputInvalid,
    /// A remote call failed; the caller may retry later.
    RemoteCallFailed,
    /// The operation was invoked with the wrong kind of resource.
    TypeMismatch,
    /// Provider configuration or reference tables are wrong.
    Configuration,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotProtectedBranch => ErrorKind::TypeMismatch,
            Error::ProjectIdMissing => ErrorKind::InputInvalid,
            Error::GetFailed(_)
            | Error::CreateFailed(_)
            | Error::UpdateFailed(_)
            | Error::DeleteFailed(_) => ErrorKind::RemoteCallFailed,
            Error::ProviderConfigNotFound(_)
            | Error::Connect(_)
            | Error::ReferenceResolution { .. } => ErrorKind::Configuration,
        }
    }

    /// Returns `true` if re-running the same operation later may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::RemoteCallFailed
    }
}
