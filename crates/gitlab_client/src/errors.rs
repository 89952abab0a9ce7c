//! Error types for GitLab client operations.
//!
//! This module defines the error types that can occur when interacting with the GitLab REST API
//! through the gitlab_client crate.

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur during GitLab client operations.
///
/// ## Examples
///
/// ```rust,ignore
/// use gitlab_client::Error;
///
/// match client.get_protected_branch(42, "main").await {
///     Ok(branch) => println!("Branch is protected: {}", branch.name),
///     Err(Error::NotFound) => println!("Branch is not protected"),
///     Err(err) => eprintln!("Other error: {}", err),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The API answered with a non-success status that has no more specific variant.
    ///
    /// The message is taken from the `message` (or `error`) field of the GitLab error
    /// body when present, otherwise it is the raw body.
    #[error("API request failed with status {status}: {message}")]
    ApiError { status: u16, message: String },

    /// Authentication or client initialization failure.
    ///
    /// This error occurs when:
    /// - The access token is invalid, expired or revoked
    /// - The token lacks the `api` scope for the project
    /// - The HTTP client could not be built
    #[error("Failed to authenticate or initialize GitLab client: {0}")]
    AuthError(String),

    /// Error deserializing the response from GitLab.
    #[error("Failed to deserialize GitLab response: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// Transport level failure (connection refused, timeout, TLS, ...).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured base URL cannot be used to address the API.
    #[error("Invalid GitLab API URL: {0}")]
    InvalidUrl(String),

    /// The requested resource was not found.
    ///
    /// GitLab answers 404 both for missing projects and for branches that are not
    /// protected, so callers treat this as "does not exist".
    #[error("Resource not found")]
    NotFound,

    /// GitLab API rate limit has been exceeded.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

impl Error {
    /// Returns `true` if the error means the addressed resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}
