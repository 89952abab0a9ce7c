//! Crate for interacting with the GitLab REST API.
//!
//! This crate provides a client for making authenticated requests to the GitLab
//! protected branches API, authenticating with a personal, project or group
//! access token.

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument};
use url::Url;

pub mod errors;
pub use errors::Error;

pub mod models;
pub use models::{AccessLevelValue, BranchAccessDescription, ProtectedBranch};

pub mod protected_branch;
pub use protected_branch::{
    BranchPermissionOptions, ProtectRepositoryBranchesOptions, UpdateProtectedBranchOptions,
};

// Reference the tests module in the separate file
#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

const USER_AGENT: &str = concat!("branch-keeper/", env!("CARGO_PKG_VERSION"));

/// Trait for protected branch operations.
///
/// Each method maps onto one call of the GitLab protected branches API. A branch
/// that is not protected is reported as [`Error::NotFound`].
#[async_trait]
pub trait ProtectedBranchClient: Send + Sync {
    /// Fetches the protection policy for `branch` in the given project.
    async fn get_protected_branch(
        &self,
        project_id: i64,
        branch: &str,
    ) -> Result<ProtectedBranch, Error>;

    /// Protects a branch (or wildcard) in the given project.
    async fn protect_repository_branches(
        &self,
        project_id: i64,
        options: &ProtectRepositoryBranchesOptions,
    ) -> Result<ProtectedBranch, Error>;

    /// Updates the protection policy of an already protected branch.
    ///
    /// The branch is addressed by its current name; the slot identifiers inside
    /// the permission lists decide which grants are replaced or destroyed.
    async fn update_protected_branch(
        &self,
        project_id: i64,
        branch: &str,
        options: &UpdateProtectedBranchOptions,
    ) -> Result<ProtectedBranch, Error>;

    /// Removes the protection from a branch.
    async fn unprotect_repository_branches(&self, project_id: i64, branch: &str)
        -> Result<(), Error>;
}

/// A client for the GitLab REST API, authenticated with an access token.
#[derive(Debug)]
pub struct GitLabClient {
    client: reqwest::Client,
    base_url: Url,
    token: SecretString,
}

impl GitLabClient {
    /// Creates a new `GitLabClient` for the API rooted at `base_url`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The API root, e.g. `https://gitlab.com/api/v4`.
    /// * `token` - The access token sent in the `PRIVATE-TOKEN` header.
    ///
    /// # Errors
    /// Returns an `Error::InvalidUrl` if the URL cannot carry a path and
    /// `Error::AuthError` if the HTTP client cannot be built.
    pub fn new(base_url: Url, token: SecretString) -> Result<Self, Error> {
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(base_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                error!(error = %e, "Failed to build HTTP client");
                Error::AuthError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Returns the API root this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn protected_branches_url(&self, project_id: i64, branch: Option<&str>) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Error::InvalidUrl(self.base_url.to_string()))?;
            segments
                .pop_if_empty()
                .push("projects")
                .push(&project_id.to_string())
                .push("protected_branches");
            // A single pushed segment percent-encodes '/' so wildcards like
            // "release/*" stay one path component.
            if let Some(branch) = branch {
                segments.push(branch);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl ProtectedBranchClient for GitLabClient {
    #[instrument(skip(self))]
    async fn get_protected_branch(
        &self,
        project_id: i64,
        branch: &str,
    ) -> Result<ProtectedBranch, Error> {
        let url = self.protected_branches_url(project_id, Some(branch))?;
        debug!(url = %url, "Fetching protected branch");

        let response = self
            .client
            .get(url)
            .header("PRIVATE-TOKEN", self.token.expose_secret())
            .send()
            .await?;

        parse_response(response, "Failed to get protected branch").await
    }

    #[instrument(skip(self, options), fields(branch = %options.name))]
    async fn protect_repository_branches(
        &self,
        project_id: i64,
        options: &ProtectRepositoryBranchesOptions,
    ) -> Result<ProtectedBranch, Error> {
        let url = self.protected_branches_url(project_id, None)?;

        let response = self
            .client
            .post(url)
            .header("PRIVATE-TOKEN", self.token.expose_secret())
            .json(options)
            .send()
            .await?;

        let branch: ProtectedBranch =
            parse_response(response, "Failed to protect repository branch").await?;
        info!(id = branch.id, "Protected branch created");
        Ok(branch)
    }

    #[instrument(skip(self, options))]
    async fn update_protected_branch(
        &self,
        project_id: i64,
        branch: &str,
        options: &UpdateProtectedBranchOptions,
    ) -> Result<ProtectedBranch, Error> {
        let url = self.protected_branches_url(project_id, Some(branch))?;

        let response = self
            .client
            .patch(url)
            .header("PRIVATE-TOKEN", self.token.expose_secret())
            .json(options)
            .send()
            .await?;

        let updated: ProtectedBranch =
            parse_response(response, "Failed to update protected branch").await?;
        info!(id = updated.id, "Protected branch updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn unprotect_repository_branches(
        &self,
        project_id: i64,
        branch: &str,
    ) -> Result<(), Error> {
        let url = self.protected_branches_url(project_id, Some(branch))?;

        let response = self
            .client
            .delete(url)
            .header("PRIVATE-TOKEN", self.token.expose_secret())
            .send()
            .await?;

        check_status(response, "Failed to unprotect repository branch").await?;
        info!("Protected branch removed");
        Ok(())
    }
}

/// Creates a `GitLabClient` from a base URL string and an access token.
///
/// # Example
///
/// ```rust,no_run
/// use gitlab_client::{create_token_client, ProtectedBranchClient};
///
/// # async fn example() -> Result<(), gitlab_client::Error> {
/// let client = create_token_client("https://gitlab.com/api/v4", "glpat-xxxxxxxx")?;
/// let branch = client.get_protected_branch(42, "main").await?;
/// println!("Force push allowed: {}", branch.allow_force_push);
/// # Ok(())
/// # }
/// ```
#[instrument(skip(token))]
pub fn create_token_client(base_url: &str, token: &str) -> Result<GitLabClient, Error> {
    let url = Url::parse(base_url).map_err(|e| {
        error!(base_url = base_url, error = %e, "Failed to parse GitLab API URL");
        Error::InvalidUrl(format!("{}: {}", base_url, e))
    })?;

    GitLabClient::new(url, SecretString::from(token.to_string()))
}

async fn parse_response<T: DeserializeOwned>(response: Response, message: &str) -> Result<T, Error> {
    let response = check_status(response, message).await?;
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        error!(error = %e, "{}. Response body could not be parsed", message);
        Error::Deserialization(e)
    })
}

async fn check_status(response: Response, message: &str) -> Result<Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let error = match status {
        StatusCode::NOT_FOUND => Error::NotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::AuthError(extract_error_message(&body))
        }
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimitExceeded,
        _ => Error::ApiError {
            status: status.as_u16(),
            message: extract_error_message(&body),
        },
    };

    log_gitlab_error(message, status, &error);
    Err(error)
}

/// Pulls the human readable part out of a GitLab error body.
///
/// GitLab uses `{"message": "..."}`, `{"message": {"field": ["..."]}}` and
/// `{"error": "..."}` depending on the endpoint.
fn extract_error_message(body: &str) -> String {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return body.trim().to_string(),
    };

    match value.get("message").or_else(|| value.get("error")) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => body.trim().to_string(),
    }
}

fn log_gitlab_error(message: &str, status: StatusCode, e: &Error) {
    match e {
        // Absence is an expected answer for lookups
        Error::NotFound => debug!(status = status.as_u16(), "{}. Resource not found", message),
        Error::RateLimitExceeded => error!(
            status = status.as_u16(),
            "{}. GitLab rate limit exceeded", message
        ),
        _ => error!(
            status = status.as_u16(),
            error_message = e.to_string(),
            "{}. Received an error from GitLab",
            message
        ),
    }
}
