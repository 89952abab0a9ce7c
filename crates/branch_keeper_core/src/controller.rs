//! Convergence controller for protected branches.
//!
//! [`Connector`] turns a managed resource into an [`External`] bound to the GitLab
//! client named by the resource's provider configuration. [`External`] implements
//! Observe, Create, Update and Delete on top of the normalizer, payload generator
//! and equality oracle.

use async_trait::async_trait;
use gitlab_client::{create_token_client, ProtectedBranchClient};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::comparison::is_protected_branch_up_to_date;
use crate::errors::{CoreResult, Error};
use crate::managed::{
    Condition, ExternalClient, ExternalConnecter, ExternalCreation, ExternalObservation,
    ExternalUpdate, Managed,
};
use crate::normalize::late_initialize;
use crate::payload::{
    generate_protect_repository_branches_options, generate_update_protected_branch_options,
};
use crate::types::ProtectedBranch;

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;

/// Connection details for one GitLab instance.
#[derive(Clone)]
pub struct ClientConfig {
    /// API root, e.g. `https://gitlab.com/api/v4`.
    pub base_url: String,
    pub token: SecretString,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Builds a client from connection details.
pub type ClientFactory = Arc<
    dyn Fn(&ClientConfig) -> Result<Arc<dyn ProtectedBranchClient>, gitlab_client::Error>
        + Send
        + Sync,
>;

/// Produces [`External`] clients for protected branch resources.
pub struct Connector {
    configs: HashMap<String, ClientConfig>,
    new_client_fn: ClientFactory,
}

impl Connector {
    /// Creates a connector that talks to GitLab over HTTP.
    ///
    /// `configs` maps provider configuration names to connection details.
    pub fn new(configs: HashMap<String, ClientConfig>) -> Self {
        Self::with_client_factory(configs, Arc::new(new_gitlab_client))
    }

    /// Creates a connector that builds clients with `new_client_fn`.
    pub fn with_client_factory(
        configs: HashMap<String, ClientConfig>,
        new_client_fn: ClientFactory,
    ) -> Self {
        Self {
            configs,
            new_client_fn,
        }
    }
}

fn new_gitlab_client(
    config: &ClientConfig,
) -> Result<Arc<dyn ProtectedBranchClient>, gitlab_client::Error> {
    let client = create_token_client(&config.base_url, config.token.expose_secret())?;
    Ok(Arc::new(client))
}

#[async_trait]
impl ExternalConnecter for Connector {
    #[instrument(skip(self, mg), fields(name = %mg.name()))]
    async fn connect(&self, mg: &dyn Managed) -> CoreResult<Box<dyn ExternalClient>> {
        if mg.as_any().downcast_ref::<ProtectedBranch>().is_none() {
            return Err(Error::NotProtectedBranch);
        }

        let config_name = mg.provider_config_name();
        let config = self.configs.get(config_name).ok_or_else(|| {
            warn!(provider_config = config_name, "Provider config not found");
            Error::ProviderConfigNotFound(config_name.to_string())
        })?;

        let client = (self.new_client_fn)(config).map_err(Error::Connect)?;
        debug!(
            provider_config = config_name,
            base_url = %config.base_url,
            "Connected to GitLab"
        );
        Ok(Box::new(External::new(client)))
    }
}

/// Observes and converges one protected branch through a GitLab client.
pub struct External {
    client: Arc<dyn ProtectedBranchClient>,
}

impl External {
    pub fn new(client: Arc<dyn ProtectedBranchClient>) -> Self {
        Self { client }
    }
}

fn protected_branch(mg: &mut dyn Managed) -> CoreResult<&mut ProtectedBranch> {
    mg.as_any_mut()
        .downcast_mut::<ProtectedBranch>()
        .ok_or(Error::NotProtectedBranch)
}

#[async_trait]
impl ExternalClient for External {
    /// Reads the remote policy, late-initializes unset desired fields and
    /// reports whether an update is needed.
    ///
    /// A branch that is not protected yields a default observation, not an error.
    #[instrument(skip(self, mg), fields(name = %mg.name()))]
    async fn observe(&self, mg: &mut dyn Managed) -> CoreResult<ExternalObservation> {
        let cr = protected_branch(mg)?;
        let project_id = cr
            .spec
            .for_provider
            .project_id
            .ok_or(Error::ProjectIdMissing)?;

        let observed = match self
            .client
            .get_protected_branch(project_id, &cr.spec.for_provider.name)
            .await
        {
            Ok(observed) => observed,
            Err(e) if e.is_not_found() => {
                debug!(project_id, "Protected branch does not exist");
                return Ok(ExternalObservation::default());
            }
            Err(e) => return Err(Error::GetFailed(e)),
        };

        let current = cr.spec.for_provider.clone();
        late_initialize(&mut cr.spec.for_provider, &observed);

        cr.status.set_conditions(&[Condition::available()]);

        let observation = ExternalObservation {
            resource_exists: true,
            resource_up_to_date: is_protected_branch_up_to_date(
                Some(&cr.spec.for_provider),
                &observed,
            ),
            resource_late_initialized: current != cr.spec.for_provider,
        };
        debug!(
            project_id,
            up_to_date = observation.resource_up_to_date,
            late_initialized = observation.resource_late_initialized,
            "Observed protected branch"
        );
        Ok(observation)
    }

    #[instrument(skip(self, mg), fields(name = %mg.name()))]
    async fn create(&self, mg: &mut dyn Managed) -> CoreResult<ExternalCreation> {
        let cr = protected_branch(mg)?;
        let project_id = cr
            .spec
            .for_provider
            .project_id
            .ok_or(Error::ProjectIdMissing)?;

        cr.status.set_conditions(&[Condition::creating()]);

        let options = generate_protect_repository_branches_options(&cr.spec.for_provider);
        let rsp = self
            .client
            .protect_repository_branches(project_id, &options)
            .await
            .map_err(Error::CreateFailed)?;

        cr.spec.for_provider.id = Some(rsp.id);
        info!(project_id, id = rsp.id, "Created protected branch");

        Ok(ExternalCreation {
            external_id: Some(rsp.id),
        })
    }

    /// Sends the full desired policy, addressed by branch name.
    #[instrument(skip(self, mg), fields(name = %mg.name()))]
    async fn update(&self, mg: &mut dyn Managed) -> CoreResult<ExternalUpdate> {
        let cr = protected_branch(mg)?;
        let project_id = cr
            .spec
            .for_provider
            .project_id
            .ok_or(Error::ProjectIdMissing)?;

        let options = generate_update_protected_branch_options(&cr.spec.for_provider);
        self.client
            .update_protected_branch(project_id, &cr.spec.for_provider.name, &options)
            .await
            .map_err(Error::UpdateFailed)?;

        info!(project_id, "Updated protected branch");
        Ok(ExternalUpdate {})
    }

    #[instrument(skip(self, mg), fields(name = %mg.name()))]
    async fn delete(&self, mg: &mut dyn Managed) -> CoreResult<()> {
        let cr = protected_branch(mg)?;
        let project_id = cr
            .spec
            .for_provider
            .project_id
            .ok_or(Error::ProjectIdMissing)?;

        cr.status.set_conditions(&[Condition::deleting()]);

        self.client
            .unprotect_repository_branches(project_id, &cr.spec.for_provider.name)
            .await
            .map_err(Error::DeleteFailed)
    }
}
