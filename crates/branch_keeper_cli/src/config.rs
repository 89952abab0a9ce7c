//! Configuration for the branch-keeper CLI.
//!
//! The configuration is a TOML file naming the GitLab instances resources may
//! refer to, and the projects, groups and deploy keys that references resolve to.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
};

use branch_keeper_core::{ClientConfig, StaticResolver};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::Error;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "branch-keeper.toml";

/// Environment variable holding the token when a provider config names none.
pub const DEFAULT_TOKEN_ENV: &str = "GITLAB_TOKEN";

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Main configuration structure for the branch-keeper CLI.
///
/// # Example TOML Configuration
///
/// ```toml
/// [provider_configs.default]
/// base_url = "https://gitlab.com/api/v4"
/// token_env = "GITLAB_TOKEN"
///
/// [references.projects.website]
/// id = 42
/// labels = { team = "web" }
///
/// [references.groups.platform]
/// id = 7
/// ```
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// GitLab instances, keyed by the name resources use in `providerConfigRef`.
    #[serde(default)]
    pub provider_configs: BTreeMap<String, ProviderConfig>,

    /// Name to identifier tables used to resolve references and selectors.
    #[serde(default)]
    pub references: StaticResolver,
}

/// Connection settings for one GitLab instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API root, e.g. `https://gitlab.com/api/v4`.
    pub base_url: String,

    /// Name of the environment variable holding the access token.
    #[serde(default = "ProviderConfig::default_token_env")]
    pub token_env: String,
}

impl ProviderConfig {
    fn default_token_env() -> String {
        DEFAULT_TOKEN_ENV.to_string()
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file at the specified path.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file does not exist, cannot be read or
    /// contains invalid TOML.
    pub fn load(path: &Path) -> Result<Self, Error> {
        debug!("Loading configuration from {:?}", path);

        if !path.exists() {
            return Err(Error::Config(format!(
                "Configuration file not found: {:?}",
                path
            )));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read configuration file: {}", e)))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse configuration file: {}", e)))?;

        Ok(config)
    }

    /// Builds the client configuration for the provider config named `provider`,
    /// reading its token from the process environment.
    pub fn client_configs_for(&self, provider: &str) -> Result<HashMap<String, ClientConfig>, Error> {
        self.client_configs_for_with(provider, |name| std::env::var(name).ok())
    }

    /// Builds the client configuration for `provider`, reading its token through `lookup`.
    ///
    /// Only the named provider's token is read. An unknown name yields an empty
    /// map, which the connector reports as a missing provider config.
    pub fn client_configs_for_with<F>(
        &self,
        provider: &str,
        lookup: F,
    ) -> Result<HashMap<String, ClientConfig>, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut configs = HashMap::new();
        let Some(settings) = self.provider_configs.get(provider) else {
            return Ok(configs);
        };

        let token = lookup(&settings.token_env)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::MissingToken {
                provider: provider.to_string(),
                variable: settings.token_env.clone(),
            })?;

        configs.insert(
            provider.to_string(),
            ClientConfig {
                base_url: settings.base_url.clone(),
                token: SecretString::from(token),
            },
        );
        Ok(configs)
    }
}
