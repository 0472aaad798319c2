//! CLI subcommands.

pub mod config;
pub mod generate;
pub mod models;
pub mod providers;

use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use architect_models::auth::env_vars_for_provider;
use architect_models::transport::ReqwestTransport;
use architect_models::{Credential, CredentialStore, ProviderRegistry};

use crate::config::{ArchitectConfig, ConfigLoader};

/// Keyring service name for stored API keys.
pub const KEYRING_SERVICE: &str = "architect";

/// Overrides [`KEYRING_SERVICE`], so isolated runs never see the user's keys.
pub const KEYRING_SERVICE_ENV: &str = "ARCHITECT_KEYRING_SERVICE";

/// Everything a command needs: merged config, registry and credentials.
pub struct Session {
    pub config: ArchitectConfig,
    pub registry: Arc<ProviderRegistry>,
    pub credentials: CredentialStore,
}

impl Session {
    /// Load config from disk and build the provider registry from it.
    pub fn load() -> Result<Self> {
        let config = ConfigLoader::load()?;
        Self::from_config(config)
    }

    pub fn from_config(config: ArchitectConfig) -> Result<Self> {
        let transport = Arc::new(
            ReqwestTransport::with_timeout(config.timeout())
                .context("failed to build HTTP client")?,
        );
        let mut registry = ProviderRegistry::new();
        for descriptor in config.descriptors() {
            registry.register_descriptor(descriptor, transport.clone());
        }

        Ok(Self {
            config,
            registry: Arc::new(registry),
            credentials: CredentialStore::new(keyring_service()).with_env_fallback(),
        })
    }

    /// Credential for a registered provider, with a setup hint when missing.
    pub fn credential(&self, provider: &str) -> Result<Credential> {
        self.registry.get(provider)?;
        match self.credentials.credential(provider) {
            Ok(credential) => Ok(credential),
            Err(architect_models::Error::CredentialsNotFound(_)) => {
                bail!("No API key for '{provider}'. {}", setup_hint(provider))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn keyring_service() -> String {
    std::env::var(KEYRING_SERVICE_ENV)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| KEYRING_SERVICE.to_string())
}

/// How to configure a key for `provider`.
pub fn setup_hint(provider: &str) -> String {
    let command = format!("Run `architect models auth {provider}`");
    match env_vars_for_provider(provider) {
        [] => format!("{command}."),
        vars => format!("{command} or set {}.", vars.join(" / ")),
    }
}

/// The environment variables that can stand in for a stored key.
pub fn env_hint(provider: &str) -> Option<String> {
    match env_vars_for_provider(provider) {
        [] => None,
        vars => Some(format!("You can also set {} instead.", vars.join(" / "))),
    }
}
