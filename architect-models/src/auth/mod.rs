//! Credentials and API key storage.
//!
//! A [`Credential`] pairs a provider id with an [`ApiKey`]. Keys can be kept
//! in the system keyring through [`CredentialStore`], with environment
//! variables as a read-only fallback for CI and headless machines.
//!
//! # Example
//!
//! ```ignore
//! use architect_models::auth::CredentialStore;
//!
//! let store = CredentialStore::new("architect").with_env_fallback();
//!
//! store.set("groq", "gsk_...")?;
//! let credential = store.credential("groq")?;
//! ```

use std::collections::{HashMap, HashSet};
use std::env;
use std::sync::{Arc, Mutex, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::{Error, Result};

/// A secure API key that prevents accidental logging.
///
/// The key is wrapped in `SecretString` which:
/// - Implements `Debug` as `"[REDACTED]"`
/// - Zeroizes memory on drop
/// - Requires explicit `.expose_secret()` to access the value
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    /// Create a new API key from a string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::from(key.into()))
    }

    /// Expose the secret key value.
    ///
    /// Use sparingly - only when actually sending to an API.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }

    /// Whether the key is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.expose_secret().trim().is_empty()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey([REDACTED])")
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A provider id, its secret key and an optional user-chosen label.
///
/// Validity is only established by a successful call against the provider.
#[derive(Debug, Clone)]
pub struct Credential {
    provider: String,
    key: ApiKey,
    label: Option<String>,
}

impl Credential {
    pub fn new(provider: impl Into<String>, key: impl Into<ApiKey>) -> Self {
        Self {
            provider: provider.into(),
            key: key.into(),
            label: None,
        }
    }

    /// Attach a display label (e.g. "work account").
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn key(&self) -> &ApiKey {
        &self.key
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// Environment variables checked for each provider, in priority order.
const ENV_VARS: &[(&str, &[&str])] = &[
    ("gemini", &["GEMINI_API_KEY", "GOOGLE_API_KEY"]),
    ("groq", &["GROQ_API_KEY"]),
    ("xai", &["XAI_API_KEY"]),
    ("deepseek", &["DEEPSEEK_API_KEY"]),
];

/// Get the environment variable names for a provider.
pub fn env_vars_for_provider(provider: &str) -> &'static [&'static str] {
    ENV_VARS
        .iter()
        .find(|(p, _)| *p == provider)
        .map(|(_, vars)| *vars)
        .unwrap_or(&[])
}

/// Backing storage for secrets, keyed by service and account.
pub trait SecretStore: Send + Sync {
    /// Read a secret, `Ok(None)` when nothing is stored.
    fn get(&self, service: &str, account: &str) -> Result<Option<String>>;

    fn set(&self, service: &str, account: &str, secret: &str) -> Result<()>;

    /// Remove a secret, `Ok(false)` when nothing was stored.
    fn delete(&self, service: &str, account: &str) -> Result<bool>;
}

/// The platform keychain: macOS Keychain, Windows Credential Manager or
/// the Linux kernel keyring.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemKeyring;

impl SystemKeyring {
    fn entry(service: &str, account: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(service, account).map_err(|e| Error::Keyring(e.to_string()))
    }
}

impl SecretStore for SystemKeyring {
    fn get(&self, service: &str, account: &str) -> Result<Option<String>> {
        match Self::entry(service, account)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(Error::Keyring(e.to_string())),
        }
    }

    fn set(&self, service: &str, account: &str, secret: &str) -> Result<()> {
        Self::entry(service, account)?
            .set_password(secret)
            .map_err(|e| Error::Keyring(e.to_string()))
    }

    fn delete(&self, service: &str, account: &str) -> Result<bool> {
        match Self::entry(service, account)?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(Error::Keyring(e.to_string())),
        }
    }
}

/// Process-local secret storage. Nothing outlives the store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    secrets: Mutex<HashMap<(String, String), String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemoryStore {
    fn get(&self, service: &str, account: &str) -> Result<Option<String>> {
        let secrets = self.secrets.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(secrets
            .get(&(service.to_string(), account.to_string()))
            .cloned())
    }

    fn set(&self, service: &str, account: &str, secret: &str) -> Result<()> {
        let mut secrets = self.secrets.lock().unwrap_or_else(PoisonError::into_inner);
        secrets.insert(
            (service.to_string(), account.to_string()),
            secret.to_string(),
        );
        Ok(())
    }

    fn delete(&self, service: &str, account: &str) -> Result<bool> {
        let mut secrets = self.secrets.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(secrets
            .remove(&(service.to_string(), account.to_string()))
            .is_some())
    }
}

/// Secure credential storage with system keyring and environment fallback.
///
/// # Storage Priority
///
/// When retrieving credentials:
/// 1. System keyring (if available)
/// 2. Environment variables (if `env_fallback` is enabled)
///
/// When storing credentials:
/// - Always uses the secret store
/// - Environment variables are read-only
pub struct CredentialStore {
    service_name: String,
    secrets: Arc<dyn SecretStore>,
    env_fallback: bool,
}

impl CredentialStore {
    /// Create a credential store backed by the system keyring.
    ///
    /// # Arguments
    ///
    /// * `service_name` - Service identifier for keyring (e.g., "architect")
    pub fn new(service_name: impl Into<String>) -> Self {
        Self::with_store(service_name, Arc::new(SystemKeyring))
    }

    /// Create a credential store over any [`SecretStore`].
    pub fn with_store(service_name: impl Into<String>, secrets: Arc<dyn SecretStore>) -> Self {
        Self {
            service_name: service_name.into(),
            secrets,
            env_fallback: false,
        }
    }

    /// Enable environment variable fallback.
    pub fn with_env_fallback(mut self) -> Self {
        self.env_fallback = true;
        self
    }

    /// Get an API key for a provider.
    ///
    /// # Errors
    ///
    /// Returns `Error::CredentialsNotFound` if no credentials are found.
    pub fn get(&self, provider: &str) -> Result<ApiKey> {
        if let Some(key) = self.get_from_keyring(provider) {
            debug!(provider, "retrieved API key from keyring");
            return Ok(key);
        }

        if self.env_fallback
            && let Some(key) = self.get_from_env(provider)
        {
            debug!(provider, "retrieved API key from environment");
            return Ok(key);
        }

        Err(Error::CredentialsNotFound(provider.to_string()))
    }

    /// Load a ready-to-use [`Credential`] for a provider.
    pub fn credential(&self, provider: &str) -> Result<Credential> {
        self.get(provider).map(|key| Credential::new(provider, key))
    }

    /// Store an API key for a provider in the system keyring.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidApiKey` for an empty key and `Error::Keyring`
    /// if the keyring operation fails.
    pub fn set(&self, provider: &str, key: &str) -> Result<()> {
        if key.trim().is_empty() {
            return Err(Error::InvalidApiKey);
        }
        self.secrets.set(&self.service_name, provider, key)?;
        debug!(provider, "stored API key in keyring");
        Ok(())
    }

    /// Delete an API key from the system keyring.
    ///
    /// # Errors
    ///
    /// Returns `Error::Keyring` if the keyring operation fails.
    /// Returns `Error::CredentialsNotFound` if no credentials exist.
    pub fn delete(&self, provider: &str) -> Result<()> {
        if !self.secrets.delete(&self.service_name, provider)? {
            return Err(Error::CredentialsNotFound(provider.to_string()));
        }
        debug!(provider, "deleted API key from keyring");
        Ok(())
    }

    /// Check if credentials exist for a provider.
    pub fn has(&self, provider: &str) -> bool {
        self.get(provider).is_ok()
    }

    /// List all known providers with stored credentials, sorted.
    pub fn list_providers(&self) -> Vec<String> {
        let mut providers = HashSet::new();

        for (provider, _) in ENV_VARS {
            if self.has_in_keyring(provider) {
                providers.insert(provider.to_string());
            }
        }

        if self.env_fallback {
            for (provider, _) in ENV_VARS {
                if self.has_in_env(provider) {
                    providers.insert(provider.to_string());
                }
            }
        }

        let mut result: Vec<_> = providers.into_iter().collect();
        result.sort();
        result
    }

    /// Check if a credential exists in the keyring (not env).
    pub fn has_in_keyring(&self, provider: &str) -> bool {
        self.get_from_keyring(provider).is_some()
    }

    /// Check if a credential exists in environment variables.
    pub fn has_in_env(&self, provider: &str) -> bool {
        self.get_from_env(provider).is_some()
    }

    /// Get the source of a credential (keyring or env).
    pub fn credential_source(&self, provider: &str) -> Option<CredentialSource> {
        if self.has_in_keyring(provider) {
            Some(CredentialSource::Keyring)
        } else if self.env_fallback && self.has_in_env(provider) {
            Some(CredentialSource::Environment)
        } else {
            None
        }
    }

    fn get_from_keyring(&self, provider: &str) -> Option<ApiKey> {
        match self.secrets.get(&self.service_name, provider) {
            Ok(secret) => secret.map(ApiKey::new),
            Err(e) => {
                debug!(provider, error = %e, "keyring lookup failed");
                None
            }
        }
    }

    fn get_from_env(&self, provider: &str) -> Option<ApiKey> {
        env_vars_for_provider(provider)
            .iter()
            .filter_map(|var| env::var(var).ok())
            .find(|value| !value.trim().is_empty())
            .map(ApiKey::new)
    }
}

/// Source of a stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Stored in system keyring.
    Keyring,
    /// From environment variable.
    Environment,
}
