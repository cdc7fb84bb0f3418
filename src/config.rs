//! Merchant configuration for the FreeKassa API.
//!
//! A [`Configuration`] is built once at startup and shared by reference
//! (`Arc<Configuration>`) with the client and the signing engine. There is no
//! global configuration; to change settings, build a new client.

use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};

use crate::auth::NonceMethod;
use crate::error::FreekassaError;

/// Default prefix for configuration environment variables.
pub const DEFAULT_ENV_PREFIX: &str = "FREEKASSA";

/// Merchant identity, shared secrets and nonce persistence settings.
#[derive(Clone)]
pub struct Configuration {
    /// Merchant (shop) identifier.
    pub merchant_id: u64,
    first_secret: Option<SecretString>,
    second_secret: Option<SecretString>,
    api_key: Option<SecretString>,
    /// How the nonce counter is encoded on disk.
    pub nonce_method: NonceMethod,
    /// Where the nonce counter is stored. `None` uses `./nonce.<ext>`.
    pub nonce_path: Option<PathBuf>,
}

impl Configuration {
    /// Create a configuration builder.
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    /// Load configuration from the default `FREEKASSA_*` environment variables.
    pub fn from_env() -> Result<Self, FreekassaError> {
        Self::from_env_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Load configuration from `<PREFIX>_*` environment variables.
    ///
    /// Reads `MERCHANT_ID` (required), `FIRST_SECRET`, `SECOND_SECRET`,
    /// `API_KEY`, `NONCE_METHOD` (default `txt`) and `NONCE_PATH`.
    pub fn from_env_prefix(prefix: &str) -> Result<Self, FreekassaError> {
        let var = |name: &str| std::env::var(format!("{prefix}_{name}")).ok();

        let merchant_id = var("MERCHANT_ID").ok_or_else(|| {
            FreekassaError::Configuration(format!("{prefix}_MERCHANT_ID is not set"))
        })?;
        let merchant_id = merchant_id.trim().parse::<u64>().map_err(|e| {
            FreekassaError::Configuration(format!("{prefix}_MERCHANT_ID is invalid: {e}"))
        })?;

        let mut builder = Self::builder().merchant_id(merchant_id);
        if let Some(secret) = var("FIRST_SECRET") {
            builder = builder.first_secret(secret);
        }
        if let Some(secret) = var("SECOND_SECRET") {
            builder = builder.second_secret(secret);
        }
        if let Some(key) = var("API_KEY") {
            builder = builder.api_key(key);
        }
        if let Some(method) = var("NONCE_METHOD") {
            builder = builder.nonce_method(method.parse()?);
        }
        if let Some(path) = var("NONCE_PATH") {
            builder = builder.nonce_path(path);
        }
        builder.build()
    }

    /// Secret used to sign payment form URLs.
    pub fn first_secret(&self) -> Result<&str, FreekassaError> {
        expose(&self.first_secret, "first_secret")
    }

    /// Second shop secret, used by the gateway when it notifies the merchant.
    pub fn second_secret(&self) -> Result<&str, FreekassaError> {
        expose(&self.second_secret, "second_secret")
    }

    /// API key used to sign API requests.
    pub fn api_key(&self) -> Result<&str, FreekassaError> {
        expose(&self.api_key, "api_key")
    }

    /// The nonce file path after extension handling.
    pub fn resolved_nonce_path(&self) -> PathBuf {
        self.nonce_method.resolve_path(self.nonce_path.as_deref())
    }
}

fn expose<'a>(secret: &'a Option<SecretString>, name: &str) -> Result<&'a str, FreekassaError> {
    secret
        .as_ref()
        .map(|s| s.expose_secret())
        .ok_or_else(|| FreekassaError::Configuration(format!("{name} is not configured")))
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redacted = |s: &Option<SecretString>| s.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("Configuration")
            .field("merchant_id", &self.merchant_id)
            .field("first_secret", &redacted(&self.first_secret))
            .field("second_secret", &redacted(&self.second_secret))
            .field("api_key", &redacted(&self.api_key))
            .field("nonce_method", &self.nonce_method)
            .field("nonce_path", &self.nonce_path)
            .finish()
    }
}

/// Builder for [`Configuration`].
#[derive(Default)]
pub struct ConfigurationBuilder {
    merchant_id: Option<u64>,
    first_secret: Option<SecretString>,
    second_secret: Option<SecretString>,
    api_key: Option<SecretString>,
    nonce_method: NonceMethod,
    nonce_path: Option<PathBuf>,
}

impl ConfigurationBuilder {
    /// Set the merchant (shop) id.
    pub fn merchant_id(mut self, merchant_id: u64) -> Self {
        self.merchant_id = Some(merchant_id);
        self
    }

    /// Set the form signing secret.
    pub fn first_secret(mut self, secret: impl Into<String>) -> Self {
        self.first_secret = Some(SecretString::from(secret.into()));
        self
    }

    /// Set the second shop secret.
    pub fn second_secret(mut self, secret: impl Into<String>) -> Self {
        self.second_secret = Some(SecretString::from(secret.into()));
        self
    }

    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    /// Set the nonce encoding.
    pub fn nonce_method(mut self, method: NonceMethod) -> Self {
        self.nonce_method = method;
        self
    }

    /// Set the nonce file path.
    pub fn nonce_path(mut self, path: impl AsRef<Path>) -> Self {
        self.nonce_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<Configuration, FreekassaError> {
        let merchant_id = self
            .merchant_id
            .ok_or_else(|| FreekassaError::Configuration("merchant_id is required".to_string()))?;

        Ok(Configuration {
            merchant_id,
            first_secret: self.first_secret,
            second_secret: self.second_secret,
            api_key: self.api_key,
            nonce_method: self.nonce_method,
            nonce_path: self.nonce_path,
        })
    }
}
