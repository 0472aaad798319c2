//! Error types for provider access and dispatch.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Outcome of a single generation call: the response text or a typed failure.
pub type GenerationResult = std::result::Result<String, ProviderError>;

/// Whether a quota failure may clear up on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaKind {
    /// Rate limited; the vendor asks the caller to try again later.
    Transient,
    /// Balance or usage allowance is used up; retrying will not help.
    Exhausted,
}

/// Classification of every failure a provider call can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No provider registered under the requested id.
    UnknownProvider,
    /// The credential is missing, malformed, or was rejected by the backend.
    AuthenticationError,
    /// Rate limit or balance exhaustion.
    QuotaExceeded(QuotaKind),
    /// The model was removed or renamed by the vendor.
    UnsupportedModel,
    /// The request needs a capability the chosen model lacks.
    UnsupportedCapability,
    /// An attachment could not be prepared for transmission.
    InvalidAttachment,
    /// The request never reached the backend or its response never arrived.
    NetworkError,
    /// Anything else; the message carries the raw detail.
    UnknownError,
}

impl ErrorKind {
    /// Whether a retry of the same request could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorKind::QuotaExceeded(QuotaKind::Transient))
    }

    /// A short, actionable hint suitable for showing to an end user.
    pub fn hint(&self) -> &'static str {
        match self {
            ErrorKind::UnknownProvider => "this provider is not supported",
            ErrorKind::AuthenticationError => "the API key is invalid or was revoked",
            ErrorKind::QuotaExceeded(QuotaKind::Transient) => "rate limited, try again shortly",
            ErrorKind::QuotaExceeded(QuotaKind::Exhausted) => {
                "quota or account balance exhausted"
            }
            ErrorKind::UnsupportedModel => {
                "this model is no longer served, pick a different one"
            }
            ErrorKind::UnsupportedCapability => {
                "this model cannot read images, pick a vision model"
            }
            ErrorKind::InvalidAttachment => "an attachment could not be read",
            ErrorKind::NetworkError => "could not reach the provider",
            ErrorKind::UnknownError => "the provider returned an unexpected error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::UnknownProvider => "unknown provider",
            ErrorKind::AuthenticationError => "authentication error",
            ErrorKind::QuotaExceeded(QuotaKind::Transient) => "quota exceeded (transient)",
            ErrorKind::QuotaExceeded(QuotaKind::Exhausted) => "quota exceeded (exhausted)",
            ErrorKind::UnsupportedModel => "unsupported model",
            ErrorKind::UnsupportedCapability => "unsupported capability",
            ErrorKind::InvalidAttachment => "invalid attachment",
            ErrorKind::NetworkError => "network error",
            ErrorKind::UnknownError => "unknown error",
        };
        f.write_str(name)
    }
}

/// A typed failure from listing models or generating text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unknown_provider(id: &str) -> Self {
        Self::new(ErrorKind::UnknownProvider, format!("no provider named '{id}'"))
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AuthenticationError, message)
    }

    pub fn unsupported_capability(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedCapability, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkError, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownError, message)
    }
}

/// Errors outside a provider round trip: credentials, files, exports.
#[derive(Debug, Error)]
pub enum Error {
    /// A provider call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Credentials not found for provider.
    #[error("credentials not found for provider: {0}")]
    CredentialsNotFound(String),

    /// Failed to access system keyring.
    #[error("keyring error: {0}")]
    Keyring(String),

    /// The API key was empty.
    #[error("API key cannot be empty")]
    InvalidApiKey,

    /// A file type the ingestion boundary cannot turn into an attachment.
    #[error("unsupported file type for {path}: {mime}")]
    UnsupportedFile { path: String, mime: String },

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Image decoding or encoding failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
