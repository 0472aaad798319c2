//! Multi-provider model access for architect.
//!
//! This crate provides:
//! - A provider registry describing every supported backend
//! - Model discovery with per-model capability flags
//! - A dispatcher that turns one request into one provider call
//! - A retry policy for rate-limited calls
//! - Credential management for API keys
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │            Dispatcher / ModelResolver                │
//! └─────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                 ProviderRegistry                     │
//! │  ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────┐ │
//! │  │  Gemini  │  │   Groq   │  │   xAI    │  │  DS  │ │
//! │  └──────────┘  └──────────┘  └──────────┘  └──────┘ │
//! └─────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────┐
//! │          Transport (reqwest in production)           │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use architect_models::{Credential, Dispatcher, GenerationRequest, ProviderRegistry};
//! use architect_models::transport::ReqwestTransport;
//!
//! let registry = ProviderRegistry::with_builtin(Arc::new(ReqwestTransport::new()?));
//! let dispatcher = Dispatcher::new(Arc::new(registry));
//! let credential = Credential::new("gemini", api_key);
//! let request = GenerationRequest::new(&credential, "gemini-1.5-flash", "Summarize: Hello world");
//! let text = dispatcher.generate(&request).await?;
//! ```

mod dispatch;
mod error;
mod export;
mod ingest;
mod media;
mod resolver;
mod retry;
mod types;

pub mod auth;
pub mod providers;
pub mod registry;
pub mod transport;

pub use auth::{
    ApiKey, Credential, CredentialSource, CredentialStore, MemoryStore, SecretStore, SystemKeyring,
};
pub use dispatch::Dispatcher;
pub use error::{Error, ErrorKind, GenerationResult, ProviderError, QuotaKind, Result};
pub use export::{DEFAULT_HEADING, Export};
pub use media::{CANONICAL_IMAGE_MIME, normalize_image};
pub use registry::{ProviderDescriptor, ProviderRegistry, VisionClassifier};
pub use resolver::ModelResolver;
pub use retry::RetryPolicy;
pub use types::{Attachment, Capabilities, GenerationRequest, ModelDescriptor, ModelId};
