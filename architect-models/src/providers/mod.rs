//! Model provider trait and implementations.
//!
//! The [`ModelProvider`] trait is the unified interface every backend
//! implements: list the live catalog, and run one generation call. There is
//! one implementation per wire format; each registered provider is an
//! instance configured by its [`ProviderDescriptor`].
//!
//! # Example
//!
//! ```ignore
//! use architect_models::providers::{ChatRequest, ContentPart, ModelProvider};
//!
//! async fn ask(provider: &dyn ModelProvider, credential: &Credential) {
//!     let request = ChatRequest::new("gemini-1.5-flash", vec![ContentPart::text("Hello!")]);
//!     let text = provider.generate(credential, request).await?;
//!     println!("{text}");
//! }
//! ```

mod failure;
mod gemini;
mod openai;
mod types;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

pub use gemini::GeminiProvider;
pub use openai::OpenAiCompatibleProvider;
pub use types::*;

use crate::auth::Credential;
use crate::error::{GenerationResult, ProviderError};
use crate::registry::{Listing, ProviderDescriptor};
use crate::transport::{HttpRequest, Transport};
use crate::{Capabilities, ModelDescriptor};

/// Trait for model providers.
///
/// Implementations never panic on expected failures: every rejected key,
/// rate limit, vanished model or broken connection comes back as a
/// [`ProviderError`] with the matching [`ErrorKind`](crate::ErrorKind).
///
/// # Required Methods
///
/// - [`descriptor`](ModelProvider::descriptor) - Static description of the backend
/// - [`list_models`](ModelProvider::list_models) - Live model catalog
/// - [`generate`](ModelProvider::generate) - One non-streaming generation call
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Static description of this backend.
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Returns the provider id (e.g., "gemini", "groq").
    fn id(&self) -> &str {
        &self.descriptor().id
    }

    /// Capabilities of a model, judged from its id alone.
    fn capabilities(&self, model_id: &str) -> Capabilities {
        self.descriptor().capabilities_for(model_id)
    }

    /// Fetch the provider's model catalog with one network call.
    ///
    /// Providers with a static listing answer without touching the network.
    async fn list_models(
        &self,
        credential: &Credential,
    ) -> Result<Vec<ModelDescriptor>, ProviderError>;

    /// Send one generation request and extract the response text.
    ///
    /// The caller is responsible for having validated capabilities and
    /// prepared the content parts.
    async fn generate(&self, credential: &Credential, request: ChatRequest) -> GenerationResult;
}

/// Annotate model ids with the provider's capabilities.
pub(crate) fn describe_models<I, S>(descriptor: &ProviderDescriptor, ids: I) -> Vec<ModelDescriptor>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ids.into_iter()
        .map(|id| {
            let id = id.into();
            let capabilities = descriptor.capabilities_for(&id);
            ModelDescriptor { id, capabilities }
        })
        .collect()
}

/// The curated catalog of a provider with a static listing, if it has one.
pub(crate) fn static_catalog(descriptor: &ProviderDescriptor) -> Option<Vec<ModelDescriptor>> {
    match &descriptor.listing {
        Listing::Static(ids) => Some(describe_models(descriptor, ids.iter().cloned())),
        Listing::Live => None,
    }
}

/// Send a request and return the body of a successful response.
pub(crate) async fn round_trip(
    transport: &dyn Transport,
    provider: &str,
    request: HttpRequest,
) -> Result<String, ProviderError> {
    let response = transport
        .send(request)
        .await
        .map_err(|e| failure::classify_transport(provider, e))?;

    if !response.is_success() {
        debug!(provider, status = response.status, "provider rejected request");
        return Err(failure::classify_status(
            provider,
            response.status,
            &response.body,
        ));
    }

    Ok(response.body)
}

/// Decode a successful response body.
pub(crate) fn parse_body<T: DeserializeOwned>(provider: &str, body: &str) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|e| failure::unexpected_body(provider, e))
}
