//! Request dispatch.
//!
//! [`Dispatcher::generate`] turns a provider-neutral [`GenerationRequest`]
//! into exactly one outbound call and normalizes whatever comes back into a
//! [`GenerationResult`]. Requests that cannot succeed are rejected locally,
//! before any network traffic.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{GenerationResult, ProviderError};
use crate::media;
use crate::providers::ChatRequest;
use crate::registry::ProviderRegistry;
use crate::retry::RetryPolicy;
use crate::types::GenerationRequest;

/// Routes generation requests to registered providers.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ProviderRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Run one generation request.
    ///
    /// Local checks, in order: the provider exists, the credential belongs
    /// to it and is not blank, and the model can read images if any are
    /// attached. Only then are attachments prepared and the call made.
    pub async fn generate(&self, request: &GenerationRequest<'_>) -> GenerationResult {
        let provider = self.registry.provider(&request.provider)?;
        check_credential(&request.provider, request)?;

        if request.has_images() {
            let descriptor = provider.descriptor();
            if !descriptor.supports_multimodal {
                return Err(ProviderError::unsupported_capability(format!(
                    "{} does not accept image attachments",
                    descriptor.display_name
                )));
            }
            if !provider.capabilities(&request.model_id).vision {
                return Err(ProviderError::unsupported_capability(format!(
                    "model '{}' on {} cannot read images",
                    request.model_id, descriptor.display_name
                )));
            }
        }

        let parts = media::prepare_parts(&request.prompt, &request.attachments)?;
        debug!(
            provider = %request.provider,
            model = %request.model_id,
            parts = parts.len(),
            "dispatching generation request"
        );

        let result = provider
            .generate(
                request.credential,
                ChatRequest::new(request.model_id.as_str(), parts),
            )
            .await;

        match &result {
            Ok(text) => info!(
                provider = %request.provider,
                model = %request.model_id,
                chars = text.len(),
                "generation succeeded"
            ),
            Err(err) => warn!(
                provider = %request.provider,
                model = %request.model_id,
                kind = %err.kind,
                "generation failed"
            ),
        }
        result
    }

    /// Run a generation request under a retry policy.
    pub async fn generate_with_retry(
        &self,
        request: &GenerationRequest<'_>,
        policy: &RetryPolicy,
    ) -> GenerationResult {
        policy.execute(move |_attempt| self.generate(request)).await
    }
}

fn check_credential(provider: &str, request: &GenerationRequest<'_>) -> Result<(), ProviderError> {
    let credential = request.credential;
    if credential.provider() != provider {
        return Err(ProviderError::authentication(format!(
            "credential is for '{}', not '{provider}'",
            credential.provider()
        )));
    }
    if credential.key().is_blank() {
        return Err(ProviderError::authentication("API key is empty"));
    }
    Ok(())
}
