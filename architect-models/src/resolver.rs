//! Model discovery.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::auth::Credential;
use crate::error::ProviderError;
use crate::registry::ProviderRegistry;
use crate::types::{Capabilities, ModelDescriptor};

/// Lists the models a credential can reach, with their capabilities.
///
/// Each call performs at most one listing request. Failures are returned
/// as typed errors and never retried here.
#[derive(Clone)]
pub struct ModelResolver {
    registry: Arc<ProviderRegistry>,
}

impl ModelResolver {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// List every model available to `credential` on `provider`.
    pub async fn list_models(
        &self,
        provider: &str,
        credential: &Credential,
    ) -> Result<Vec<ModelDescriptor>, ProviderError> {
        let backend = self.registry.provider(provider)?;

        if credential.provider() != provider {
            return Err(ProviderError::authentication(format!(
                "credential is for '{}', not '{provider}'",
                credential.provider()
            )));
        }
        if credential.key().is_blank() {
            return Err(ProviderError::authentication("API key is empty"));
        }

        match backend.list_models(credential).await {
            Ok(models) => {
                debug!(provider, count = models.len(), "resolved models");
                Ok(models)
            }
            Err(err) => {
                warn!(provider, kind = %err.kind, "model listing failed");
                Err(err)
            }
        }
    }

    /// List models that have every capability set in `filter`.
    pub async fn list_models_matching(
        &self,
        provider: &str,
        credential: &Credential,
        filter: &Capabilities,
    ) -> Result<Vec<ModelDescriptor>, ProviderError> {
        let models = self.list_models(provider, credential).await?;
        Ok(models
            .into_iter()
            .filter(|m| m.capabilities.matches(filter))
            .collect())
    }

    /// Capabilities of a model, derived from its id without a network call.
    pub fn capabilities(&self, provider: &str, model_id: &str) -> Result<Capabilities, ProviderError> {
        Ok(self.registry.get(provider)?.capabilities_for(model_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::transport::testing::FakeTransport;

    fn resolver(fake: &Arc<FakeTransport>) -> ModelResolver {
        ModelResolver::new(Arc::new(ProviderRegistry::with_builtin(fake.clone())))
    }

    const GROQ_MODELS: &str = r#"{"object":"list","data":[
        {"id":"llama-3.3-70b-versatile"},
        {"id":"llama-3.2-90b-vision-preview"},
        {"id":"whisper-large-v3"}
    ]}"#;

    #[tokio::test]
    async fn groq_listing_marks_vision_models() {
        let fake = Arc::new(FakeTransport::responding(200, GROQ_MODELS));
        let models = resolver(&fake)
            .list_models("groq", &Credential::new("groq", "gsk-valid"))
            .await
            .unwrap();

        let llama = models
            .iter()
            .find(|m| m.id == "llama-3.3-70b-versatile")
            .unwrap();
        assert_eq!(llama.capabilities, Capabilities::text_only());
        let vision = models
            .iter()
            .find(|m| m.id == "llama-3.2-90b-vision-preview")
            .unwrap();
        assert!(vision.capabilities.vision);
        assert_eq!(fake.call_count(), 1);
    }

    #[tokio::test]
    async fn matching_filters_by_capability() {
        let fake = Arc::new(FakeTransport::responding(200, GROQ_MODELS));
        let models = resolver(&fake)
            .list_models_matching(
                "groq",
                &Credential::new("groq", "gsk-valid"),
                &Capabilities::multimodal(),
            )
            .await
            .unwrap();

        assert_eq!(models.len(), 1);
        assert_eq!(models[0].id, "llama-3.2-90b-vision-preview");
    }

    #[tokio::test]
    async fn every_model_supports_text() {
        let fake = Arc::new(FakeTransport::responding(200, GROQ_MODELS));
        let models = resolver(&fake)
            .list_models("groq", &Credential::new("groq", "gsk-valid"))
            .await
            .unwrap();
        assert!(models.iter().all(|m| m.capabilities.text));
    }

    #[tokio::test]
    async fn revoked_key_is_authentication_error_without_retry() {
        for provider in ["gemini", "groq", "xai", "deepseek"] {
            let fake = Arc::new(FakeTransport::responding(
                401,
                r#"{"error":{"message":"Invalid API Key"}}"#,
            ));
            let err = resolver(&fake)
                .list_models(provider, &Credential::new(provider, "revoked"))
                .await
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::AuthenticationError, "{provider}");
            assert_eq!(fake.call_count(), 1, "{provider}");
        }
    }

    #[tokio::test]
    async fn rate_limited_listing_is_not_retried() {
        let fake = Arc::new(FakeTransport::responding(
            429,
            r#"{"error":{"message":"Rate limit reached"}}"#,
        ));
        let err = resolver(&fake)
            .list_models("xai", &Credential::new("xai", "xai-valid"))
            .await
            .unwrap_err();
        assert!(err.kind.is_transient());
        assert_eq!(fake.call_count(), 1);
    }

    #[tokio::test]
    async fn blank_key_fails_locally() {
        let fake = Arc::new(FakeTransport::responding(200, GROQ_MODELS));
        let err = resolver(&fake)
            .list_models("groq", &Credential::new("groq", ""))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AuthenticationError);
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn unknown_provider_fails_locally() {
        let fake = Arc::new(FakeTransport::responding(200, GROQ_MODELS));
        let err = resolver(&fake)
            .list_models("mistral", &Credential::new("mistral", "k"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownProvider);
        assert_eq!(fake.call_count(), 0);
    }

    #[test]
    fn capabilities_without_network() {
        let fake = Arc::new(FakeTransport::responding(500, ""));
        let resolver = resolver(&fake);
        assert!(resolver.capabilities("xai", "grok-4-0709").unwrap().vision);
        assert!(!resolver.capabilities("deepseek", "deepseek-chat").unwrap().vision);
        assert!(resolver.capabilities("nope", "x").is_err());
        assert_eq!(fake.call_count(), 0);
    }
}
