//! Provider registry.
//!
//! The registry maps provider ids to their [`ProviderDescriptor`] and the
//! [`ModelProvider`] implementation serving them. Lookups are pure: nothing
//! here touches the network. Adding a backend means registering one more
//! entry; existing call sites do not change.

mod descriptor;

use std::sync::Arc;

use tracing::debug;

pub use descriptor::{
    ApiShape, AuthKind, Listing, ProviderDescriptor, VisionClassifier, builtin_descriptor,
    builtin_descriptors,
};

use crate::error::ProviderError;
use crate::providers::{GeminiProvider, ModelProvider, OpenAiCompatibleProvider};
use crate::transport::Transport;

/// Registered providers, kept in registration order.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn ModelProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in provider.
    pub fn with_builtin(transport: Arc<dyn Transport>) -> Self {
        let mut registry = Self::new();
        for descriptor in builtin_descriptors() {
            registry.register_descriptor(descriptor, transport.clone());
        }
        registry
    }

    /// Register an implementation, replacing any provider with the same id.
    pub fn register(&mut self, provider: Arc<dyn ModelProvider>) {
        let id = provider.id().to_string();
        if let Some(slot) = self.providers.iter_mut().find(|p| p.id() == id) {
            debug!(provider = %id, "replacing registered provider");
            *slot = provider;
        } else {
            debug!(provider = %id, "registered provider");
            self.providers.push(provider);
        }
    }

    /// Register a descriptor, picking the implementation for its API shape.
    pub fn register_descriptor(
        &mut self,
        descriptor: ProviderDescriptor,
        transport: Arc<dyn Transport>,
    ) {
        self.register(build_provider(descriptor, transport));
    }

    /// Look up a provider's descriptor.
    ///
    /// # Errors
    ///
    /// Returns an `UnknownProvider` error if nothing is registered under `id`.
    pub fn get(&self, id: &str) -> Result<&ProviderDescriptor, ProviderError> {
        self.find(id).map(|p| p.descriptor())
    }

    /// Look up a provider's implementation.
    pub fn provider(&self, id: &str) -> Result<Arc<dyn ModelProvider>, ProviderError> {
        self.find(id).cloned()
    }

    /// All descriptors in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ProviderDescriptor> {
        self.providers.iter().map(|p| p.descriptor())
    }

    /// All registered ids in registration order.
    pub fn ids(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    fn find(&self, id: &str) -> Result<&Arc<dyn ModelProvider>, ProviderError> {
        self.providers
            .iter()
            .find(|p| p.id() == id)
            .ok_or_else(|| ProviderError::unknown_provider(id))
    }
}

/// Build the implementation matching a descriptor's API shape.
pub fn build_provider(
    descriptor: ProviderDescriptor,
    transport: Arc<dyn Transport>,
) -> Arc<dyn ModelProvider> {
    match descriptor.api {
        ApiShape::Gemini => Arc::new(GeminiProvider::new(descriptor, transport)),
        ApiShape::OpenAiCompatible => Arc::new(OpenAiCompatibleProvider::new(descriptor, transport)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::transport::testing::FakeTransport;

    fn registry() -> ProviderRegistry {
        ProviderRegistry::with_builtin(Arc::new(FakeTransport::responding(200, "{}")))
    }

    #[test]
    fn builtin_registry_has_all_providers() {
        let registry = registry();
        assert_eq!(registry.ids(), vec!["gemini", "groq", "xai", "deepseek"]);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn get_returns_descriptor() {
        let registry = registry();
        let xai = registry.get("xai").unwrap();
        assert_eq!(xai.base_endpoint, "https://api.x.ai/v1");
        assert_eq!(xai.api, ApiShape::OpenAiCompatible);
        assert_eq!(xai.auth_kind, AuthKind::ApiKey);
    }

    #[test]
    fn unknown_provider_is_typed_error() {
        let registry = registry();
        let err = registry.get("openai").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownProvider);
        assert!(registry.provider("").is_err());
    }

    #[test]
    fn register_replaces_same_id_in_place() {
        let mut registry = registry();
        let fake = Arc::new(FakeTransport::responding(200, "{}"));
        let moved = builtin_descriptor("groq")
            .unwrap()
            .with_base_endpoint("http://127.0.0.1:4000/openai/v1");
        registry.register_descriptor(moved, fake);

        assert_eq!(registry.len(), 4);
        assert_eq!(registry.ids()[1], "groq");
        assert_eq!(
            registry.get("groq").unwrap().base_endpoint,
            "http://127.0.0.1:4000/openai/v1"
        );
    }

    #[test]
    fn custom_descriptor_is_appended() {
        let mut registry = registry();
        let fake = Arc::new(FakeTransport::responding(200, "{}"));
        registry.register_descriptor(
            ProviderDescriptor::openai_compatible("local", "Local vLLM", "http://localhost:8000/v1"),
            fake,
        );
        assert_eq!(registry.ids().last(), Some(&"local"));
        assert_eq!(registry.descriptors().count(), 5);
    }

    #[test]
    fn empty_registry() {
        let registry = ProviderRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(
            registry.get("gemini").unwrap_err().kind,
            ErrorKind::UnknownProvider
        );
    }
}
