//! Core types shared by the resolver and the dispatcher.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::auth::Credential;

/// Fully qualified model identifier in format `provider:model`.
///
/// # Examples
///
/// ```
/// use architect_models::ModelId;
///
/// let id = ModelId::new("groq", "llama-3.3-70b-versatile");
/// assert_eq!(id.provider(), "groq");
/// assert_eq!(id.model(), "llama-3.3-70b-versatile");
/// assert_eq!(id.to_string(), "groq:llama-3.3-70b-versatile");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    /// Create a new model ID from provider and model name.
    pub fn new(provider: &str, model: &str) -> Self {
        Self(format!("{provider}:{model}"))
    }

    /// Parse a model ID from a string in `provider:model` format.
    ///
    /// Only the first colon separates the provider, so model names that
    /// themselves contain colons survive intact.
    pub fn parse(s: &str) -> Option<Self> {
        match s.split_once(':') {
            Some((provider, model)) if !provider.is_empty() && !model.is_empty() => {
                Some(Self(s.to_string()))
            }
            _ => None,
        }
    }

    /// Get the provider portion of the ID.
    pub fn provider(&self) -> &str {
        self.0.split_once(':').map(|(p, _)| p).unwrap_or("")
    }

    /// Get the model name portion of the ID.
    pub fn model(&self) -> &str {
        self.0.split_once(':').map(|(_, m)| m).unwrap_or("")
    }

    /// Get the full ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kinds of input a model accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capabilities {
    /// Accepts text prompts and produces text.
    pub text: bool,
    /// Accepts image input alongside text.
    pub vision: bool,
}

impl Capabilities {
    /// Capabilities of a text-only model.
    pub fn text_only() -> Self {
        Self {
            text: true,
            vision: false,
        }
    }

    /// Capabilities of a model that reads both text and images.
    pub fn multimodal() -> Self {
        Self {
            text: true,
            vision: true,
        }
    }

    /// Check whether every capability set in `filter` is present here.
    pub fn matches(&self, filter: &Capabilities) -> bool {
        (!filter.text || self.text) && (!filter.vision || self.vision)
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.text {
            parts.push("text");
        }
        if self.vision {
            parts.push("vision");
        }
        if parts.is_empty() {
            f.write_str("-")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

/// A model reported by a provider's live catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Model id exactly as the provider expects it in requests.
    pub id: String,
    pub capabilities: Capabilities,
}

impl ModelDescriptor {
    pub fn new(id: impl Into<String>, capabilities: Capabilities) -> Self {
        Self {
            id: id.into(),
            capabilities,
        }
    }

    /// The provider-qualified identifier for this model.
    pub fn qualified_id(&self, provider: &str) -> ModelId {
        ModelId::new(provider, &self.id)
    }
}

/// A piece of user-supplied material sent along with the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// Extracted document text.
    TextBlock(String),
    /// Raw image bytes and their declared MIME type.
    Image { data: Vec<u8>, mime_type: String },
}

impl Attachment {
    pub fn text(text: impl Into<String>) -> Self {
        Self::TextBlock(text.into())
    }

    pub fn image(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self::Image {
            data,
            mime_type: mime_type.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Attachment::Image { .. })
    }
}

/// Everything needed to run one generation call.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    /// Provider id as registered in the registry.
    pub provider: String,
    pub credential: &'a Credential,
    pub model_id: String,
    pub prompt: String,
    pub attachments: Vec<Attachment>,
}

impl<'a> GenerationRequest<'a> {
    /// Create a text-only request.
    pub fn new(
        credential: &'a Credential,
        model_id: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            provider: credential.provider().to_string(),
            credential,
            model_id: model_id.into(),
            prompt: prompt.into(),
            attachments: Vec::new(),
        }
    }

    /// Target a provider other than the one the credential names.
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    /// Append one attachment, preserving order.
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Append several attachments, preserving order.
    pub fn attachments(mut self, attachments: impl IntoIterator<Item = Attachment>) -> Self {
        self.attachments.extend(attachments);
        self
    }

    pub fn has_images(&self) -> bool {
        self.attachments.iter().any(Attachment::is_image)
    }
}
