//! Static descriptions of supported providers.

use serde::{Deserialize, Serialize};

use crate::Capabilities;

/// How a provider authenticates requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthKind {
    /// A single secret API key.
    ApiKey,
}

/// Wire format of a provider's listing and generation endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiShape {
    /// Google Generative Language API (`models/{id}:generateContent`).
    Gemini,
    /// OpenAI Chat Completions (`/models`, `/chat/completions`).
    OpenAiCompatible,
}

/// Where a provider's model catalog comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Listing {
    /// One GET against the provider's listing endpoint.
    Live,
    /// A fixed, curated set of model ids. No network call is made.
    Static(Vec<String>),
}

/// Decides from a model id whether the model accepts images.
///
/// Vendors publish no reliable capability flag, so this is naming policy:
/// matches are case-insensitive substrings, `exclude` wins over `include`,
/// and ids matching neither fall back to `default_vision`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisionClassifier {
    #[serde(default)]
    pub default_vision: bool,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl VisionClassifier {
    /// A classifier that never reports vision.
    pub fn never() -> Self {
        Self::default()
    }

    /// Vision only for ids containing one of `markers`.
    pub fn when_named(markers: &[&str]) -> Self {
        Self {
            default_vision: false,
            include: markers.iter().map(|m| m.to_string()).collect(),
            exclude: Vec::new(),
        }
    }

    /// Vision for every id except those containing one of `markers`.
    pub fn unless_named(markers: &[&str]) -> Self {
        Self {
            default_vision: true,
            include: Vec::new(),
            exclude: markers.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn is_vision(&self, model_id: &str) -> bool {
        let id = model_id.to_lowercase();
        let hit = |markers: &[String]| markers.iter().any(|m| id.contains(&m.to_lowercase()));

        if hit(&self.exclude) {
            false
        } else if hit(&self.include) {
            true
        } else {
            self.default_vision
        }
    }
}

/// Immutable description of one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    /// Stable symbolic name, e.g. "gemini".
    pub id: String,
    pub display_name: String,
    pub auth_kind: AuthKind,
    pub api: ApiShape,
    /// Whether the backend accepts image attachments in-band.
    pub supports_multimodal: bool,
    /// Base URL that endpoint paths are appended to, without trailing slash.
    pub base_endpoint: String,
    pub listing: Listing,
    pub classifier: VisionClassifier,
}

impl ProviderDescriptor {
    /// Describe an OpenAI-compatible backend hosted at `base_endpoint`.
    pub fn openai_compatible(
        id: impl Into<String>,
        display_name: impl Into<String>,
        base_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            auth_kind: AuthKind::ApiKey,
            api: ApiShape::OpenAiCompatible,
            supports_multimodal: false,
            base_endpoint: trim_endpoint(base_endpoint.into()),
            listing: Listing::Live,
            classifier: VisionClassifier::never(),
        }
    }

    /// Point the provider at a different host, e.g. a proxy or test server.
    pub fn with_base_endpoint(mut self, base_endpoint: impl Into<String>) -> Self {
        self.base_endpoint = trim_endpoint(base_endpoint.into());
        self
    }

    pub fn with_classifier(mut self, classifier: VisionClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_multimodal(mut self, supports_multimodal: bool) -> Self {
        self.supports_multimodal = supports_multimodal;
        self
    }

    pub fn with_static_models(mut self, models: Vec<String>) -> Self {
        self.listing = Listing::Static(models);
        self
    }

    /// Capabilities of `model_id` on this provider.
    ///
    /// A provider that is not multimodal never reports vision, whatever
    /// its classifier says.
    pub fn capabilities_for(&self, model_id: &str) -> Capabilities {
        Capabilities {
            text: true,
            vision: self.supports_multimodal && self.classifier.is_vision(model_id),
        }
    }
}

fn trim_endpoint(endpoint: String) -> String {
    endpoint.trim_end_matches('/').to_string()
}

/// Compile-time row of the built-in provider table.
struct BuiltinProvider {
    id: &'static str,
    display_name: &'static str,
    api: ApiShape,
    supports_multimodal: bool,
    base_endpoint: &'static str,
    vision_default: bool,
    vision_include: &'static [&'static str],
    vision_exclude: &'static [&'static str],
}

static BUILTIN_PROVIDERS: &[BuiltinProvider] = &[
    BuiltinProvider {
        id: "gemini",
        display_name: "Google Gemini",
        api: ApiShape::Gemini,
        supports_multimodal: true,
        base_endpoint: "https://generativelanguage.googleapis.com/v1beta",
        vision_default: true,
        vision_include: &[],
        vision_exclude: &["gemini-1.0", "gemma", "embedding", "aqa"],
    },
    BuiltinProvider {
        id: "groq",
        display_name: "Groq (Ultra Fast)",
        api: ApiShape::OpenAiCompatible,
        supports_multimodal: true,
        base_endpoint: "https://api.groq.com/openai/v1",
        vision_default: false,
        vision_include: &["vision", "llama-4"],
        vision_exclude: &[],
    },
    BuiltinProvider {
        id: "xai",
        display_name: "xAI Grok",
        api: ApiShape::OpenAiCompatible,
        supports_multimodal: true,
        base_endpoint: "https://api.x.ai/v1",
        vision_default: false,
        vision_include: &["vision", "grok-4"],
        vision_exclude: &[],
    },
    BuiltinProvider {
        id: "deepseek",
        display_name: "DeepSeek",
        api: ApiShape::OpenAiCompatible,
        supports_multimodal: false,
        base_endpoint: "https://api.deepseek.com",
        vision_default: false,
        vision_include: &[],
        vision_exclude: &[],
    },
];

impl From<&BuiltinProvider> for ProviderDescriptor {
    fn from(row: &BuiltinProvider) -> Self {
        let to_owned = |markers: &[&str]| markers.iter().map(|m| m.to_string()).collect();
        Self {
            id: row.id.to_string(),
            display_name: row.display_name.to_string(),
            auth_kind: AuthKind::ApiKey,
            api: row.api,
            supports_multimodal: row.supports_multimodal,
            base_endpoint: row.base_endpoint.to_string(),
            listing: Listing::Live,
            classifier: VisionClassifier {
                default_vision: row.vision_default,
                include: to_owned(row.vision_include),
                exclude: to_owned(row.vision_exclude),
            },
        }
    }
}

/// Descriptors for every built-in provider, in display order.
pub fn builtin_descriptors() -> Vec<ProviderDescriptor> {
    BUILTIN_PROVIDERS.iter().map(ProviderDescriptor::from).collect()
}

/// Descriptor for one built-in provider.
pub fn builtin_descriptor(id: &str) -> Option<ProviderDescriptor> {
    BUILTIN_PROVIDERS
        .iter()
        .find(|row| row.id == id)
        .map(ProviderDescriptor::from)
}
