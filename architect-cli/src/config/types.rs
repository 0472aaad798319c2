use std::collections::BTreeMap;
use std::time::Duration;

use architect_models::registry::{ProviderDescriptor, builtin_descriptors};
use architect_models::{RetryPolicy, VisionClassifier};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default number of generation attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay between rate-limited attempts
pub const DEFAULT_BASE_DELAY_MS: u64 = 2000;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawArchitectConfig {
    #[serde(default)]
    pub dispatch: RawDispatchConfig,

    #[serde(default)]
    pub retry: RawRetryConfig,

    #[serde(default)]
    pub providers: BTreeMap<String, ProviderOverride>,

    #[serde(default)]
    pub custom_providers: Vec<CustomProvider>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawDispatchConfig {
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawRetryConfig {
    pub max_attempts: Option<u32>,
    pub base_delay_ms: Option<u64>,
}

/// Per-provider adjustments to a built-in provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderOverride {
    /// Replacement base endpoint (proxy, gateway or regional host)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_endpoint: Option<String>,

    /// Whether ids matching no marker are vision models
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vision_default: Option<bool>,

    /// Id substrings marking vision models
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vision_include: Option<Vec<String>>,

    /// Id substrings marking text-only models; wins over `vision_include`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vision_exclude: Option<Vec<String>>,
}

impl ProviderOverride {
    /// Overlay `self` on `base`; fields set in `self` win.
    pub fn merged_over(self, base: ProviderOverride) -> ProviderOverride {
        ProviderOverride {
            base_endpoint: self.base_endpoint.or(base.base_endpoint),
            vision_default: self.vision_default.or(base.vision_default),
            vision_include: self.vision_include.or(base.vision_include),
            vision_exclude: self.vision_exclude.or(base.vision_exclude),
        }
    }

    fn apply(&self, mut descriptor: ProviderDescriptor) -> ProviderDescriptor {
        if let Some(endpoint) = &self.base_endpoint {
            descriptor = descriptor.with_base_endpoint(endpoint.as_str());
        }
        if let Some(default_vision) = self.vision_default {
            descriptor.classifier.default_vision = default_vision;
        }
        if let Some(include) = &self.vision_include {
            descriptor.classifier.include = include.clone();
        }
        if let Some(exclude) = &self.vision_exclude {
            descriptor.classifier.exclude = exclude.clone();
        }
        descriptor
    }
}

/// An additional OpenAI-compatible backend declared in config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomProvider {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    pub base_endpoint: String,

    /// Fixed model catalog; when absent the backend's `/models` is queried
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<String>>,

    #[serde(default)]
    pub multimodal: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vision_include: Vec<String>,
}

impl CustomProvider {
    pub fn descriptor(&self) -> ProviderDescriptor {
        let name = self.display_name.clone().unwrap_or_else(|| self.id.clone());
        let mut descriptor =
            ProviderDescriptor::openai_compatible(&self.id, name, &self.base_endpoint)
                .with_multimodal(self.multimodal);
        if !self.vision_include.is_empty() {
            descriptor = descriptor.with_classifier(VisionClassifier {
                default_vision: false,
                include: self.vision_include.clone(),
                exclude: Vec::new(),
            });
        } else if self.multimodal {
            descriptor = descriptor.with_classifier(VisionClassifier::unless_named(&[]));
        }
        if let Some(models) = &self.models {
            descriptor = descriptor.with_static_models(models.clone());
        }
        descriptor
    }
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArchitectConfig {
    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub providers: BTreeMap<String, ProviderOverride>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_providers: Vec<CustomProvider>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Per-request timeout covering connect, send and receive
    pub timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts including the first; 1 disables retries
    pub max_attempts: u32,

    /// Wait after attempt n is n times this
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
        }
    }
}

impl ArchitectConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.base_delay_ms),
        )
    }

    /// Built-in providers with overrides applied, followed by custom ones.
    pub fn descriptors(&self) -> Vec<ProviderDescriptor> {
        let builtins = builtin_descriptors();

        for id in self.providers.keys() {
            if !builtins.iter().any(|d| &d.id == id) {
                warn!(provider = %id, "ignoring override for unknown provider");
            }
        }

        let mut descriptors: Vec<ProviderDescriptor> = builtins
            .into_iter()
            .map(|descriptor| match self.providers.get(&descriptor.id) {
                Some(overrides) => overrides.apply(descriptor),
                None => descriptor,
            })
            .collect();
        descriptors.extend(self.custom_providers.iter().map(CustomProvider::descriptor));
        descriptors
    }
}
