//! Google Gemini provider.
//!
//! Talks to the Generative Language REST API. The key travels in the
//! `x-goog-api-key` header rather than the query string so it never shows
//! up in URLs or logs.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatRequest, ContentPart, ModelProvider, failure, parse_body, round_trip};
use crate::auth::Credential;
use crate::error::{GenerationResult, ProviderError};
use crate::registry::ProviderDescriptor;
use crate::transport::{HttpRequest, Transport};
use crate::ModelDescriptor;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Generation method a model must advertise to be listed.
const GENERATE_METHOD: &str = "generateContent";

// ────────────────────────────────────────────────────────────────────────────
// Gemini API Types
// ────────────────────────────────────────────────────────────────────────────

/// Response from `GET /models`.
#[derive(Debug, Deserialize)]
pub struct GeminiModelList {
    #[serde(default)]
    pub models: Vec<GeminiModel>,
}

/// One entry of the Gemini catalog.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiModel {
    /// Resource name, e.g. `models/gemini-1.5-flash`.
    pub name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl GeminiModel {
    /// The model id without the `models/` resource prefix.
    pub fn id(&self) -> &str {
        strip_resource_prefix(&self.name)
    }

    pub fn can_generate(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == GENERATE_METHOD)
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart<'a> {
    Text {
        text: &'a str,
    },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

/// Response from `POST /models/{id}:generateContent`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenate the text parts of the first candidate.
    ///
    /// Returns an explanation instead when the response carries no text,
    /// which happens when a safety filter blocks the prompt or the answer.
    pub fn into_text(self) -> Result<String, String> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(format!("prompt blocked: {reason}"));
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err("response contained no candidates".to_string());
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "UNKNOWN".into());
            Err(format!("response contained no text (finish reason: {reason})"))
        } else {
            Ok(text)
        }
    }
}

fn strip_resource_prefix(name: &str) -> &str {
    name.strip_prefix("models/").unwrap_or(name)
}

// ────────────────────────────────────────────────────────────────────────────
// GeminiProvider
// ────────────────────────────────────────────────────────────────────────────

/// Google Gemini provider.
pub struct GeminiProvider {
    descriptor: ProviderDescriptor,
    transport: Arc<dyn Transport>,
}

impl GeminiProvider {
    pub fn new(descriptor: ProviderDescriptor, transport: Arc<dyn Transport>) -> Self {
        Self {
            descriptor,
            transport,
        }
    }

    fn models_url(&self) -> String {
        format!("{}/models?pageSize=1000", self.descriptor.base_endpoint)
    }

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:{GENERATE_METHOD}",
            self.descriptor.base_endpoint,
            strip_resource_prefix(model)
        )
    }

    fn build_body(request: &ChatRequest) -> serde_json::Value {
        let parts = request
            .parts
            .iter()
            .map(|part| match part {
                ContentPart::Text { text } => GeminiPart::Text { text },
                ContentPart::Image { media_type, base64 } => GeminiPart::InlineData {
                    inline_data: InlineData {
                        mime_type: media_type,
                        data: base64,
                    },
                },
            })
            .collect();

        let body = GenerateContentRequest {
            contents: vec![GeminiContent { role: "user", parts }],
        };
        // Serializing borrowed strings into a Value cannot fail.
        serde_json::to_value(body).unwrap_or_default()
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn list_models(
        &self,
        credential: &Credential,
    ) -> Result<Vec<ModelDescriptor>, ProviderError> {
        if let Some(models) = super::static_catalog(&self.descriptor) {
            return Ok(models);
        }

        let request = HttpRequest::get(self.models_url())
            .header(API_KEY_HEADER, credential.key().expose_secret());
        let body = round_trip(self.transport.as_ref(), self.id(), request).await?;
        let list: GeminiModelList = parse_body(self.id(), &body)?;

        let ids: Vec<String> = list
            .models
            .iter()
            .filter(|m| m.can_generate())
            .map(|m| m.id().to_string())
            .collect();
        debug!(provider = self.id(), count = ids.len(), "listed models");

        Ok(super::describe_models(&self.descriptor, ids))
    }

    async fn generate(&self, credential: &Credential, request: ChatRequest) -> GenerationResult {
        let http = HttpRequest::post(self.generate_url(&request.model), Self::build_body(&request))
            .header(API_KEY_HEADER, credential.key().expose_secret());

        let body = round_trip(self.transport.as_ref(), self.id(), http).await?;
        let response: GenerateContentResponse = parse_body(self.id(), &body)?;

        response
            .into_text()
            .map_err(|reason| failure::unexpected_body(self.id(), reason))
    }
}
