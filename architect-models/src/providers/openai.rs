//! OpenAI-compatible provider (Groq, xAI, DeepSeek and self-hosted gateways).
//!
//! All of these expose `GET /models` and `POST /chat/completions` with
//! bearer authentication; only the base endpoint differs.

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

// ────────────────────────────────────────────────────────────────────────────
// Chat Completions API Types
// ────────────────────────────────────────────────────────────────────────────

/// Response from `GET /models`.
#[derive(Debug, Deserialize)]
pub struct ModelList {
    pub data: Vec<ListedModel>,
}

#[derive(Debug, Deserialize)]
pub struct ListedModel {
    pub id: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

/// Plain string for text-only requests, typed parts once images are involved.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(String),
    Parts(Vec<MessagePart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MessagePart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

/// Response from `POST /chat/completions`.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: AssistantMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Text of the first choice, or why there is none.
    pub fn into_text(self) -> Result<String, String> {
        let Some(choice) = self.choices.into_iter().next() else {
            return Err("response contained no choices".to_string());
        };
        match choice.message.content {
            Some(text) if !text.is_empty() => Ok(text),
            _ => {
                let reason = choice.finish_reason.unwrap_or_else(|| "unknown".into());
                Err(format!("response contained no text (finish reason: {reason})"))
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// OpenAiCompatibleProvider
// ────────────────────────────────────────────────────────────────────────────

/// Provider for any backend speaking the OpenAI Chat Completions dialect.
pub struct OpenAiCompatibleProvider {
    descriptor: ProviderDescriptor,
    transport: Arc<dyn Transport>,
}

impl OpenAiCompatibleProvider {
    pub fn new(descriptor: ProviderDescriptor, transport: Arc<dyn Transport>) -> Self {
        Self {
            descriptor,
            transport,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.descriptor.base_endpoint)
    }

    fn authorized(request: HttpRequest, credential: &Credential) -> HttpRequest {
        request.header(
            "Authorization",
            format!("Bearer {}", credential.key().expose_secret()),
        )
    }

    fn build_body(request: &ChatRequest) -> serde_json::Value {
        let content = if request.has_images() {
            MessageContent::Parts(
                request
                    .parts
                    .iter()
                    .map(|part| match part {
                        ContentPart::Text { text } => MessagePart::Text { text },
                        ContentPart::Image { .. } => MessagePart::ImageUrl {
                            image_url: ImageUrl {
                                url: part.data_url().unwrap_or_default(),
                            },
                        },
                    })
                    .collect(),
            )
        } else {
            MessageContent::Text(request.joined_text())
        };

        let body = ChatCompletionRequest {
            model: &request.model,
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
        };
        serde_json::to_value(body).unwrap_or_default()
    }
}

#[async_trait]
impl ModelProvider for OpenAiCompatibleProvider {
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

        let request = Self::authorized(HttpRequest::get(self.url("models")), credential);
        let body = round_trip(self.transport.as_ref(), self.id(), request).await?;
        let list: ModelList = parse_body(self.id(), &body)?;
        debug!(provider = self.id(), count = list.data.len(), "listed models");

        Ok(super::describe_models(
            &self.descriptor,
            list.data.into_iter().map(|m| m.id),
        ))
    }

    async fn generate(&self, credential: &Credential, request: ChatRequest) -> GenerationResult {
        let http = Self::authorized(
            HttpRequest::post(self.url("chat/completions"), Self::build_body(&request)),
            credential,
        );

        let body = round_trip(self.transport.as_ref(), self.id(), http).await?;
        let response: ChatCompletionResponse = parse_body(self.id(), &body)?;

        response
            .into_text()
            .map_err(|reason| failure::unexpected_body(self.id(), reason))
    }
}
