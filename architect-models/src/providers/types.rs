//! Provider-neutral request content handed to [`ModelProvider::generate`].
//!
//! [`ModelProvider::generate`]: super::ModelProvider::generate

/// One block of user content, already prepared for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    /// Text content.
    Text { text: String },
    /// Image content, base64 encoded in its canonical format.
    Image { media_type: String, base64: String },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(media_type: impl Into<String>, base64: impl Into<String>) -> Self {
        Self::Image {
            media_type: media_type.into(),
            base64: base64.into(),
        }
    }

    /// The `data:` URL form used by OpenAI-compatible APIs.
    pub fn data_url(&self) -> Option<String> {
        match self {
            ContentPart::Image { media_type, base64 } => {
                Some(format!("data:{media_type};base64,{base64}"))
            }
            ContentPart::Text { .. } => None,
        }
    }
}

/// A single-turn generation request: the model and the ordered user parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub model: String,
    pub parts: Vec<ContentPart>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, parts: Vec<ContentPart>) -> Self {
        Self {
            model: model.into(),
            parts,
        }
    }

    pub fn has_images(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, ContentPart::Image { .. }))
    }

    /// All text parts joined by blank lines.
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
