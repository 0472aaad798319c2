//! Image normalization and content preparation.
//!
//! Every image is re-encoded to a single canonical format before it is sent:
//! JPEG, in RGB. Provider encoders reject or mangle alpha channels, so
//! transparency is dropped first.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use tracing::debug;

use crate::Result;
use crate::error::{ErrorKind, ProviderError};
use crate::providers::ContentPart;
use crate::types::Attachment;

/// MIME type of every image sent to a provider.
pub const CANONICAL_IMAGE_MIME: &str = "image/jpeg";

/// JPEG quality used for re-encoding.
pub const JPEG_QUALITY: u8 = 85;

/// Decode an image in any supported format and re-encode it as RGB JPEG.
pub fn normalize_image(data: &[u8]) -> Result<Vec<u8>> {
    let img = image::load_from_memory(data)?;
    if img.color().has_alpha() {
        debug!(color = ?img.color(), "dropping alpha channel before encoding");
    }
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buf = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)?;
    Ok(buf.into_inner())
}

/// Base64 (standard alphabet, padded) as required by both provider APIs.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Turn a prompt and its attachments into ordered content parts.
///
/// The prompt comes first, followed by the attachments in their original
/// order. Images are normalized and base64 encoded.
pub fn prepare_parts(
    prompt: &str,
    attachments: &[Attachment],
) -> std::result::Result<Vec<ContentPart>, ProviderError> {
    let mut parts = Vec::with_capacity(attachments.len() + 1);
    parts.push(ContentPart::text(prompt));

    for (index, attachment) in attachments.iter().enumerate() {
        match attachment {
            Attachment::TextBlock(text) => parts.push(ContentPart::text(text.as_str())),
            Attachment::Image { data, mime_type } => {
                let jpeg = normalize_image(data).map_err(|e| {
                    ProviderError::new(
                        ErrorKind::InvalidAttachment,
                        format!("attachment {} ({mime_type}): {e}", index + 1),
                    )
                })?;
                parts.push(ContentPart::image(CANONICAL_IMAGE_MIME, encode_base64(&jpeg)));
            }
        }
    }

    Ok(parts)
}
