//! Image encoding for multimodal requests.

use std::path::Path;

use anyhow::Context;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

/// An image prepared for an inline `data:` URL: sniffed MIME type plus the
/// base64-encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime: String,
    pub data: String,
}

impl EncodedImage {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.data)
    }
}

/// Sniff the image MIME type from file bytes, not the filename.
///
/// Unknown or non-image bytes are labeled `image/jpeg`. Downstream consumers
/// depend on this fallback, so it is kept even when the bytes clearly aren't
/// JPEG.
pub fn sniff_image_mime(data: &[u8]) -> &'static str {
    image::guess_format(data).map(|format| format.to_mime_type()).unwrap_or("image/jpeg")
}

/// Read an image file and encode it for an inline data URL.
pub async fn encode_image(path: &Path) -> anyhow::Result<EncodedImage> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Image not found: {}", path.display()))?;

    Ok(EncodedImage {
        mime: sniff_image_mime(&data).to_string(),
        data: BASE64.encode(&data),
    })
}
