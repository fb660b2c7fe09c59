//! Converting a picture on disk into the data URL the identifier accepts.

use crate::{Error, Result};
use base64::Engine as _;
use std::path::Path;

/// Largest image accepted for identification.
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

pub fn detect_image_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, 0x50, 0x4E, 0x47, ..] => "image/png",
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => "image/webp",
        [0x47, 0x49, 0x46, 0x38, ..] => "image/gif",
        _ => {
            tracing::warn!(
                "Unrecognized image format (first 4 bytes: {:02X?}), falling back to image/png",
                &bytes[..bytes.len().min(4)]
            );
            "image/png"
        }
    }
}

/// Encode raw image bytes as `data:<mime>;base64,<payload>`.
pub fn data_url_from_bytes(bytes: &[u8]) -> Result<String> {
    let size = bytes.len() as u64;
    if size > MAX_IMAGE_BYTES {
        return Err(Error::ImageTooLarge { size });
    }
    let mime = detect_image_mime(bytes);
    let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{};base64,{}", mime, payload))
}

/// Read an image file, refusing anything over [`MAX_IMAGE_BYTES`] before
/// loading it.
pub async fn image_data_url(path: &Path) -> Result<String> {
    let size = tokio::fs::metadata(path).await?.len();
    if size > MAX_IMAGE_BYTES {
        return Err(Error::ImageTooLarge { size });
    }
    let bytes = tokio::fs::read(path).await?;
    tracing::debug!("Loaded {} ({} bytes)", path.display(), bytes.len());
    data_url_from_bytes(&bytes)
}
