//! Portrait data URIs
//!
//! Portraits are stored inline in the record as `data:<mime>;base64,<payload>`.
//! Only image MIME types are accepted; there is no size limit.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::ImageError;

/// A decoded data URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// MIME type for a portrait file extension
pub fn mime_for_extension(ext: &str) -> Result<&'static str, ImageError> {
    match ext.to_lowercase().as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "gif" => Ok("image/gif"),
        "webp" => Ok("image/webp"),
        "svg" => Ok("image/svg+xml"),
        "bmp" => Ok("image/bmp"),
        "avif" => Ok("image/avif"),
        other => Err(ImageError::UnknownExtension(other.to_string())),
    }
}

/// Encode image bytes as a base64 data URI
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Split a data URI into MIME type and decoded payload
pub fn decode_data_uri(uri: &str) -> Result<DataUri, ImageError> {
    let rest = uri.strip_prefix("data:").ok_or(ImageError::NotDataUri)?;
    let (header, payload) = rest.split_once(',').ok_or(ImageError::NotDataUri)?;
    let mime = header.strip_suffix(";base64").ok_or(ImageError::NotBase64)?;
    if !mime.starts_with("image/") {
        return Err(ImageError::NotImage(mime.to_string()));
    }
    Ok(DataUri {
        mime: mime.to_string(),
        bytes: STANDARD.decode(payload)?,
    })
}

/// Header-only check used when a file reader hands back a data URI
pub fn is_image_data_uri(uri: &str) -> bool {
    uri.strip_prefix("data:image/")
        .and_then(|rest| rest.split_once(','))
        .is_some_and(|(header, _)| header.ends_with(";base64"))
}
