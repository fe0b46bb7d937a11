//! Error types for the storage and portrait seams
//!
//! Storage errors never reach the user: the gateway logs them and falls back.

use thiserror::Error;

/// Key-value backend failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("write rejected for key {key}: {reason}")]
    WriteRejected { key: String, reason: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Portrait data-URI failures
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("not a data URI")]
    NotDataUri,
    #[error("not an image type: {0}")]
    NotImage(String),
    #[error("data URI is not base64 encoded")]
    NotBase64,
    #[error("base64 decode failed: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("unrecognised image extension: {0}")]
    UnknownExtension(String),
}
