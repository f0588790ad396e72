//! Image sources and their inline encoding.

use std::fs;
use std::path::Path;

use base64::{Engine, engine::general_purpose::STANDARD};
use image::ImageFormat;
use tracing::debug;

use crate::error::{InvoxError, RequestError};

/// A selected invoice file with its detected media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    name: String,
    mime_type: &'static str,
    bytes: Vec<u8>,
}

/// Base64 payload ready to be sent inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Media type, e.g. `image/png`.
    pub mime_type: String,
    /// Standard base64 of the file contents.
    pub data: String,
}

impl ImageSource {
    /// Read a file from disk.
    pub fn from_path(path: &Path, max_bytes: u64) -> Result<Self, InvoxError> {
        let size = fs::metadata(path)?.len();
        if size > max_bytes {
            return Err(RequestError::TooLarge {
                size,
                limit: max_bytes,
            }
            .into());
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("invoice")
            .to_string();
        let bytes = fs::read(path)?;

        Ok(Self::from_bytes(name, bytes, max_bytes)?)
    }

    /// Build a source from bytes already in memory.
    pub fn from_bytes(
        name: impl Into<String>,
        bytes: Vec<u8>,
        max_bytes: u64,
    ) -> Result<Self, RequestError> {
        let name = name.into();

        if bytes.is_empty() {
            return Err(RequestError::Empty(name));
        }
        if bytes.len() as u64 > max_bytes {
            return Err(RequestError::TooLarge {
                size: bytes.len() as u64,
                limit: max_bytes,
            });
        }

        let mime_type = detect_mime_type(&name, &bytes)
            .ok_or_else(|| RequestError::Unsupported(name.clone()))?;

        debug!("Selected {} ({}, {} bytes)", name, mime_type, bytes.len());

        Ok(Self {
            name,
            mime_type,
            bytes,
        })
    }

    /// File name shown to the user.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Detected media type.
    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    /// Size of the file in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the file has no content. Always false for a constructed source.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Encode the file for inline transport.
    pub fn encode(&self) -> ImagePayload {
        ImagePayload {
            mime_type: self.mime_type.to_string(),
            data: STANDARD.encode(&self.bytes),
        }
    }
}

/// Detect a supported media type from magic bytes, then from the extension.
fn detect_mime_type(name: &str, bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"%PDF-") {
        return Some("application/pdf");
    }

    if let Ok(format) = image::guess_format(bytes) {
        return match format {
            ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP | ImageFormat::Gif => {
                Some(format.to_mime_type())
            }
            _ => None,
        };
    }

    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}
