//! Drop payloads: the data an external draggable source hands to the canvas.
//!
//! Payloads arrive as JSON (the `application/json` drag data of the source
//! panel). They carry no canvas state; a payload only becomes an object once
//! its image has loaded and been placed.

#[cfg(test)]
#[path = "payload_test.rs"]
mod payload_test;

use serde::{Deserialize, Serialize};

use crate::error::PayloadError;

/// Metadata about the file behind a dragged image, when the source has one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    /// Original file name.
    pub name: String,
    /// MIME type, e.g. `"image/png"`.
    #[serde(rename = "type")]
    pub mime: String,
    /// Size in bytes.
    pub size: u64,
}

/// Data describing an image dragged onto the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragPayload {
    /// Source-side identifier of the dragged item.
    pub id: String,
    /// URL the full image is fetched from.
    pub url: String,
    /// Optional preview URL; never used for placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileMeta>,
    /// Milliseconds since the Unix epoch when the drag started.
    #[serde(default)]
    pub timestamp: i64,
}

impl DragPayload {
    /// Parse drag data JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Parse`] when the JSON does not describe a payload.
    pub fn from_json(raw: &str) -> Result<Self, PayloadError> {
        serde_json::from_str(raw).map_err(|e| PayloadError::Parse(e.to_string()))
    }

    /// Check that the payload names a plausible image.
    ///
    /// # Errors
    ///
    /// Fails when the URL is blank, the attached file is not `image/*`, or the
    /// attached file exceeds `max_bytes`.
    pub fn validate(&self, max_bytes: u64) -> Result<(), PayloadError> {
        if self.url.trim().is_empty() {
            return Err(PayloadError::MissingUrl);
        }
        if let Some(file) = &self.file {
            if !file.mime.starts_with("image/") {
                return Err(PayloadError::NotAnImage { mime: file.mime.clone() });
            }
            if file.size > max_bytes {
                return Err(PayloadError::TooLarge { size: file.size, limit: max_bytes });
            }
        }
        Ok(())
    }
}
