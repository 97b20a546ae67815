//! Generated artifacts
//!
//! Artifacts own their bytes exclusively. Dropping one releases the buffer;
//! callers that need the content afterwards persist it with `save_to`.

use chrono::{DateTime, Utc};
use std::path::Path;

use super::media::{InlineMedia, extension_for_mime_type};

/// An image produced by generation or editing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub media: InlineMedia,
}

impl GeneratedImage {
    pub fn new(media: InlineMedia) -> Self {
        Self { media }
    }

    pub fn mime_type(&self) -> &str {
        &self.media.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.media.data
    }

    /// Suggested file extension for this image
    pub fn extension(&self) -> &'static str {
        extension_for_mime_type(&self.media.mime_type)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(path, &self.media.data)
    }
}

/// A downloaded video, the result of a completed generation job
#[derive(Debug)]
pub struct VideoArtifact {
    /// Locator the bytes were fetched from
    pub source_uri: String,
    pub mime_type: String,
    pub downloaded_at: DateTime<Utc>,
    bytes: Vec<u8>,
}

impl VideoArtifact {
    pub fn new(source_uri: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            source_uri: source_uri.into(),
            mime_type: mime_type.into(),
            downloaded_at: Utc::now(),
            bytes,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn extension(&self) -> &'static str {
        extension_for_mime_type(&self.mime_type)
    }

    /// Takes ownership of the raw bytes, consuming the artifact
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(path, &self.bytes)
    }
}
