//! Media payloads and generation parameters

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Raw media bytes with their MIME type, sent inline with a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineMedia {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl InlineMedia {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Decodes a base64 payload as returned by the API
    pub fn from_base64(mime_type: impl Into<String>, encoded: &str) -> Result<Self, MediaError> {
        let data = STANDARD.decode(encoded.trim())?;
        Ok(Self::new(mime_type, data))
    }

    /// Encodes the payload for the wire
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    /// Reads a file, guessing the MIME type from its extension
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self, MediaError> {
        let path = path.as_ref();
        let mime_type = mime_type_for_path(path)
            .ok_or_else(|| MediaError::UnknownMimeType(path.display().to_string()))?;
        let data = std::fs::read(path)?;
        Ok(Self::new(mime_type, data))
    }
}

/// Maps a file extension to the MIME types the API accepts
pub fn mime_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "mp4" => Some("video/mp4"),
        _ => None,
    }
}

/// Preferred file extension for a MIME type
pub fn extension_for_mime_type(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "video/mp4" => "mp4",
        _ if mime_type.starts_with("video/") => "mp4",
        _ => "png",
    }
}

/// Errors raised while preparing media payloads
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Cannot determine MIME type for {0}")]
    UnknownMimeType(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported aspect ratio '{value}' (expected one of: {expected})")]
    UnsupportedAspectRatio { value: String, expected: String },
}

/// Aspect ratios accepted by the image generation model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageAspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait,
    #[serde(rename = "4:3")]
    Landscape,
    #[serde(rename = "9:16")]
    Tall,
    #[serde(rename = "16:9")]
    Wide,
}

impl ImageAspectRatio {
    pub const ALL: [ImageAspectRatio; 5] = [
        Self::Square,
        Self::Portrait,
        Self::Landscape,
        Self::Tall,
        Self::Wide,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait => "3:4",
            Self::Landscape => "4:3",
            Self::Tall => "9:16",
            Self::Wide => "16:9",
        }
    }
}

impl fmt::Display for ImageAspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageAspectRatio {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == s.trim())
            .ok_or_else(|| MediaError::UnsupportedAspectRatio {
                value: s.to_string(),
                expected: join_ratios(Self::ALL.iter().map(|r| r.as_str())),
            })
    }
}

/// Aspect ratios accepted by the video generation model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoAspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
}

impl VideoAspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
        }
    }
}

impl fmt::Display for VideoAspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoAspectRatio {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "16:9" => Ok(Self::Landscape),
            "9:16" => Ok(Self::Portrait),
            other => Err(MediaError::UnsupportedAspectRatio {
                value: other.to_string(),
                expected: join_ratios(["16:9", "9:16"]),
            }),
        }
    }
}

fn join_ratios<'a>(ratios: impl IntoIterator<Item = &'a str>) -> String {
    ratios.into_iter().collect::<Vec<_>>().join(", ")
}
