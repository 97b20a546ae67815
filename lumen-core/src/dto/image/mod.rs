//! Image generation (`:predict`) DTOs

use serde::{Deserialize, Serialize};

use crate::domain::media::{ImageAspectRatio, InlineMedia, MediaError};

/// Request body for `models/{model}:predict`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateImagesRequest {
    pub instances: Vec<ImagePromptInstance>,
    pub parameters: ImageParameters,
}

impl GenerateImagesRequest {
    /// One PNG image for the given prompt
    pub fn single(prompt: impl Into<String>, aspect_ratio: ImageAspectRatio) -> Self {
        Self {
            instances: vec![ImagePromptInstance {
                prompt: prompt.into(),
            }],
            parameters: ImageParameters {
                sample_count: 1,
                aspect_ratio,
                output_options: Some(OutputOptions {
                    mime_type: "image/png".to_string(),
                }),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePromptInstance {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageParameters {
    pub sample_count: u32,
    pub aspect_ratio: ImageAspectRatio,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_options: Option<OutputOptions>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputOptions {
    pub mime_type: String,
}

/// Response body of `:predict`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateImagesResponse {
    #[serde(default)]
    pub predictions: Vec<ImagePrediction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePrediction {
    #[serde(default)]
    pub bytes_base64_encoded: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl ImagePrediction {
    /// Decodes the prediction, or `None` when it carries no image
    /// (e.g. filtered by safety settings)
    pub fn decode(&self) -> Option<Result<InlineMedia, MediaError>> {
        let encoded = self.bytes_base64_encoded.as_deref()?;
        let mime_type = self.mime_type.clone().unwrap_or_else(|| "image/png".to_string());
        Some(InlineMedia::from_base64(mime_type, encoded))
    }
}
