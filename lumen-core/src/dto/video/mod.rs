//! Video generation (`:predictLongRunning`) DTOs

use serde::{Deserialize, Serialize};

use crate::domain::media::{InlineMedia, VideoAspectRatio};

/// Request body for `models/{model}:predictLongRunning`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateVideosRequest {
    pub instances: Vec<VideoPromptInstance>,
    pub parameters: VideoParameters,
}

impl GenerateVideosRequest {
    /// One 720p video from a prompt and an optional starting image
    pub fn single(
        prompt: impl Into<String>,
        image: Option<&InlineMedia>,
        aspect_ratio: VideoAspectRatio,
    ) -> Self {
        Self {
            instances: vec![VideoPromptInstance {
                prompt: prompt.into(),
                image: image.map(|media| ImageInput {
                    bytes_base64_encoded: media.to_base64(),
                    mime_type: media.mime_type.clone(),
                }),
            }],
            parameters: VideoParameters {
                sample_count: 1,
                resolution: "720p".to_string(),
                aspect_ratio,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoPromptInstance {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInput {
    pub bytes_base64_encoded: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoParameters {
    pub sample_count: u32,
    pub resolution: String,
    pub aspect_ratio: VideoAspectRatio,
}

/// `generateVideoResponse` member of a finished operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoResponse {
    #[serde(default)]
    pub generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedSample {
    #[serde(default)]
    pub video: Option<VideoFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoFile {
    #[serde(default)]
    pub uri: Option<String>,
}
