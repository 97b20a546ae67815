//! Text generation and content analysis endpoints

use lumen_core::domain::media::InlineMedia;
use lumen_core::dto::content::{GenerateContentRequest, GenerationConfig, Part, ThinkingConfig};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::LumenClient;
use crate::error::{Error, Result};

impl LumenClient {
    /// Generate text from a prompt
    pub async fn generate_text(&self, prompt: &str, cancel: &CancellationToken) -> Result<String> {
        let request = GenerateContentRequest::from_parts(vec![Part::text(prompt)]);
        self.complete_text(&self.models.text, &request, cancel).await
    }

    /// Describe or answer a question about an image
    pub async fn analyze_image(
        &self,
        image: &InlineMedia,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let parts = vec![Part::inline(image), Part::text(prompt)];
        let request = GenerateContentRequest::from_parts(parts).with_config(self.analysis_config());
        self.complete_text(&self.models.analysis, &request, cancel).await
    }

    /// Analyze an ordered sequence of video frames
    ///
    /// Frames are sent in the given order, followed by the prompt.
    pub async fn analyze_video_frames(
        &self,
        frames: &[InlineMedia],
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        if frames.is_empty() {
            return Err(Error::EmptyInput("frames".to_string()));
        }

        debug!("Analyzing {} video frame(s)", frames.len());

        let parts = frames
            .iter()
            .map(Part::inline)
            .chain(std::iter::once(Part::text(prompt)))
            .collect();
        let request = GenerateContentRequest::from_parts(parts).with_config(self.analysis_config());
        self.complete_text(&self.models.analysis, &request, cancel).await
    }

    fn analysis_config(&self) -> GenerationConfig {
        GenerationConfig {
            thinking_config: Some(ThinkingConfig {
                thinking_budget: self.models.thinking_budget,
            }),
            ..Default::default()
        }
    }

    async fn complete_text(
        &self,
        model: &str,
        request: &GenerateContentRequest,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let response = self.generate_content(model, request, cancel).await?;
        response
            .text()
            .ok_or_else(|| Error::EmptyResponse("text".to_string()))
    }
}
