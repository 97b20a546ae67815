//! Image-related API endpoints

use lumen_core::domain::artifact::GeneratedImage;
use lumen_core::domain::media::{ImageAspectRatio, InlineMedia};
use lumen_core::dto::content::{
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, Modality, Part,
};
use lumen_core::dto::image::{GenerateImagesRequest, GenerateImagesResponse};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::LumenClient;
use crate::error::{Error, Result};

impl LumenClient {
    // =============================================================================
    // Image Generation
    // =============================================================================

    /// Generate one image from a text prompt
    ///
    /// # Arguments
    /// * `prompt` - What the image should show
    /// * `aspect_ratio` - Shape of the output image
    /// * `cancel` - Stops pending retries when cancelled
    ///
    /// # Returns
    /// The generated PNG image
    pub async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: ImageAspectRatio,
        cancel: &CancellationToken,
    ) -> Result<GeneratedImage> {
        let api_key = self.api_key()?;
        let url = self.model_url(&self.models.image_generation, "predict");
        let request = GenerateImagesRequest::single(prompt, aspect_ratio);

        let (url, api_key, request) = (&url, &api_key, &request);
        let response: GenerateImagesResponse = self
            .invoker
            .invoke(cancel, move || self.post_json(url, api_key, request))
            .await?;

        let media = response
            .predictions
            .iter()
            .find_map(|p| p.decode())
            .ok_or_else(|| Error::EmptyResponse("generated image".to_string()))??;

        info!("Generated {} byte image ({})", media.data.len(), aspect_ratio);

        Ok(GeneratedImage::new(media))
    }

    // =============================================================================
    // Image Editing
    // =============================================================================

    /// Edit an image according to a text instruction
    ///
    /// # Arguments
    /// * `image` - The source image
    /// * `prompt` - The edit to apply
    /// * `cancel` - Stops pending retries when cancelled
    ///
    /// # Returns
    /// The edited image, taken from the first inline-data part of the response
    pub async fn edit_image(
        &self,
        image: &InlineMedia,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<GeneratedImage> {
        let request = GenerateContentRequest::from_parts(vec![Part::inline(image), Part::text(prompt)])
            .with_config(GenerationConfig {
                response_modalities: Some(vec![Modality::Image]),
                ..Default::default()
            });

        let response = self
            .generate_content(&self.models.image_edit, &request, cancel)
            .await?;

        let blob = response
            .first_inline_data()
            .ok_or_else(|| Error::EmptyResponse("edited image".to_string()))?;

        Ok(GeneratedImage::new(blob.decode()?))
    }

    /// Run `generateContent` on a model through the retry invoker
    pub(crate) async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerateContentResponse> {
        let api_key = self.api_key()?;
        let url = self.model_url(model, "generateContent");

        let (url, api_key) = (&url, &api_key);
        let response = self
            .invoker
            .invoke(cancel, move || self.post_json(url, api_key, request))
            .await?;

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::{ErrorKind, RetryPolicy, RetryingInvoker};
    use crate::sleeper::TrackingSleeper;
    use crate::StaticCredential;
    use mockito::Matcher;
    use serde_json::json;
    use std::time::Duration;

    fn client(server: &mockito::Server, sleeper: &TrackingSleeper) -> LumenClient {
        let policy = RetryPolicy::new(3, Duration::from_secs(1))
            .unwrap()
            .without_jitter();
        LumenClient::new(server.url(), StaticCredential::new("test-key"))
            .with_invoker(RetryingInvoker::new(policy).with_sleeper(sleeper.clone()))
    }

    #[tokio::test]
    async fn test_generate_image() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/imagen-4.0-generate-001:predict")
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::PartialJson(json!({
                "instances": [ { "prompt": "a red fox" } ],
                "parameters": { "sampleCount": 1, "aspectRatio": "4:3" }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({ "predictions": [ { "bytesBase64Encoded": "aGVsbG8=", "mimeType": "image/png" } ] })
                    .to_string(),
            )
            .create_async()
            .await;

        let sleeper = TrackingSleeper::new();
        let image = client(&server, &sleeper)
            .generate_image("a red fox", ImageAspectRatio::Landscape, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(image.bytes(), b"hello");
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!(sleeper.count(), 0);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_image_retries_rate_limit() {
        let mut server = mockito::Server::new_async().await;
        let limited = server
            .mock("POST", "/models/imagen-4.0-generate-001:predict")
            .with_status(429)
            .with_body(
                json!({ "error": { "code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED" } })
                    .to_string(),
            )
            .expect(3)
            .create_async()
            .await;

        let sleeper = TrackingSleeper::new();
        let err = client(&server, &sleeper)
            .generate_image("a red fox", ImageAspectRatio::Square, &CancellationToken::new())
            .await
            .unwrap_err();

        let classified = err.classified().expect("classified error");
        assert_eq!(classified.kind, ErrorKind::RateLimited);
        assert_eq!(classified.attempts, 3);
        assert!(err.to_string().contains("rate-limits"));
        assert_eq!(
            sleeper.recorded(),
            vec![Duration::from_secs(1), Duration::from_millis(1500)]
        );
        limited.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_image_without_predictions() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/imagen-4.0-generate-001:predict")
            .with_status(200)
            .with_body(json!({ "predictions": [] }).to_string())
            .create_async()
            .await;

        let sleeper = TrackingSleeper::new();
        let err = client(&server, &sleeper)
            .generate_image("nothing", ImageAspectRatio::Square, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::EmptyResponse(_)));
        assert_eq!(sleeper.count(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = LumenClient::new(server.url(), || None::<String>);
        let err = client
            .generate_image("a red fox", ImageAspectRatio::Square, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MissingCredential));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_edit_image_scans_all_parts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash-image:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::PartialJson(json!({
                "generationConfig": { "responseModalities": ["IMAGE"] }
            })))
            .with_status(200)
            .with_body(
                json!({
                    "candidates": [{
                        "content": { "parts": [
                            { "text": "Here you go" },
                            { "inlineData": { "mimeType": "image/png", "data": "ZWRpdGVk" } }
                        ] }
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let sleeper = TrackingSleeper::new();
        let source = InlineMedia::new("image/png", b"original".to_vec());
        let edited = client(&server, &sleeper)
            .edit_image(&source, "make it blue", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(edited.bytes(), b"edited");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_edit_image_without_image_part() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-2.5-flash-image:generateContent")
            .with_status(200)
            .with_body(
                json!({ "candidates": [ { "content": { "parts": [ { "text": "I can't do that" } ] } } ] })
                    .to_string(),
            )
            .create_async()
            .await;

        let sleeper = TrackingSleeper::new();
        let source = InlineMedia::new("image/png", b"original".to_vec());
        let err = client(&server, &sleeper)
            .edit_image(&source, "make it blue", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "The API returned no edited image");
    }
}
