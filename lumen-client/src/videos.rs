//! Video-related API endpoints

use async_trait::async_trait;
use lumen_core::domain::artifact::VideoArtifact;
use lumen_core::domain::media::{InlineMedia, VideoAspectRatio};
use lumen_core::domain::operation::VideoOperation;
use lumen_core::dto::video::GenerateVideosRequest;
use reqwest::header::CONTENT_TYPE;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::LumenClient;
use crate::error::{ClientError, Result};
use crate::poller::JobSource;

/// MIME type assumed when a download carries no content type
const DEFAULT_VIDEO_MIME_TYPE: &str = "video/mp4";

impl LumenClient {
    // =============================================================================
    // Video Generation
    // =============================================================================

    /// Generate a video from a text prompt and wait for it
    ///
    /// Submits the job, polls it until done and downloads the result.
    pub async fn generate_video_from_text(
        &self,
        prompt: &str,
        aspect_ratio: VideoAspectRatio,
        cancel: &CancellationToken,
    ) -> Result<VideoArtifact> {
        let request = GenerateVideosRequest::single(prompt, None, aspect_ratio);
        let operation = self.submit_video(&request, cancel).await?;
        self.wait_for_video(operation, cancel).await
    }

    /// Generate a video that starts from `image` and wait for it
    pub async fn generate_video_from_image(
        &self,
        image: &InlineMedia,
        prompt: &str,
        aspect_ratio: VideoAspectRatio,
        cancel: &CancellationToken,
    ) -> Result<VideoArtifact> {
        let request = GenerateVideosRequest::single(prompt, Some(image), aspect_ratio);
        let operation = self.submit_video(&request, cancel).await?;
        self.wait_for_video(operation, cancel).await
    }

    /// Submit a video generation job
    ///
    /// # Returns
    /// The operation handle; usually not done yet
    pub async fn submit_video(
        &self,
        request: &GenerateVideosRequest,
        cancel: &CancellationToken,
    ) -> Result<VideoOperation> {
        let api_key = self.api_key()?;
        let url = self.model_url(&self.models.video, "predictLongRunning");

        let (url, api_key) = (&url, &api_key);
        let operation: VideoOperation = self
            .invoker
            .invoke(cancel, move || self.post_json(url, api_key, request))
            .await?;

        info!("Submitted video job {}", operation.name);

        Ok(operation)
    }

    /// Poll a submitted operation until done and download its video
    pub async fn wait_for_video(
        &self,
        operation: VideoOperation,
        cancel: &CancellationToken,
    ) -> Result<VideoArtifact> {
        self.poller.wait_for(self, operation, cancel).await
    }

    // =============================================================================
    // Operation Status & Download
    // =============================================================================

    /// Fetch the current state of an operation (a single attempt)
    pub async fn refresh_operation(
        &self,
        operation: &VideoOperation,
    ) -> Result<VideoOperation, ClientError> {
        let api_key = self
            .credentials
            .api_key()
            .ok_or(ClientError::MissingCredential)?;
        let url = format!("{}/{}", self.base_url, operation.name);

        self.get_json(&url, &api_key).await
    }

    /// Download a finished video (a single attempt)
    ///
    /// The key is passed as a query parameter since the locator may point
    /// at a file host that ignores the key header.
    pub async fn download(&self, locator: &str) -> Result<VideoArtifact, ClientError> {
        let api_key = self
            .credentials
            .api_key()
            .ok_or(ClientError::MissingCredential)?;

        debug!("Downloading video from {}", locator);

        let response = self
            .client
            .get(locator)
            .query(&[("key", api_key.as_str())])
            .send()
            .await?;

        let response = Self::check_status(response).await?;

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_VIDEO_MIME_TYPE.to_string());

        let bytes = response.bytes().await?;

        Ok(VideoArtifact::new(locator, mime_type, bytes.to_vec()))
    }
}

#[async_trait]
impl JobSource for LumenClient {
    type Handle = VideoOperation;

    async fn refresh(&self, handle: &VideoOperation) -> Result<VideoOperation, ClientError> {
        self.refresh_operation(handle).await
    }

    async fn fetch(&self, locator: &str) -> Result<VideoArtifact, ClientError> {
        self.download(locator).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::retry::{ErrorKind, RetryPolicy, RetryingInvoker};
    use crate::sleeper::TrackingSleeper;
    use crate::StaticCredential;
    use mockito::Matcher;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    const OPERATION: &str = "models/veo-3.1-fast-generate-preview/operations/op-1";

    fn client(server: &mockito::Server, sleeper: &TrackingSleeper) -> LumenClient {
        let policy = RetryPolicy::new(3, Duration::from_secs(1))
            .unwrap()
            .without_jitter();
        LumenClient::new(server.url(), StaticCredential::new("test-key"))
            .with_invoker(RetryingInvoker::new(policy).with_sleeper(sleeper.clone()))
    }

    fn finished_operation(uri: &str) -> serde_json::Value {
        json!({
            "name": OPERATION,
            "done": true,
            "response": {
                "generateVideoResponse": {
                    "generatedSamples": [ { "video": { "uri": uri } } ]
                }
            }
        })
    }

    async fn mock_download(server: &mut mockito::Server) -> mockito::Mock {
        server
            .mock("GET", Matcher::Regex(r"^/files/video-1:download".to_string()))
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("alt".into(), "media".into()),
                Matcher::UrlEncoded("key".into(), "test-key".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "video/mp4")
            .with_body("mp4-bytes")
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_generate_video_from_text() {
        let mut server = mockito::Server::new_async().await;
        let locator = format!("{}/files/video-1:download?alt=media", server.url());

        let submit = server
            .mock("POST", "/models/veo-3.1-fast-generate-preview:predictLongRunning")
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::PartialJson(json!({
                "instances": [ { "prompt": "waves at night" } ],
                "parameters": { "aspectRatio": "9:16", "resolution": "720p" }
            })))
            .with_status(200)
            .with_body(json!({ "name": OPERATION }).to_string())
            .create_async()
            .await;
        let status = server
            .mock("GET", format!("/{}", OPERATION).as_str())
            .match_header("x-goog-api-key", "test-key")
            .with_status(200)
            .with_body(finished_operation(&locator).to_string())
            .expect(1)
            .create_async()
            .await;
        let download = mock_download(&mut server).await;

        let sleeper = TrackingSleeper::new();
        let video = client(&server, &sleeper)
            .generate_video_from_text("waves at night", VideoAspectRatio::Portrait, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(video.bytes(), b"mp4-bytes");
        assert_eq!(video.mime_type, "video/mp4");
        assert_eq!(video.source_uri, locator);
        assert_eq!(sleeper.recorded(), vec![Duration::from_secs(5)]);
        submit.assert_async().await;
        status.assert_async().await;
        download.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_video_from_image_sends_image() {
        let mut server = mockito::Server::new_async().await;
        let locator = format!("{}/files/video-1:download?alt=media", server.url());

        let submit = server
            .mock("POST", "/models/veo-3.1-fast-generate-preview:predictLongRunning")
            .match_body(Matcher::PartialJson(json!({
                "instances": [ {
                    "prompt": "it starts to rain",
                    "image": { "bytesBase64Encoded": "c3RpbGw=", "mimeType": "image/png" }
                } ]
            })))
            .with_status(200)
            .with_body(finished_operation(&locator).to_string())
            .create_async()
            .await;
        let download = mock_download(&mut server).await;

        let sleeper = TrackingSleeper::new();
        let still = InlineMedia::new("image/png", b"still".to_vec());
        let video = client(&server, &sleeper)
            .generate_video_from_image(
                &still,
                "it starts to rain",
                VideoAspectRatio::Landscape,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        // Already done on submission: no polling at all
        assert_eq!(video.len(), 9);
        assert_eq!(sleeper.count(), 0);
        submit.assert_async().await;
        download.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_video_retries_overloaded() {
        let mut server = mockito::Server::new_async().await;
        let overloaded = server
            .mock("POST", "/models/veo-3.1-fast-generate-preview:predictLongRunning")
            .with_status(503)
            .with_body(
                json!({ "error": { "code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE" } })
                    .to_string(),
            )
            .expect(3)
            .create_async()
            .await;

        let sleeper = TrackingSleeper::new();
        let request = GenerateVideosRequest::single("waves", None, VideoAspectRatio::Landscape);
        let err = client(&server, &sleeper)
            .submit_video(&request, &CancellationToken::new())
            .await
            .unwrap_err();

        let classified = err.classified().expect("classified error");
        assert_eq!(classified.kind, ErrorKind::ServerUnavailable);
        assert_eq!(sleeper.count(), 2);
        overloaded.assert_async().await;
    }

    #[tokio::test]
    async fn test_finished_operation_with_error() {
        let mut server = mockito::Server::new_async().await;
        let _submit = server
            .mock("POST", "/models/veo-3.1-fast-generate-preview:predictLongRunning")
            .with_status(200)
            .with_body(json!({ "name": OPERATION }).to_string())
            .create_async()
            .await;
        let _status = server
            .mock("GET", format!("/{}", OPERATION).as_str())
            .with_status(200)
            .with_body(
                json!({
                    "name": OPERATION,
                    "done": true,
                    "error": { "code": 3, "message": "Prompt was blocked" }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let sleeper = TrackingSleeper::new();
        let err = client(&server, &sleeper)
            .generate_video_from_text("waves", VideoAspectRatio::Landscape, &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            Error::NoResultLocator { operation, detail } => {
                assert_eq!(operation, OPERATION);
                assert_eq!(detail.as_deref(), Some("Prompt was blocked (code 3)"));
            }
            other => panic!("expected NoResultLocator, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_download_failure_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let locator = format!("{}/files/video-1:download?alt=media", server.url());
        let forbidden = server
            .mock("GET", Matcher::Regex(r"^/files/video-1:download".to_string()))
            .with_status(403)
            .with_body("Forbidden")
            .expect(1)
            .create_async()
            .await;

        let sleeper = TrackingSleeper::new();
        let operation: VideoOperation = serde_json::from_value(finished_operation(&locator)).unwrap();
        let err = client(&server, &sleeper)
            .wait_for_video(operation, &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            Error::DownloadFailed { status, message } => {
                assert_eq!(status, Some(403));
                assert!(message.contains("Forbidden"));
            }
            other => panic!("expected DownloadFailed, got {other:?}"),
        }
        assert_eq!(sleeper.count(), 0);
        forbidden.assert_async().await;
    }

    #[tokio::test]
    async fn test_download_defaults_mime_type() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/files/raw")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .with_status(200)
            .with_body("raw")
            .create_async()
            .await;

        let sleeper = TrackingSleeper::new();
        let video = client(&server, &sleeper)
            .download(&format!("{}/files/raw", server.url()))
            .await
            .unwrap();

        assert_eq!(video.mime_type, "video/mp4");
        assert_eq!(video.into_bytes(), b"raw".to_vec());
    }

    #[tokio::test]
    async fn test_cancel_while_polling() {
        let mut server = mockito::Server::new_async().await;
        let _submit = server
            .mock("POST", "/models/veo-3.1-fast-generate-preview:predictLongRunning")
            .with_status(200)
            .with_body(json!({ "name": OPERATION }).to_string())
            .create_async()
            .await;
        let status = server
            .mock("GET", format!("/{}", OPERATION).as_str())
            .with_status(200)
            .with_body(json!({ "name": OPERATION, "done": false }).to_string())
            .expect(2)
            .create_async()
            .await;

        let token = CancellationToken::new();
        let sleeper = TrackingSleeper::cancel_after(3, token.clone());
        let err = client(&server, &sleeper)
            .generate_video_from_text("waves", VideoAspectRatio::Landscape, &token)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        status.assert_async().await;
    }

    #[tokio::test]
    async fn test_key_removed_while_polling_fails_fast() {
        let mut server = mockito::Server::new_async().await;
        let _submit = server
            .mock("POST", "/models/veo-3.1-fast-generate-preview:predictLongRunning")
            .with_status(200)
            .with_body(json!({ "name": OPERATION }).to_string())
            .create_async()
            .await;
        let status = server
            .mock("GET", format!("/{}", OPERATION).as_str())
            .expect(0)
            .create_async()
            .await;

        // Key present for the submission only
        let lookups = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&lookups);
        let credentials = move || {
            (counter.fetch_add(1, Ordering::SeqCst) == 0).then(|| "test-key".to_string())
        };

        let sleeper = TrackingSleeper::new();
        let policy = RetryPolicy::new(8, Duration::from_secs(1))
            .unwrap()
            .without_jitter();
        let client = LumenClient::new(server.url(), credentials)
            .with_invoker(RetryingInvoker::new(policy).with_sleeper(sleeper.clone()));

        let err = client
            .generate_video_from_text("waves", VideoAspectRatio::Landscape, &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            Error::StatusCheckFailed(classified) => assert_eq!(classified.attempts, 1),
            other => panic!("expected StatusCheckFailed, got {other:?}"),
        }
        assert_eq!(lookups.load(Ordering::SeqCst), 2);
        assert_eq!(sleeper.recorded(), vec![Duration::from_secs(5)]);
        status.assert_async().await;
    }
}
