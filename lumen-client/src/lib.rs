//! Lumen HTTP Client
//!
//! A resilient, type-safe client for a generative-media API: text, image
//! and video generation, image editing and content analysis.
//!
//! Every remote call runs through a [`RetryingInvoker`], which retries
//! rate-limited and overloaded requests with exponential backoff and turns
//! the final failure into one classified, user-presentable error. Video
//! generation is a long-running job; the [`JobPoller`] drives it to
//! completion and downloads the result.
//!
//! # Example
//!
//! ```no_run
//! use lumen_client::{EnvCredential, LumenClient};
//! use lumen_core::domain::media::ImageAspectRatio;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = LumenClient::new(lumen_client::config::DEFAULT_BASE_URL, EnvCredential::default());
//!     let cancel = CancellationToken::new();
//!
//!     let image = client
//!         .generate_image("a lighthouse at dawn", ImageAspectRatio::Wide, &cancel)
//!         .await?;
//!
//!     image.save_to("lighthouse.png")?;
//!     Ok(())
//! }
//! ```

mod analysis;
pub mod config;
pub mod credentials;
pub mod error;
mod images;
pub mod poller;
pub mod retry;
pub mod sleeper;
mod videos;

// Re-export commonly used types
pub use config::{ClientConfig, ModelConfig};
pub use credentials::{CredentialProvider, EnvCredential, StaticCredential};
pub use error::{ClientError, Error, Result};
pub use poller::{JobPoller, JobSource};
pub use retry::{ClassifiedError, ErrorKind, RetryPolicy, RetryingInvoker};
pub use tokio_util::sync::CancellationToken;

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::error::api_error_message;

/// Header carrying the API key on JSON endpoints
const API_KEY_HEADER: &str = "x-goog-api-key";

/// HTTP client for the generative-media API
///
/// Methods are organized into logical groups:
/// - Images: generation and editing
/// - Videos: submission, status refresh, download, and generate-and-wait
/// - Analysis: text generation, image and video-frame analysis
#[derive(Clone)]
pub struct LumenClient {
    /// Base URL of the API, including the version segment
    base_url: String,
    /// HTTP client instance
    client: Client,
    /// Key source, consulted at the start of every call
    credentials: Arc<dyn CredentialProvider>,
    /// Retry wrapper for single-shot calls and status queries
    invoker: RetryingInvoker,
    /// Long-running job driver
    poller: JobPoller,
    models: ModelConfig,
}

impl std::fmt::Debug for LumenClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LumenClient")
            .field("base_url", &self.base_url)
            .field("invoker", &self.invoker)
            .field("poll_interval", &self.poller.poll_interval())
            .field("models", &self.models)
            .finish()
    }
}

impl LumenClient {
    /// Create a new client with default retry and polling settings
    ///
    /// # Arguments
    /// * `base_url` - The API base URL (e.g., "https://generativelanguage.googleapis.com/v1beta")
    /// * `credentials` - Where to read the API key from on each call
    ///
    /// # Example
    /// ```
    /// use lumen_client::{LumenClient, StaticCredential};
    ///
    /// let client = LumenClient::new("http://localhost:8080/", StaticCredential::new("key"));
    /// assert_eq!(client.base_url(), "http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>, credentials: impl CredentialProvider + 'static) -> Self {
        Self::with_client(base_url, Client::new(), credentials)
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        base_url: impl Into<String>,
        client: Client,
        credentials: impl CredentialProvider + 'static,
    ) -> Self {
        let base_url = base_url.into();
        let invoker = RetryingInvoker::default();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            credentials: Arc::new(credentials),
            poller: JobPoller::new(invoker.clone(), poller::DEFAULT_POLL_INTERVAL),
            invoker,
            models: ModelConfig::default(),
        }
    }

    /// Create a client from validated configuration
    pub fn from_config(
        config: &ClientConfig,
        credentials: impl CredentialProvider + 'static,
    ) -> Result<Self, ClientError> {
        config
            .retry
            .validate()
            .map_err(|e| ClientError::InvalidRequest(format!("Invalid retry policy: {}", e)))?;

        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self::with_client(config.base_url.clone(), http, credentials)
            .with_invoker(RetryingInvoker::new(config.retry.clone()))
            .with_poll_interval(config.poll_interval)
            .with_models(config.models.clone()))
    }

    /// Replace the retry invoker; the poller follows it
    pub fn with_invoker(mut self, invoker: RetryingInvoker) -> Self {
        self.poller = JobPoller::new(invoker.clone(), self.poller.poll_interval());
        self.invoker = invoker;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poller = JobPoller::new(self.invoker.clone(), poll_interval);
        self
    }

    pub fn with_models(mut self, models: ModelConfig) -> Self {
        self.models = models;
        self
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn models(&self) -> &ModelConfig {
        &self.models
    }

    pub fn invoker(&self) -> &RetryingInvoker {
        &self.invoker
    }

    pub fn poller(&self) -> &JobPoller {
        &self.poller
    }

    // =============================================================================
    // Request Helpers
    // =============================================================================

    /// Resolve the API key for a top-level call
    fn api_key(&self) -> Result<String> {
        self.credentials.api_key().ok_or(Error::MissingCredential)
    }

    /// URL of a model method, e.g. `{base}/models/{model}:predict`
    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    /// Perform one authenticated JSON POST (a single attempt)
    async fn post_json<B, T>(&self, url: &str, api_key: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .json(body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Perform one authenticated JSON GET (a single attempt)
    async fn get_json<T: DeserializeOwned>(&self, url: &str, api_key: &str) -> Result<T, ClientError> {
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Turn a non-2xx response into an [`ClientError::ApiError`]
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ClientError::api_error(status.as_u16(), api_error_message(&body)))
    }
}
