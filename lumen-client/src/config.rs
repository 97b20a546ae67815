//! Client configuration
//!
//! Endpoint, retry budget, polling cadence and model selection. Everything
//! can be overridden from the environment; the API key is deliberately not
//! part of the configuration and is resolved per call instead.

use std::str::FromStr;
use std::time::Duration;

use crate::poller::DEFAULT_POLL_INTERVAL;
use crate::retry::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL, including the version segment
    pub base_url: String,

    /// Retry budget and backoff for every remote call
    pub retry: RetryPolicy,

    /// Delay between two status queries of a long-running job
    pub poll_interval: Duration,

    /// Timeout applied to each individual HTTP request
    pub request_timeout: Duration,

    /// Models used for each kind of call
    pub models: ModelConfig,
}

/// Model identifiers per call kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub text: String,
    pub analysis: String,
    pub image_generation: String,
    pub image_edit: String,
    pub video: String,
    /// Reasoning budget granted to analysis calls
    pub thinking_budget: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            text: "gemini-2.5-flash".to_string(),
            analysis: "gemini-3-pro-preview".to_string(),
            image_generation: "imagen-4.0-generate-001".to_string(),
            image_edit: "gemini-2.5-flash-image".to_string(),
            video: "veo-3.1-fast-generate-preview".to_string(),
            thinking_budget: 32768,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: Duration::from_secs(120),
            models: ModelConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Creates configuration from environment variables
    ///
    /// Every variable is optional; unset ones keep their default:
    /// - LUMEN_BASE_URL
    /// - LUMEN_MAX_ATTEMPTS
    /// - LUMEN_INITIAL_DELAY_MS
    /// - LUMEN_MAX_DELAY_MS
    /// - LUMEN_POLL_INTERVAL (seconds)
    /// - LUMEN_REQUEST_TIMEOUT (seconds)
    /// - LUMEN_TEXT_MODEL, LUMEN_ANALYSIS_MODEL, LUMEN_IMAGE_MODEL,
    ///   LUMEN_IMAGE_EDIT_MODEL, LUMEN_VIDEO_MODEL
    ///
    /// A variable that is set but cannot be parsed is an error.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(base_url) = env_string("LUMEN_BASE_URL") {
            config.base_url = base_url;
        }

        if let Some(attempts) = env_parse::<u32>("LUMEN_MAX_ATTEMPTS")? {
            config.retry.max_attempts = attempts;
        }

        if let Some(ms) = env_parse::<u64>("LUMEN_INITIAL_DELAY_MS")? {
            config.retry.initial_delay = Duration::from_millis(ms);
        }

        if let Some(ms) = env_parse::<u64>("LUMEN_MAX_DELAY_MS")? {
            config.retry.max_delay = Duration::from_millis(ms);
        }

        if let Some(secs) = env_parse::<u64>("LUMEN_POLL_INTERVAL")? {
            config.poll_interval = Duration::from_secs(secs);
        }

        if let Some(secs) = env_parse::<u64>("LUMEN_REQUEST_TIMEOUT")? {
            config.request_timeout = Duration::from_secs(secs);
        }

        let models = &mut config.models;
        for (var, slot) in [
            ("LUMEN_TEXT_MODEL", &mut models.text),
            ("LUMEN_ANALYSIS_MODEL", &mut models.analysis),
            ("LUMEN_IMAGE_MODEL", &mut models.image_generation),
            ("LUMEN_IMAGE_EDIT_MODEL", &mut models.image_edit),
            ("LUMEN_VIDEO_MODEL", &mut models.video),
        ] {
            if let Some(model) = env_string(var) {
                *slot = model;
            }
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_url.is_empty() {
            anyhow::bail!("base_url cannot be empty");
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            anyhow::bail!("base_url must start with http:// or https://");
        }

        self.retry.validate()?;

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        let models = &self.models;
        for (name, model) in [
            ("text", &models.text),
            ("analysis", &models.analysis),
            ("image_generation", &models.image_generation),
            ("image_edit", &models.image_edit),
            ("video", &models.video),
        ] {
            if model.trim().is_empty() {
                anyhow::bail!("{} model cannot be empty", name);
            }
        }

        Ok(())
    }
}

fn env_string(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_parse<T>(var: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_string(var)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| anyhow::anyhow!("{} has invalid value '{}': {}", var, raw, e))
        })
        .transpose()
}
