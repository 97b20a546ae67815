//! Error types for the Lumen client

use lumen_core::domain::media::MediaError;
use serde::Deserialize;
use thiserror::Error;

use crate::retry::{ClassifiedError, RemoteFailure, RetryError};

/// Result type alias for client operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure of a single HTTP exchange with the API
///
/// These are the raw errors an attempt can produce. They are classified and
/// retried by the invoker and never reach callers directly.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No API key could be resolved
    #[error("No API key configured")]
    MissingCredential,
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// HTTP status code carried by this error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            Self::RequestFailed(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self.status_code(), Some(status) if (400..500).contains(&status))
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self.status_code(), Some(status) if status >= 500)
    }
}

impl RemoteFailure for ClientError {
    fn status_code(&self) -> Option<u16> {
        ClientError::status_code(self)
    }

    fn is_permanent(&self) -> bool {
        matches!(self, Self::MissingCredential | Self::InvalidRequest(_))
    }
}

/// Error envelope returned by the API on non-2xx responses
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Extracts a readable message from an error response body
///
/// The API wraps errors as `{"error": {"code", "message", "status"}}`; the
/// status name (e.g. `RESOURCE_EXHAUSTED`) is kept in front of the message so
/// classification can see it. Bodies in any other shape are returned as-is.
pub(crate) fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope { error }) => match error.status {
            Some(status) if !status.is_empty() => format!("{}: {}", status, error.message),
            _ => error.message,
        },
        Err(_) if body.trim().is_empty() => "Unknown error".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

/// Terminal errors surfaced to callers of the client
#[derive(Debug, Error)]
pub enum Error {
    /// A call failed on every allowed attempt
    #[error(transparent)]
    Classified(#[from] ClassifiedError),

    /// Querying the status of a video job failed after retries
    #[error("Video generation status check failed: {0}")]
    StatusCheckFailed(#[source] ClassifiedError),

    /// The job finished but reported no artifact locator
    #[error("Failed to obtain the download link for job {operation} after completion{}", detail_suffix(.detail))]
    NoResultLocator {
        operation: String,
        detail: Option<String>,
    },

    /// Fetching the finished artifact did not succeed
    #[error("Could not download the generated video: {message}")]
    DownloadFailed {
        status: Option<u16>,
        message: String,
    },

    /// The API answered successfully but without the expected payload
    #[error("The API returned no {0}")]
    EmptyResponse(String),

    /// A call was made without the input it needs
    #[error("No {0} given")]
    EmptyInput(String),

    /// No API key could be resolved for the call
    #[error("No API key configured (set LUMEN_API_KEY or GEMINI_API_KEY)")]
    MissingCredential,

    /// Media payload could not be prepared or decoded
    #[error("Invalid media: {0}")]
    Media(#[from] MediaError),

    /// The caller cancelled the call
    #[error("Operation cancelled")]
    Cancelled,
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {}", d))
        .unwrap_or_default()
}

impl From<RetryError> for Error {
    fn from(err: RetryError) -> Self {
        match err {
            RetryError::Exhausted(classified) => Self::Classified(classified),
            RetryError::Cancelled { .. } => Self::Cancelled,
        }
    }
}

impl Error {
    /// Classified failure behind this error, if it came from the invoker
    pub fn classified(&self) -> Option<&ClassifiedError> {
        match self {
            Self::Classified(c) | Self::StatusCheckFailed(c) => Some(c),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_helpers() {
        let err = ClientError::api_error(429, "slow down");
        assert_eq!(err.status_code(), Some(429));
        assert!(err.is_client_error());
        assert!(!err.is_server_error());

        let err = ClientError::api_error(503, "overloaded");
        assert!(err.is_server_error());

        assert_eq!(ClientError::MissingCredential.status_code(), None);
    }

    #[test]
    fn test_permanent_failures() {
        assert!(ClientError::MissingCredential.is_permanent());
        assert!(ClientError::InvalidRequest("bad".to_string()).is_permanent());
        assert!(!ClientError::api_error(429, "slow down").is_permanent());
        assert!(!ClientError::api_error(400, "bad prompt").is_permanent());
    }

    #[test]
    fn test_api_error_display_keeps_status() {
        let err = ClientError::api_error(429, "RESOURCE_EXHAUSTED: quota");
        assert_eq!(err.to_string(), "API error (status 429): RESOURCE_EXHAUSTED: quota");
    }

    #[test]
    fn test_api_error_message_from_envelope() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded for metric","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            api_error_message(body),
            "RESOURCE_EXHAUSTED: Quota exceeded for metric"
        );

        let body = r#"{"error":{"code":400,"message":"Bad prompt"}}"#;
        assert_eq!(api_error_message(body), "Bad prompt");
    }

    #[test]
    fn test_api_error_message_fallbacks() {
        assert_eq!(api_error_message("  upstream timeout \n"), "upstream timeout");
        assert_eq!(api_error_message(""), "Unknown error");
    }

    #[test]
    fn test_no_result_locator_display() {
        let err = Error::NoResultLocator {
            operation: "op1".to_string(),
            detail: None,
        };
        assert_eq!(
            err.to_string(),
            "Failed to obtain the download link for job op1 after completion"
        );

        let err = Error::NoResultLocator {
            operation: "op1".to_string(),
            detail: Some("prompt rejected (code 3)".to_string()),
        };
        assert!(err.to_string().ends_with("after completion: prompt rejected (code 3)"));
    }

    #[test]
    fn test_cancelled_retry_maps_to_cancelled() {
        let err: Error = RetryError::Cancelled { attempts: 2 }.into();
        assert!(matches!(err, Error::Cancelled));
    }
}
