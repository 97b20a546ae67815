//! Failure classification

use std::fmt;

/// Retry-relevant category of a failed remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Rate limit or quota exhausted (429, `RESOURCE_EXHAUSTED`)
    RateLimited,
    /// Server busy or unavailable (503, overloaded)
    ServerUnavailable,
    /// Anything else
    Other,
}

const RATE_LIMIT_MESSAGE: &str = "You have exceeded your API quota. Please check your plan and billing \
     details, or try again later. For more information, see: \
     https://ai.google.dev/gemini-api/docs/rate-limits";

const SERVER_BUSY_MESSAGE: &str =
    "The AI servers are currently overloaded. Please try again in a few moments.";

const GENERIC_MESSAGE: &str = "An error occurred while communicating with the API.";

impl ErrorKind {
    /// Short label used in logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate limit",
            Self::ServerUnavailable => "server busy",
            Self::Other => "error",
        }
    }

    /// Message shown to the user once retries are exhausted
    pub fn user_message(&self, raw: &str) -> String {
        match self {
            Self::RateLimited => RATE_LIMIT_MESSAGE.to_string(),
            Self::ServerUnavailable => SERVER_BUSY_MESSAGE.to_string(),
            Self::Other if raw.trim().is_empty() => GENERIC_MESSAGE.to_string(),
            Self::Other => raw.to_string(),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An error an operation may fail with
///
/// Anything displayable qualifies; transports that know the HTTP status of
/// a failure expose it so structured classifiers can use it.
pub trait RemoteFailure: fmt::Display {
    fn status_code(&self) -> Option<u16> {
        None
    }

    /// Whether retrying can never help, e.g. no credential is configured
    fn is_permanent(&self) -> bool {
        false
    }
}

impl RemoteFailure for String {}

impl RemoteFailure for &str {}

impl RemoteFailure for anyhow::Error {}

/// What a classifier gets to see about a failed attempt
#[derive(Debug, Clone, Copy)]
pub struct Failure<'a> {
    pub message: &'a str,
    pub status: Option<u16>,
}

/// Maps a failed attempt to an [`ErrorKind`]
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, failure: &Failure<'_>) -> ErrorKind;
}

impl<F> ErrorClassifier for F
where
    F: Fn(&Failure<'_>) -> ErrorKind + Send + Sync,
{
    fn classify(&self, failure: &Failure<'_>) -> ErrorKind {
        self(failure)
    }
}

/// Classifies by lowercase substring markers in the error message
pub fn classify_message(message: &str) -> ErrorKind {
    let message = message.to_lowercase();

    if ["429", "quota", "resource_exhausted"]
        .iter()
        .any(|marker| message.contains(marker))
    {
        ErrorKind::RateLimited
    } else if ["503", "overloaded"]
        .iter()
        .any(|marker| message.contains(marker))
    {
        ErrorKind::ServerUnavailable
    } else {
        ErrorKind::Other
    }
}

/// Default classifier: message markers only
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageClassifier;

impl ErrorClassifier for MessageClassifier {
    fn classify(&self, failure: &Failure<'_>) -> ErrorKind {
        classify_message(failure.message)
    }
}

/// Uses the HTTP status when one is known, message markers otherwise
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusCodeClassifier;

impl ErrorClassifier for StatusCodeClassifier {
    fn classify(&self, failure: &Failure<'_>) -> ErrorKind {
        match failure.status {
            Some(429) => ErrorKind::RateLimited,
            Some(503) => ErrorKind::ServerUnavailable,
            _ => classify_message(failure.message),
        }
    }
}
