//! Retrying invoker
//!
//! Runs an operation until it succeeds or the attempt budget is spent,
//! sleeping between attempts according to the [`RetryPolicy`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::classify::{ErrorClassifier, ErrorKind, Failure, MessageClassifier, RemoteFailure};
use super::policy::RetryPolicy;
use crate::sleeper::{Sleeper, TokioSleeper};

/// Terminal failure of a retried call
///
/// Displays as the user-facing message chosen for its kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    /// User-facing message
    pub message: String,
    /// Raw message of the last failed attempt
    pub last_failure: String,
    /// Attempts performed before giving up
    pub attempts: u32,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, last_failure: impl Into<String>, attempts: u32) -> Self {
        let last_failure = last_failure.into();
        Self {
            kind,
            message: kind.user_message(&last_failure),
            last_failure,
            attempts,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind == ErrorKind::RateLimited
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryError {
    #[error(transparent)]
    Exhausted(ClassifiedError),

    #[error("Cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },
}

/// Executes operations with classified retries and exponential backoff
#[derive(Clone)]
pub struct RetryingInvoker {
    policy: RetryPolicy,
    classifier: Arc<dyn ErrorClassifier>,
    sleeper: Arc<dyn Sleeper>,
}

impl fmt::Debug for RetryingInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryingInvoker")
            .field("policy", &self.policy)
            .field("classifier", &"<classifier>")
            .field("sleeper", &self.sleeper)
            .finish()
    }
}

impl Default for RetryingInvoker {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl RetryingInvoker {
    /// Invoker with the message classifier and the tokio timer
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            classifier: Arc::new(MessageClassifier),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_classifier(mut self, classifier: impl ErrorClassifier + 'static) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The delay source, shared with pollers built on this invoker
    pub fn sleeper(&self) -> Arc<dyn Sleeper> {
        Arc::clone(&self.sleeper)
    }

    /// Runs `operation` until it succeeds, the budget is spent, or `cancel` fires
    ///
    /// Each failure is classified; all kinds are retried alike. Only the
    /// final failure is returned, as a [`ClassifiedError`] carrying the
    /// user-facing message for its kind. A failure that reports itself as
    /// permanent ends the call at once. Cancellation interrupts both an
    /// in-flight attempt and a pending delay; an already cancelled token
    /// stops the call before the next attempt is started.
    pub async fn invoke<T, E, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RemoteFailure,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut delay = self.policy.first_delay();
        let mut attempt = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(RetryError::Cancelled { attempts: attempt });
            }

            attempt += 1;

            let pending = operation();
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(RetryError::Cancelled { attempts: attempt - 1 });
                }
                outcome = pending => outcome,
            };

            let err = match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("Remote call succeeded after {} attempt(s)", attempt);
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            let message = err.to_string();
            let kind = self.classifier.classify(&Failure {
                message: &message,
                status: err.status_code(),
            });

            if err.is_permanent() {
                error!("API error ({}) cannot be retried: {}", kind, message);
                return Err(RetryError::Exhausted(ClassifiedError::new(
                    kind, message, attempt,
                )));
            }

            if attempt >= max_attempts {
                error!(
                    "API error ({}) after {} attempt(s), giving up: {}",
                    kind, attempt, message
                );
                return Err(RetryError::Exhausted(ClassifiedError::new(
                    kind, message, attempt,
                )));
            }

            warn!(
                "API error ({}) on attempt {}/{}: {}. Retrying in {}ms...",
                kind,
                attempt,
                max_attempts,
                message,
                delay.as_millis()
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(RetryError::Cancelled { attempts: attempt });
                }
                _ = self.sleeper.sleep(delay) => {}
            }

            delay = self.policy.next_delay(delay, self.policy.sample_jitter());
        }
    }
}
