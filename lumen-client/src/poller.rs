//! Job poller
//!
//! Drives a submitted long-running job to completion: re-queries its status
//! at a fixed interval until it reports `done`, then downloads the artifact.
//! Status queries go through the [`RetryingInvoker`], so transient failures
//! while polling are retried before the poll itself gives up.

use async_trait::async_trait;
use lumen_core::domain::artifact::VideoArtifact;
use lumen_core::domain::operation::JobHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::{ClientError, Error, Result};
use crate::retry::{RetryError, RetryingInvoker};
use crate::sleeper::Sleeper;

/// Default delay between two status queries
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Remote side of a job: status refresh and artifact download
#[async_trait]
pub trait JobSource: Send + Sync {
    type Handle: JobHandle + Send + Sync;

    /// Queries the current state of the job (one attempt)
    async fn refresh(&self, handle: &Self::Handle) -> Result<Self::Handle, ClientError>;

    /// Downloads the artifact behind a result locator
    async fn fetch(&self, locator: &str) -> Result<VideoArtifact, ClientError>;
}

/// Polls jobs until they finish and materializes their result
#[derive(Debug, Clone)]
pub struct JobPoller {
    invoker: RetryingInvoker,
    sleeper: Arc<dyn Sleeper>,
    poll_interval: Duration,
}

impl JobPoller {
    /// Creates a poller sharing the invoker's delay source
    pub fn new(invoker: RetryingInvoker, poll_interval: Duration) -> Self {
        let sleeper = invoker.sleeper();
        Self {
            invoker,
            sleeper,
            poll_interval,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn invoker(&self) -> &RetryingInvoker {
        &self.invoker
    }

    /// Waits for `handle` to finish, then downloads its artifact
    ///
    /// A handle that is already done is fetched without any status query.
    /// There is no built-in bound on the number of polls; cancel the token
    /// to stop waiting.
    pub async fn wait_for<S>(
        &self,
        source: &S,
        handle: S::Handle,
        cancel: &CancellationToken,
    ) -> Result<VideoArtifact>
    where
        S: JobSource + ?Sized,
    {
        let mut handle = handle;
        let mut polls = 0u32;

        while !handle.is_done() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = self.sleeper.sleep(self.poll_interval) => {}
            }

            polls += 1;
            debug!("Checking status of job {} (poll {})", handle.id(), polls);

            let refreshed = {
                let current = &handle;
                self.invoker
                    .invoke(cancel, move || source.refresh(current))
                    .await
            };
            handle = refreshed.map_err(|e| match e {
                RetryError::Exhausted(classified) => {
                    error!("Polling failed: {}", classified.last_failure);
                    Error::StatusCheckFailed(classified)
                }
                RetryError::Cancelled { .. } => Error::Cancelled,
            })?;
        }

        let Some(locator) = handle.result_locator() else {
            error!("Job {} completed without a result locator", handle.id());
            return Err(Error::NoResultLocator {
                operation: handle.id().to_string(),
                detail: handle.failure_message(),
            });
        };

        info!(
            "Job {} completed after {} status check(s), downloading result",
            handle.id(),
            polls
        );

        let artifact = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            fetched = source.fetch(locator) => fetched,
        }
        .map_err(|e| Error::DownloadFailed {
            status: e.status_code(),
            message: e.to_string(),
        })?;

        info!("Downloaded {} bytes from job {}", artifact.len(), handle.id());

        Ok(artifact)
    }
}
