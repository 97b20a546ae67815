//! Delay scheduling shared by the retry invoker and the job poller
//!
//! Production code sleeps on the tokio timer. Tests plug in
//! `TrackingSleeper`, which records each requested delay and returns
//! immediately. It is built for this crate's tests and, with the
//! `test-util` feature, for downstream ones.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

#[cfg(any(test, feature = "test-util"))]
use std::sync::{Arc, Mutex};
#[cfg(any(test, feature = "test-util"))]
use tokio_util::sync::CancellationToken;

/// Suspends the calling task for a given duration
#[async_trait]
pub trait Sleeper: Send + Sync + fmt::Debug {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Records requested delays without waiting
///
/// Clones share the same record. Optionally cancels a token once a given
/// number of sleeps has been requested, which bounds loops that would
/// otherwise never finish.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone, Default)]
pub struct TrackingSleeper {
    calls: Arc<Mutex<Vec<Duration>>>,
    cancel_after: Option<(usize, CancellationToken)>,
}

#[cfg(any(test, feature = "test-util"))]
impl TrackingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels `token` when the `count`-th sleep is requested
    pub fn cancel_after(count: usize, token: CancellationToken) -> Self {
        Self {
            calls: Arc::default(),
            cancel_after: Some((count, token)),
        }
    }

    /// All delays requested so far, in order
    pub fn recorded(&self) -> Vec<Duration> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn count(&self) -> usize {
        self.recorded().len()
    }

    pub fn total(&self) -> Duration {
        self.recorded().iter().sum()
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl Sleeper for TrackingSleeper {
    async fn sleep(&self, duration: Duration) {
        let count = {
            let mut calls = self
                .calls
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            calls.push(duration);
            calls.len()
        };

        if let Some((limit, token)) = &self.cancel_after {
            if count >= *limit {
                token.cancel();
            }
        }

        tokio::task::yield_now().await;
    }
}
