//! Retry policy: attempt budget and backoff schedule

use rand::Rng;
use std::time::Duration;
use thiserror::Error;

/// Attempt budget and delay growth for retried calls
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Growth factor applied to the delay after each retry
    pub backoff_multiplier: f64,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Exclusive upper bound of the random amount added to each grown delay
    pub jitter: Duration,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    #[error("max_attempts must be at least 1 (got {0})")]
    InvalidMaxAttempts(u32),

    #[error("backoff_multiplier must be greater than 1 (got {0})")]
    InvalidMultiplier(f64),

    #[error("initial_delay ({initial:?}) must not exceed max_delay ({max:?})")]
    InitialDelayExceedsMax { initial: Duration, max: Duration },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            initial_delay: Duration::from_secs(4),
            backoff_multiplier: 1.5,
            max_delay: Duration::from_secs(60),
            jitter: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Policy with the given budget and first delay, other fields defaulted
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Result<Self, PolicyError> {
        let policy = Self {
            max_attempts,
            initial_delay,
            ..Self::default()
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Disables jitter, making the delay sequence deterministic
    pub fn without_jitter(self) -> Self {
        self.with_jitter(Duration::ZERO)
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.max_attempts == 0 {
            return Err(PolicyError::InvalidMaxAttempts(self.max_attempts));
        }

        if !(self.backoff_multiplier.is_finite() && self.backoff_multiplier > 1.0) {
            return Err(PolicyError::InvalidMultiplier(self.backoff_multiplier));
        }

        if self.initial_delay > self.max_delay {
            return Err(PolicyError::InitialDelayExceedsMax {
                initial: self.initial_delay,
                max: self.max_delay,
            });
        }

        Ok(())
    }

    /// Delay before the second attempt, never above `max_delay`
    pub fn first_delay(&self) -> Duration {
        self.initial_delay.min(self.max_delay)
    }

    /// Delay that follows `current`, given a jitter sample
    ///
    /// `min(current * multiplier + jitter, max_delay)`. A multiplier below 1
    /// (or NaN) is treated as 1 so delays never shrink.
    pub fn next_delay(&self, current: Duration, jitter: Duration) -> Duration {
        let multiplier = self.backoff_multiplier.max(1.0);
        let grown = Duration::try_from_secs_f64(current.as_secs_f64() * multiplier)
            .unwrap_or(self.max_delay);
        grown.saturating_add(jitter).min(self.max_delay)
    }

    /// Draws a jitter sample in `[0, jitter)`
    pub fn sample_jitter(&self) -> Duration {
        let bound = self.jitter.as_nanos().min(u64::MAX as u128) as u64;
        if bound == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(rand::thread_rng().gen_range(0..bound))
    }

    /// Pre-jitter delays between attempts, in order
    ///
    /// Yields `max_attempts - 1` values: one per retry.
    pub fn backoff_schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        let retries = self.max_attempts.saturating_sub(1) as usize;
        std::iter::successors(Some(self.first_delay()), move |d| {
            Some(self.next_delay(*d, Duration::ZERO))
        })
        .take(retries)
    }
}
