//! Exponential backoff around snapshot fetches.
//!
//! Only transient failures (network, upstream 5xx, half-written JSON) are
//! retried. Anything else is returned on the first attempt. Exhausting the
//! retries hands the last error back to the poll loop, which skips the cycle.
//! Backoff waits end early on shutdown.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::{PlayByPlayDocument, SnapshotFetcher};
use crate::coordination::ShutdownHandle;
use crate::error::{BotError, Result};

/// Configuration for exponential backoff retry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,

    /// Initial delay before the first retry.
    pub initial_delay: Duration,

    /// Maximum delay between retries (cap for exponential growth).
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (typically 2.0).
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// 3 retries with 1s, 2s, 4s delays
    pub const DEFAULT: Self = Self {
        max_retries: 3,
        initial_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(8),
        backoff_multiplier: 2.0,
    };

    /// No retries at all
    pub const NONE: Self = Self {
        max_retries: 0,
        initial_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
        backoff_multiplier: 1.0,
    };

    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::DEFAULT
        }
    }

    /// Computes the delay for the given retry attempt (0-indexed).
    ///
    /// The delay grows exponentially: `initial_delay * backoff_multiplier^attempt`,
    /// capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = self.backoff_multiplier.powi(attempt as i32);
        let delay_secs = self.initial_delay.as_secs_f64() * multiplier;
        let capped_secs = delay_secs.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped_secs)
    }

    /// Returns an iterator over all retry delays.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(|attempt| self.delay_for_attempt(attempt))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Wraps a fetcher with the retry policy
pub struct RetryingFetcher<F: ?Sized> {
    inner: Arc<F>,
    config: RetryConfig,
    shutdown: ShutdownHandle,
}

impl<F: SnapshotFetcher + ?Sized> RetryingFetcher<F> {
    pub fn new(inner: Arc<F>, config: RetryConfig, shutdown: ShutdownHandle) -> Self {
        Self {
            inner,
            config,
            shutdown,
        }
    }
}

#[async_trait]
impl<F: SnapshotFetcher + ?Sized> SnapshotFetcher for RetryingFetcher<F> {
    async fn fetch(&self, game_id: u64) -> Result<PlayByPlayDocument> {
        let mut delays = self.config.delays();
        let mut attempt = 1;
        loop {
            match self.inner.fetch(game_id).await {
                Ok(doc) => return Ok(doc),
                Err(e) if e.is_transient() => match delays.next() {
                    Some(delay) => {
                        warn!(
                            game_id,
                            attempt,
                            "snapshot fetch failed ({}), retrying in {:?}",
                            e,
                            delay
                        );
                        if !self.shutdown.sleep(delay).await {
                            return Err(BotError::Cancelled);
                        }
                        attempt += 1;
                    }
                    None => return Err(e),
                },
                Err(e) => return Err(e),
            }
        }
    }
}
