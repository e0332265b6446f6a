//! Retry with exponential backoff for channel calls.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::types::ChannelError;

/// Attempts and backoff for one channel call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first (at least 1).
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Backoff before the `retry`-th retry (1-based): `base * 2^(retry - 1)`.
    pub fn delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }
}

/// Backoff sleep. Swapped out in tests to observe delays without waiting.
pub trait Sleeper: Clone + Send + Sync + 'static {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Run `call` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts run out.
///
/// `cancel` is observed both during a call and during backoff; either way the
/// result is [`ChannelError::Cancelled`].
pub async fn with_retry<T, S, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &S,
    cancel: &CancellationToken,
    operation: &'static str,
    mut call: F,
) -> Result<T, ChannelError>
where
    S: Sleeper,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ChannelError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        debug!(operation, attempt, max_attempts, "channel call attempt");
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ChannelError::Cancelled),
            result = call() => result,
        };

        let err = match result {
            Ok(value) => {
                if attempt > 1 {
                    info!(operation, attempt, max_attempts, "channel call succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !err.is_retryable() || attempt >= max_attempts {
            error!(operation, attempt, max_attempts, error = %err, "channel call failed");
            return Err(err);
        }

        let delay = policy.delay(attempt);
        warn!(
            operation,
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "channel call failed, retrying"
        );
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                warn!(operation, attempt, "retry backoff cancelled");
                return Err(ChannelError::Cancelled);
            }
            () = sleeper.sleep(delay) => {}
        }
        attempt += 1;
    }
}
