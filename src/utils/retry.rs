//! Exponential backoff around fallible async operations.

use std::future::Future;
use std::time::Duration;

use tokio_retry::Retry;
use tracing::{debug, warn};

use crate::errors::RelayError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero behaves like one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for every later gap.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }
}

/// Delays between consecutive attempts: `base, 2*base, 4*base, ...`,
/// one fewer than the number of attempts. No jitter, no cap.
pub fn backoff_schedule(policy: &RetryPolicy) -> impl Iterator<Item = Duration> + use<> {
    let base = policy.base_delay;
    let gaps = policy.max_attempts.max(1) - 1;
    (0..gaps).map(move |idx| base.saturating_mul(2u32.saturating_pow(idx)))
}

/// Run `operation` until it succeeds or the attempt budget is spent.
///
/// The error of the final attempt is returned unchanged. Each scheduled retry
/// is logged with its attempt number and delay.
///
/// # Errors
///
/// Returns the last error produced by `operation` once every attempt failed.
pub async fn with_backoff<F, Fut, T>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, RelayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RelayError>>,
{
    let strategy = backoff_schedule(policy).enumerate().map(|(idx, delay)| {
        warn!(
            operation = label,
            attempt = idx + 1,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "Attempt failed, retrying after backoff"
        );
        delay
    });

    Retry::spawn(strategy, move || {
        let attempt = operation();
        async move {
            attempt.await.inspect_err(|e| {
                debug!(operation = label, error = %e, "Attempt error");
            })
        }
    })
    .await
}
