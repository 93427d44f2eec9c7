//! Request pacing and bounded retries around backend calls.
//!
//! Both live outside [`crate::llm`] so that status classification and retry
//! policy can be tested separately.

use std::future::Future;
use std::time::Duration;

use critique_core::{CritiqueError, ReviewConfig};
use tokio::time::sleep;
use tracing::{debug, warn};

/// Fixed delay between successive API calls.
///
/// The first call goes out immediately; every later call waits `delay`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use critique_review::pacing::Pacer;
///
/// let pacer = Pacer::new(Duration::from_secs(1));
/// assert_eq!(pacer.delay(), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone)]
pub struct Pacer {
    delay: Duration,
    calls: usize,
}

impl Pacer {
    /// Create a pacer that waits `delay` before every call after the first.
    pub fn new(delay: Duration) -> Self {
        Self { delay, calls: 0 }
    }

    /// The configured pause between calls.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait as needed before the next call.
    pub async fn wait(&mut self) {
        if self.calls > 0 && !self.delay.is_zero() {
            debug!(delay_ms = self.delay.as_millis() as u64, "pacing before next request");
            sleep(self.delay).await;
        }
        self.calls += 1;
    }
}

/// How many times to retry a transient failure, and how long to back off.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use critique_review::pacing::RetryPolicy;
///
/// let policy = RetryPolicy::new(3, Duration::from_millis(100));
/// assert_eq!(policy.backoff(0), Duration::from_millis(100));
/// assert_eq!(policy.backoff(2), Duration::from_millis(400));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first; zero disables retrying.
    pub max_retries: u32,
    /// Pause before the first retry.
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    /// Create a policy with `max_retries` extra attempts, starting at
    /// `initial_backoff`.
    pub fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Take `max_retries` and `retry_backoff_ms` from the review settings.
    pub fn from_config(config: &ReviewConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.retry_backoff_ms),
        )
    }

    /// Backoff before retry number `retry` (zero-based), doubling each time.
    pub fn backoff(&self, retry: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(retry.min(16)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Run `op`, retrying transient failures according to `policy`.
///
/// Only errors for which [`CritiqueError::is_transient`] holds are retried;
/// anything else is returned straight away. The last error is returned once
/// retries are exhausted.
///
/// # Errors
///
/// Propagates the final error from `op`.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, CritiqueError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CritiqueError>>,
{
    let mut retry = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && retry < policy.max_retries => {
                let backoff = policy.backoff(retry);
                warn!(
                    error = %e,
                    attempt = retry + 1,
                    backoff_ms = backoff.as_millis() as u64,
                    "transient failure, retrying"
                );
                sleep(backoff).await;
                retry += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::Instant;

    fn fast(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn success_needs_one_attempt() {
        let calls = Cell::new(0);
        let result = with_retry(&fast(3), || {
            calls.set(calls.get() + 1);
            async { Ok::<_, CritiqueError>("done") }
        })
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let calls = Cell::new(0);
        let result = with_retry(&fast(3), || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n < 3 {
                    Err(CritiqueError::RateLimited)
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let calls = Cell::new(0);
        let result: Result<(), _> = with_retry(&fast(2), || {
            calls.set(calls.get() + 1);
            async { Err(CritiqueError::ServiceOverloaded) }
        })
        .await;
        assert!(matches!(result, Err(CritiqueError::ServiceOverloaded)));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn fatal_errors_are_not_retried() {
        let calls = Cell::new(0);
        let result: Result<(), _> = with_retry(&fast(5), || {
            calls.set(calls.get() + 1);
            async { Err(CritiqueError::Authentication) }
        })
        .await;
        assert!(matches!(result, Err(CritiqueError::Authentication)));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn zero_retries_means_one_attempt() {
        let calls = Cell::new(0);
        let result: Result<(), _> = with_retry(&RetryPolicy::none(), || {
            calls.set(calls.get() + 1);
            async { Err(CritiqueError::RateLimited) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::new(4, Duration::from_millis(250));
        assert_eq!(policy.backoff(0), Duration::from_millis(250));
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(3), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn first_wait_is_immediate() {
        let mut pacer = Pacer::new(Duration::from_secs(30));
        let start = Instant::now();
        pacer.wait().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn later_waits_sleep_for_delay() {
        let mut pacer = Pacer::new(Duration::from_millis(50));
        pacer.wait().await;
        let start = Instant::now();
        pacer.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
