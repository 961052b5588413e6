//! Bounded retry with linear backoff for remote calls.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use slugsync_core::{MAX_ATTEMPTS, READ_RETRY_BASE_MS, WRITE_RETRY_BASE_MS};
use slugsync_sitemap::FetchError;
use slugsync_storage::StorageError;

/// How many times to try, and how long to wait in between.
///
/// The wait before attempt `n + 1` is `base_delay × n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(attempts: u32, base_delay: Duration) -> Self {
        Self { attempts, base_delay }
    }

    /// Policy for store writes.
    #[must_use]
    pub const fn writes() -> Self {
        Self::new(MAX_ATTEMPTS, Duration::from_millis(WRITE_RETRY_BASE_MS))
    }

    /// Policy for backfill page reads and the sitemap index.
    #[must_use]
    pub const fn reads() -> Self {
        Self::new(MAX_ATTEMPTS, Duration::from_millis(READ_RETRY_BASE_MS))
    }

    /// Single attempt, no waiting.
    #[must_use]
    pub const fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Wait after the `failed_attempt`-th failure (1-based).
    #[must_use]
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        self.base_delay.saturating_mul(failed_attempt)
    }
}

/// Errors that know whether a retry could help.
pub(crate) trait Transient: Display {
    fn is_transient(&self) -> bool;
}

impl Transient for StorageError {
    fn is_transient(&self) -> bool {
        StorageError::is_transient(self)
    }
}

impl Transient for FetchError {
    fn is_transient(&self) -> bool {
        FetchError::is_transient(self)
    }
}

/// Run `op` until it succeeds, fails permanently, or `policy.attempts` is spent.
/// The last error is returned unchanged.
pub(crate) async fn retry_transient<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> Result<T, E>
where
    E: Transient,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt: u32 = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < attempts => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    operation,
                    attempt,
                    max_attempts = attempts,
                    ?delay,
                    error = %err,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt = attempt.saturating_add(1);
            },
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn backoff_is_linear_in_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(2), Duration::from_secs(4));
        assert_eq!(RetryPolicy::none().delay_after(5), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, StorageError> =
            retry_transient(&RetryPolicy::new(3, Duration::from_secs(1)), "test", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 { Err(StorageError::Unavailable("down".into())) } else { Ok(n) }
            })
            .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn attempts_are_bounded() {
        let calls = AtomicU32::new(0);
        let result: Result<(), StorageError> =
            retry_transient(&RetryPolicy::new(3, Duration::from_secs(1)), "test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(StorageError::Unavailable("still down".into()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), StorageError> =
            retry_transient(&RetryPolicy::new(3, Duration::from_secs(60)), "test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(StorageError::Rejected("bad row".into()))
            })
            .await;
        assert!(matches!(result, Err(StorageError::Rejected(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
