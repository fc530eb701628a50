//! Bounded retry with exponential backoff
//!
//! Each attempt runs under the configured timeout. Timeouts and errors are
//! retried up to `max_retries` times; a [`RateLimited`] error doubles the
//! next delay. Exhausted retries are returned to the caller, which turns
//! them into a per-record failure.

use crate::config::RetryConfig;
use std::future::Future;
use std::time::Duration;

/// Error a backend returns when the remote side throttles it
#[derive(Debug, Clone, thiserror::Error)]
#[error("rate limited by remote service")]
pub struct RateLimited {
    /// Server-suggested wait, if any
    pub retry_after: Option<Duration>,
}

/// Error a single attempt exceeded its timeout
#[derive(Debug, Clone, thiserror::Error)]
#[error("attempt timed out after {0:?}")]
pub struct AttemptTimedOut(pub Duration);

/// Run `operation` until it succeeds or retries are exhausted
///
/// Returns the last error once `1 + max_retries` attempts have failed.
pub async fn retry_with_backoff<F, Fut, T>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let max_attempts = config.max_retries.saturating_add(1);
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let outcome = match tokio::time::timeout(config.timeout(), operation()).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::Error::new(AttemptTimedOut(config.timeout()))),
        };

        let err = match outcome {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if attempt >= max_attempts {
            tracing::warn!(
                operation = operation_name,
                attempts = attempt,
                error = %err,
                "Retries exhausted"
            );
            return Err(err);
        }

        let delay = next_delay(config, attempt, &err);
        crate::log_retry_attempt!(attempt, max_attempts, delay.as_millis() as u64, err);
        tokio::time::sleep(delay).await;
    }
}

fn next_delay(config: &RetryConfig, attempt: u32, err: &anyhow::Error) -> Duration {
    let base = config.delay_for(attempt);
    let Some(limited) = err.downcast_ref::<RateLimited>() else {
        return base;
    };

    let doubled = base.saturating_mul(2);
    let wanted = limited.retry_after.map_or(doubled, |after| after.max(doubled));
    wanted.min(Duration::from_millis(config.max_delay_ms.saturating_mul(2)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_config(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            backoff_multiplier: 2.0,
            timeout_ms: 50,
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result = retry_with_backoff(&fast_config(3), "test", || {
            let counter = Arc::clone(&counter);
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    anyhow::bail!("transient")
                }
                Ok(7)
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_return_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let err = retry_with_backoff(&fast_config(2), "test", || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(anyhow::anyhow!("down"))
            }
        })
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "down");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let err = retry_with_backoff(&fast_config(1), "test", || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await
        .unwrap_err();

        assert!(err.downcast_ref::<AttemptTimedOut>().is_some());
    }

    #[test]
    fn test_rate_limit_doubles_delay() {
        let config = RetryConfig::default();
        let plain = next_delay(&config, 1, &anyhow::anyhow!("boom"));
        let limited = next_delay(
            &config,
            1,
            &anyhow::Error::new(RateLimited { retry_after: None }),
        );
        assert_eq!(plain, Duration::from_millis(1000));
        assert_eq!(limited, Duration::from_millis(2000));
    }

    #[test]
    fn test_rate_limit_honours_retry_after() {
        let config = RetryConfig::default();
        let delay = next_delay(
            &config,
            1,
            &anyhow::Error::new(RateLimited {
                retry_after: Some(Duration::from_secs(10)),
            }),
        );
        assert_eq!(delay, Duration::from_secs(10));
    }
}
