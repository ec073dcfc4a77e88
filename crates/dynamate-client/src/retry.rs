//! Retry with exponential back-off and jitter for idempotent backend reads.
//!
//! Only GET requests go through [`retry_with_backoff`]. Scheduling, simulation,
//! and revert calls are sent exactly once: a retried `POST /apply-schedule`
//! could schedule the same price change twice.

use std::future::Future;
use std::time::Duration;

use crate::error::ClientError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - Network-level failures: timeout, connection refused or reset.
/// - HTTP 5xx and 429 responses.
///
/// **Not retriable:**
/// - [`ClientError::NotFound`] and other 4xx statuses.
/// - [`ClientError::Deserialize`]: the backend answered, retrying won't fix the shape.
/// - [`ClientError::InvalidBaseUrl`]: configuration error.
pub(crate) fn is_retriable(err: &ClientError) -> bool {
    match err {
        ClientError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        ClientError::UnexpectedStatus { status, .. } => *status >= 500 || *status == 429,
        ClientError::NotFound { .. }
        | ClientError::Deserialize { .. }
        | ClientError::InvalidBaseUrl { .. } => false,
    }
}

/// Upper bound on a single back-off sleep.
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Sleep taken after the `retry`-th failure (1-based).
///
/// The nominal delay doubles per retry starting from `base_ms`, is clamped to
/// [`MAX_DELAY`], then scaled by a random factor in `[0.75, 1.25)`.
fn backoff_delay(retry: u32, base_ms: u64) -> Duration {
    let doublings = retry.saturating_sub(1).min(10);
    let nominal = Duration::from_millis(base_ms.saturating_mul(1u64 << doublings)).min(MAX_DELAY);
    nominal.mul_f64(0.75 + rand::random::<f64>() * 0.5)
}

/// Calls `operation` until it succeeds, fails with a non-transient error, or
/// has been retried `max_retries` times; the last error is returned.
///
/// With `backoff_base_ms = 500` the sleeps are roughly 0.5 s, 1 s, 2 s, 4 s
/// and so on, each jittered and never above 30 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut retries = 0u32;
    let err = loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if retries == max_retries || !is_retriable(&err) {
            break err;
        }
        retries += 1;
        let delay = backoff_delay(retries, backoff_base_ms);
        tracing::warn!(
            retry = retries,
            of = max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "transient backend error; sleeping before next GET attempt"
        );
        tokio::time::sleep(delay).await;
    };
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn server_error() -> ClientError {
        ClientError::UnexpectedStatus {
            status: 503,
            url: "http://localhost/tags".to_owned(),
            body: String::new(),
        }
    }

    #[test]
    fn server_errors_are_retriable() {
        assert!(is_retriable(&server_error()));
        assert!(is_retriable(&ClientError::UnexpectedStatus {
            status: 429,
            url: String::new(),
            body: String::new(),
        }));
    }

    #[test]
    fn client_errors_are_not_retriable() {
        assert!(!is_retriable(&ClientError::UnexpectedStatus {
            status: 400,
            url: String::new(),
            body: String::new(),
        }));
        assert!(!is_retriable(&ClientError::NotFound {
            url: "http://localhost/preview".to_owned()
        }));
    }

    #[test]
    fn deserialize_error_is_not_retriable() {
        let src = serde_json::from_str::<()>("invalid").unwrap_err();
        assert!(!is_retriable(&ClientError::Deserialize {
            context: "test".to_owned(),
            source: src,
        }));
    }

    #[test]
    fn backoff_delay_doubles_within_jitter_and_caps() {
        for _ in 0..50 {
            let first = backoff_delay(1, 400);
            assert!(first >= Duration::from_millis(299) && first <= Duration::from_millis(501));
            let third = backoff_delay(3, 400);
            assert!(third >= Duration::from_millis(1199) && third <= Duration::from_millis(2001));
            let huge = backoff_delay(40, 10_000);
            assert!(huge >= Duration::from_millis(22_499) && huge <= Duration::from_millis(37_501));
        }
    }

    #[test]
    fn zero_base_means_no_sleep() {
        assert_eq!(backoff_delay(5, 0), Duration::ZERO);
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, ClientError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(server_error())
                } else {
                    Ok::<u32, ClientError>(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99, "should succeed after retries");
        assert_eq!(
            calls.load(Ordering::SeqCst),
            3,
            "should have been called 3 times (2 failures + 1 success)"
        );
    }

    #[tokio::test]
    async fn propagates_last_error_after_exhausting_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(server_error())
            }
        })
        .await;
        // max_retries=2 → 3 total attempts
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            result,
            Err(ClientError::UnexpectedStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn does_not_retry_not_found() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(ClientError::NotFound {
                    url: "http://localhost/preview".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1, "NotFound must not be retried");
        assert!(matches!(result, Err(ClientError::NotFound { .. })));
    }
}
