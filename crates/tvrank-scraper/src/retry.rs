//! Bounded retry with linear back-off for transient HTTP failures.
//!
//! Only server-side transient statuses (500, 502, 503, 504) and
//! network-level failures (connect errors, timeouts) are retried. Every
//! other error is returned on the first occurrence.

use std::future::Future;
use std::time::Duration;

use crate::error::TransportError;

/// Statuses treated as transient server hiccups.
pub(crate) const RETRIABLE_STATUSES: [u16; 4] = [500, 502, 503, 504];

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:** [`TransportError::Timeout`], [`TransportError::Network`],
/// and [`TransportError::Status`] with a status in [`RETRIABLE_STATUSES`].
///
/// **Not retriable:** any other status (4xx, 501, ...), invalid URLs, and
/// client construction failures.
pub(crate) fn is_retriable(err: &TransportError) -> bool {
    match err {
        TransportError::Timeout { .. } | TransportError::Network { .. } => true,
        TransportError::Status { status, .. } => RETRIABLE_STATUSES.contains(status),
        TransportError::InvalidUrl { .. } | TransportError::Client(_) => false,
    }
}

/// Delay before retry number `attempt` (1-based): `backoff_base_ms * attempt`.
pub(crate) fn backoff_delay(backoff_base_ms: u64, attempt: u32) -> Duration {
    Duration::from_millis(backoff_base_ms.saturating_mul(u64::from(attempt)))
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors.
///
/// Back-off schedule with `backoff_base_ms = 100`:
///
/// | Retry | Sleep before it |
/// |-------|-----------------|
/// | 1     | 100 ms          |
/// | 2     | 200 ms          |
/// | 3     | 300 ms          |
///
/// With `max_retries = 5` the operation runs at most 6 times. When retries
/// are exhausted the last error is returned unchanged.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, TransportError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay = backoff_delay(backoff_base_ms, attempt);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient transport error, retrying after back-off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
