//! Retry with exponential back-off and jitter for read-only storefront calls.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries on
//! transient errors (network failures, 429, 5xx). Everything else is returned
//! immediately. A 429 with a `Retry-After` in seconds waits that long
//! instead of the computed back-off. Cart mutations never go through here:
//! the mutation protocol owns their retries.

use std::future::Future;
use std::time::Duration;

use crate::error::HttpProviderError;

const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:** timeouts, connection failures, HTTP 429, HTTP 5xx.
///
/// **Not retriable:** other 4xx statuses, malformed bodies, and a bad base
/// URL. Retrying won't change the answer.
pub(crate) fn is_retriable(err: &HttpProviderError) -> bool {
    match err {
        HttpProviderError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        HttpProviderError::RateLimited { .. } => true,
        HttpProviderError::UnexpectedStatus { status, .. } => *status >= 500,
        HttpProviderError::Deserialize { .. } | HttpProviderError::InvalidBaseUrl { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient
/// errors.
///
/// The sleep before retry `n` is `backoff_base_ms × 2^(n-1)` with ±25 %
/// jitter, or the server's `Retry-After` when one was given. Either is capped
/// at 60 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, HttpProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, HttpProviderError>>,
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
                let delay_ms = match &err {
                    HttpProviderError::RateLimited {
                        retry_after_secs: Some(secs),
                        ..
                    } => secs.saturating_mul(1_000).min(MAX_DELAY_MS),
                    _ => jittered_delay_ms(backoff_base_ms, attempt),
                };
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "storefront transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn jittered_delay_ms(backoff_base_ms: u64, attempt: u32) -> u64 {
    let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64
}
