//! Retry loop with cancellation between attempts.

use super::classify::classify;
use super::error::FetchError;
use super::policy::{RetryDecision, RetryPolicy};
use crate::control::CancelToken;

/// Runs `f` until it succeeds, the policy gives up, or `cancel` fires.
/// Backoff sleeps are cut into short slices so cancellation is noticed quickly.
pub fn run_with_retry<T, F>(policy: &RetryPolicy, cancel: &CancelToken, mut f: F) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Result<T, FetchError>,
{
    let mut attempt = 1u32;
    loop {
        if cancel.is_cancelled() {
            return Err(FetchError::Aborted);
        }
        let err = match f(attempt) {
            Ok(v) => return Ok(v),
            Err(e) => e,
        };
        match policy.decide(attempt, classify(&err)) {
            RetryDecision::NoRetry => return Err(err),
            RetryDecision::RetryAfter(delay) => {
                tracing::debug!(attempt, ?delay, error = %err, "retrying after backoff");
                sleep_unless_cancelled(delay, cancel);
                attempt += 1;
            }
        }
    }
}

fn sleep_unless_cancelled(total: std::time::Duration, cancel: &CancelToken) {
    let slice = std::time::Duration::from_millis(50);
    let deadline = std::time::Instant::now() + total;
    while !cancel.is_cancelled() {
        let now = std::time::Instant::now();
        if now >= deadline {
            break;
        }
        std::thread::sleep(slice.min(deadline - now));
    }
}
