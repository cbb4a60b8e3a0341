//! Bounded retry for outbound calls

use std::fmt::Display;
use std::future::Future;

use tokio::time::{sleep, Duration};
use tracing::{info, warn};

/// How many times to try an operation and how long to wait in between
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Fixed pause between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Runs `operation` until it succeeds or the policy's attempts are used up
///
/// # Errors
///
/// Returns the error of the last attempt once `max_attempts` attempts have
/// failed.
pub async fn retry_with_backoff<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    info!(
                        attempt,
                        max_attempts = policy.max_attempts,
                        "Retry succeeded"
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                if attempt >= policy.max_attempts {
                    warn!(
                        max_attempts = policy.max_attempts,
                        error = %e,
                        "Retry failed after exhausting all attempts"
                    );
                    return Err(e);
                }

                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %e,
                    "Attempt failed, retrying in {:?}",
                    policy.delay
                );

                sleep(policy.delay).await;
            }
        }
    }
}
