// src/slots/retry.rs
use std::future::Future;
use std::time::Duration;

use metrics::counter;

use crate::config::FetchConfig;
use crate::error::FetchError;

/// Bounded retry with a fixed delay; every attempt has its own timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration, timeout: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
            timeout,
        }
    }
}

impl From<&FetchConfig> for RetryPolicy {
    fn from(c: &FetchConfig) -> Self {
        Self::new(c.attempts, c.retry_delay(), c.timeout())
    }
}

/// Run `op` until it succeeds or the attempts run out. The last error is returned.
pub async fn fetch_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        counter!("slot_fetch_attempts_total").increment(1);

        let res = match tokio::time::timeout(policy.timeout, op()).await {
            Ok(r) => r,
            Err(_) => Err(FetchError::Timeout(policy.timeout.as_secs())),
        };

        match res {
            Ok(v) => return Ok(v),
            Err(e) if attempt < attempts => {
                tracing::warn!(
                    target: "slots",
                    %label, attempt, max = attempts, error = %e,
                    "fetch attempt failed, retrying"
                );
                tokio::time::sleep(policy.delay).await;
            }
            Err(e) => {
                counter!("slot_fetch_errors_total").increment(1);
                tracing::error!(
                    target: "slots",
                    %label, attempts, error = %e,
                    "fetch failed after all attempts"
                );
                return Err(e);
            }
        }
    }
}
