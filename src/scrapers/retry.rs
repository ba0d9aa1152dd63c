use crate::config::ScrapeConfig;
use std::future::Future;
use std::time::Duration;

/// Bounds for retrying DOM reads against a live, possibly-mutating page.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Fixed pause between attempts
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self {
            max_attempts: config.max_retries,
            backoff: config.retry_backoff(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Runs `op`, retrying with a fixed backoff while `is_transient` classifies
/// the failure as retryable and attempts remain. The terminal failure is
/// returned to the caller as-is; nothing is swallowed.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    is_transient: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_attempts && is_transient(&e) => {
                ::log::debug!(
                    "Transient failure on attempt {} of {}, retrying",
                    attempt,
                    policy.max_attempts
                );
                tokio::time::sleep(policy.backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Whether a WebDriver failure means the element reference was detached or
/// replaced between lookup and read
pub fn is_stale(error: &fantoccini::error::CmdError) -> bool {
    error.to_string().to_lowercase().contains("stale element")
}
