//! Fixed-delay retry for collaborator calls (publishing, judge requests).

use std::future::Future;
use std::time::Duration;

use crate::config::PublishPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&PublishPolicy::default())
    }
}

impl From<&PublishPolicy> for RetryConfig {
    fn from(policy: &PublishPolicy) -> Self {
        Self {
            max_attempts: policy.max_attempts.max(1),
            delay: policy.backoff(),
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub const fn can_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Result of the last attempt and how many attempts were made.
#[derive(Debug)]
pub struct Retried<T, E> {
    pub attempts: u32,
    pub result: Result<T, E>,
}

/// Run `op` until it succeeds or `config.max_attempts` is reached, sleeping
/// `config.delay` between attempts. No delay follows the final attempt.
pub async fn retry_with_backoff<T, E, F, Fut>(config: RetryConfig, op: F) -> Retried<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_if(config, op, |_| true).await
}

/// Like [`retry_with_backoff`], but gives up at once on errors for which
/// `should_retry` returns false.
pub async fn retry_if<T, E, F, Fut, P>(config: RetryConfig, mut op: F, should_retry: P) -> Retried<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => {
                return Retried {
                    attempts: attempt,
                    result: Ok(value),
                }
            }
            Err(e) => {
                tracing::warn!("❌ Attempt {}/{} failed: {}", attempt, config.max_attempts, e);
                if !config.can_retry(attempt) || !should_retry(&e) {
                    return Retried {
                        attempts: attempt,
                        result: Err(e),
                    };
                }
                tokio::time::sleep(config.delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn config() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_from_policy_keeps_at_least_one_attempt() {
        let policy = PublishPolicy {
            max_attempts: 0,
            ..PublishPolicy::default()
        };
        assert_eq!(RetryConfig::from(&policy).max_attempts, 1);
        assert_eq!(RetryConfig::default(), config());
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let start = Instant::now();

        let retried = retry_with_backoff(config(), |_| async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err("rate limited")
            } else {
                Ok("post-1")
            }
        })
        .await;

        assert_eq!(retried.attempts, 3);
        assert_eq!(retried.result, Ok("post-1"));
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_without_trailing_delay() {
        let start = Instant::now();
        let retried: Retried<(), _> = retry_with_backoff(config(), |attempt| async move {
            Err(format!("failure {}", attempt))
        })
        .await;

        assert_eq!(retried.attempts, 3);
        assert_eq!(retried.result.unwrap_err(), "failure 3");
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_if_stops_on_permanent_error() {
        let start = Instant::now();
        let retried: Retried<(), _> = retry_if(
            config(),
            |attempt| async move { Err(format!("{} bad request", attempt)) },
            |e: &String| !e.contains("bad request"),
        )
        .await;

        assert_eq!(retried.attempts, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
