use crate::domain::ports::Sleeper;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error};

/// Result of a single attempt, as seen by [`RetryDriver`]
#[derive(Debug)]
pub enum AttemptOutcome<T, E> {
    Ok(T),
    /// Failure worth another attempt
    Retryable(E),
    /// Failure that ends the loop immediately
    Fatal(E),
}

/// Linear backoff: after failed attempt `k` wait `base_delay * k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl BackoffPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay to wait after failed attempt `attempt` (1-based), or `None` when it was the last one.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        Some(self.base_delay.saturating_mul(attempt))
    }
}

/// Runs an operation until it succeeds, fails fatally, or the policy is exhausted.
pub struct RetryDriver<'a> {
    policy: BackoffPolicy,
    sleeper: &'a dyn Sleeper,
}

impl<'a> RetryDriver<'a> {
    pub fn new(policy: BackoffPolicy, sleeper: &'a dyn Sleeper) -> Self {
        Self { policy, sleeper }
    }

    /// `op` receives the 1-based attempt number. The last error observed is returned on failure.
    ///
    /// A policy with zero attempts still runs the operation once.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = AttemptOutcome<T, E>>,
    {
        let max = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                AttemptOutcome::Ok(value) => {
                    if attempt > 1 {
                        debug!("[{}] succeeded on attempt {}/{}", label, attempt, max);
                    }
                    return Ok(value);
                }
                AttemptOutcome::Fatal(e) => {
                    error!("[{}/{}] {} failed (not retryable): {}", attempt, max, label, e);
                    return Err(e);
                }
                AttemptOutcome::Retryable(e) => {
                    error!("[{}/{}] {} failed: {}", attempt, max, label, e);
                    match self.policy.delay_after(attempt) {
                        Some(delay) => {
                            self.sleeper.sleep(delay).await;
                            attempt += 1;
                        }
                        None => return Err(e),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock::RecordingSleeper;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_grows_linearly() {
        let policy = BackoffPolicy::new(4, Duration::from_millis(500));
        assert_eq!(policy.delay_after(1), Some(Duration::from_millis(500)));
        assert_eq!(policy.delay_after(2), Some(Duration::from_millis(1000)));
        assert_eq!(policy.delay_after(3), Some(Duration::from_millis(1500)));
        assert_eq!(policy.delay_after(4), None);
    }

    #[test]
    fn test_huge_base_delay_saturates() {
        let policy = BackoffPolicy::new(5, Duration::from_millis(u64::MAX));
        assert_eq!(policy.delay_after(1), Some(Duration::from_millis(u64::MAX)));
        assert_eq!(policy.delay_after(4), Some(Duration::MAX));
    }

    #[tokio::test]
    async fn test_fatal_stops_immediately() {
        let sleeper = RecordingSleeper::default();
        let driver = RetryDriver::new(BackoffPolicy::new(5, Duration::from_secs(1)), &sleeper);
        let calls = AtomicU32::new(0);

        let result: Result<(), String> = driver
            .run("op", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { AttemptOutcome::Fatal("bad input".to_string()) }
            })
            .await;

        assert_eq!(result, Err("bad input".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_returns_last_error_when_exhausted() {
        let sleeper = RecordingSleeper::default();
        let driver = RetryDriver::new(BackoffPolicy::new(3, Duration::from_millis(10)), &sleeper);

        let result: Result<(), String> = driver
            .run("op", |attempt| async move {
                AttemptOutcome::Retryable(format!("failure #{}", attempt))
            })
            .await;

        assert_eq!(result, Err("failure #3".to_string()));
        assert_eq!(
            sleeper.recorded(),
            vec![Duration::from_millis(10), Duration::from_millis(20)]
        );
    }
}
