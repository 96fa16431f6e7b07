//! Retry logic with exponential backoff

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};
use crate::errors::BotResult;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30000),
            backoff_factor: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryConfig {
    /// Budget used around swap submission.
    pub fn swaps() -> Self {
        Self {
            max_attempts: 5,
            ..Default::default()
        }
    }
}

pub struct RetryExecutor {
    config: RetryConfig,
    context: String,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        let config = RetryConfig {
            max_attempts: config.max_attempts.max(1),
            backoff_factor: config.backoff_factor.max(1.0),
            jitter_factor: config.jitter_factor.clamp(0.0, 1.0),
            ..config
        };
        Self {
            config,
            context: "operation".to_string(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Backoff to wait after the attempt with index `attempt` failed.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let initial_ms = self.config.initial_delay.as_millis() as f64;
        let max_ms = self.config.max_delay.as_millis() as f64;
        let base_ms = (initial_ms * self.config.backoff_factor.powi(exponent)).min(max_ms);

        if self.config.jitter_factor == 0.0 {
            return Duration::from_millis(base_ms as u64);
        }

        let spread: f64 = rand::rng().random_range(-1.0..=1.0);
        let jittered = base_ms + base_ms * self.config.jitter_factor * spread;
        Duration::from_millis(jittered.max(0.0).floor() as u64)
    }

    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> BotResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = BotResult<T>>,
    {
        let max_attempts = self.config.max_attempts;
        let mut attempt = 0;

        loop {
            info!(context = %self.context, attempt = attempt + 1, max_attempts, "Attempting operation");

            let err = match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        info!(context = %self.context, attempts = attempt + 1, "Operation succeeded after retries");
                    }
                    return Ok(result);
                }
                Err(e) => e,
            };

            if !err.retryable() {
                error!(
                    context = %self.context,
                    attempt = attempt + 1,
                    kind = ?err.kind(),
                    error = %err,
                    "Fatal error, stopping retries"
                );
                return Err(err);
            }

            if attempt + 1 >= max_attempts {
                error!(
                    context = %self.context,
                    attempts = max_attempts,
                    error = %err,
                    "Operation failed after all attempts"
                );
                return Err(err);
            }

            let next_delay = self.calculate_delay(attempt);
            warn!(
                context = %self.context,
                attempt = attempt + 1,
                error = %err,
                next_delay_ms = next_delay.as_millis() as u64,
                "Operation failed, retrying"
            );
            tokio::time::sleep(next_delay).await;
            attempt += 1;
        }
    }
}

pub async fn with_retry<F, Fut, T>(operation: F, config: RetryConfig) -> BotResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = BotResult<T>>,
{
    RetryExecutor::new(config).execute(operation).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BotError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn deterministic() -> RetryExecutor {
        RetryExecutor::new(RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1000),
            backoff_factor: 2.0,
            jitter_factor: 0.0,
        })
    }

    #[test]
    fn delay_grows_exponentially() {
        let retry = deterministic();
        assert_eq!(retry.calculate_delay(0), Duration::from_millis(100));
        assert_eq!(retry.calculate_delay(1), Duration::from_millis(200));
        assert_eq!(retry.calculate_delay(2), Duration::from_millis(400));
    }

    #[test]
    fn delay_is_capped() {
        assert_eq!(deterministic().calculate_delay(10), Duration::from_millis(1000));
        assert_eq!(deterministic().calculate_delay(u32::MAX), Duration::from_millis(1000));
    }

    #[test]
    fn invalid_config_is_normalised() {
        let retry = RetryExecutor::new(RetryConfig {
            max_attempts: 0,
            backoff_factor: 0.5,
            jitter_factor: 3.0,
            ..Default::default()
        });
        assert_eq!(retry.config().max_attempts, 1);
        assert_eq!(retry.config().backoff_factor, 1.0);
        assert_eq!(retry.config().jitter_factor, 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_first_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = deterministic()
            .execute(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, BotError>("success")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = deterministic()
            .execute(|| {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(BotError::network("fail"))
                    } else {
                        Ok("success")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: BotResult<()> = deterministic()
            .execute(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(BotError::network("fail"))
                }
            })
            .await;

        assert!(matches!(result, Err(BotError::Network { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: BotResult<()> = deterministic()
            .execute(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(BotError::InsufficientFunds {
                        details: "insufficient funds".to_string(),
                    })
                }
            })
            .await;

        assert!(result.unwrap_err().is_fatal_funds());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn with_retry_wraps_a_single_execution() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let config = RetryConfig {
            max_attempts: 2,
            ..Default::default()
        };
        let result = with_retry(
            || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(BotError::network("fail"))
                    } else {
                        Ok(42)
                    }
                }
            },
            config,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn jittered_delay_stays_within_band(attempt in 0u32..20, jitter in 0.0f64..=1.0) {
                let retry = RetryExecutor::new(RetryConfig {
                    max_attempts: 5,
                    initial_delay: Duration::from_millis(100),
                    max_delay: Duration::from_millis(5000),
                    backoff_factor: 2.0,
                    jitter_factor: jitter,
                });
                let base = (100.0 * 2f64.powi(attempt as i32)).min(5000.0);
                let delay = retry.calculate_delay(attempt).as_millis() as f64;
                prop_assert!(delay <= base * (1.0 + jitter) + 1.0);
                prop_assert!(delay >= (base * (1.0 - jitter)).floor() - 1.0);
            }
        }
    }
}
