use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::types::HuntsmanError;

/// Retry configuration for provider fetch operations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: 3 }
    }
}

/// Exponential backoff with random jitter (0-1s), capped at 30s.
fn backoff_delay(attempt: u32) -> Duration {
    let base: f64 = 2.0_f64.powi(attempt as i32);
    let jitter: f64 = rand::random::<f64>();
    Duration::from_secs_f64((base + jitter).min(30.0))
}

/// Execute an async operation with retry logic.
///
/// Retries only if the error is retryable and we haven't exceeded
/// max_retries. Callers that fail soft (the source fetchers) still fall back
/// to their on-disk cache after the final attempt.
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    config: &RetryConfig,
    mut factory: F,
) -> Result<T, HuntsmanError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, HuntsmanError>>,
{
    let max_attempts = config.max_retries + 1;
    let mut last_error = None;

    for attempt in 0..max_attempts {
        match factory().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !e.is_retryable() || attempt + 1 >= max_attempts {
                    if !e.is_retryable() {
                        warn!(
                            operation = operation_name,
                            "Non-retryable error, failing immediately"
                        );
                    } else {
                        warn!(
                            operation = operation_name,
                            attempt = attempt + 1,
                            max = max_attempts,
                            "Max retries exhausted"
                        );
                    }
                    return Err(e);
                }

                let delay = backoff_delay(attempt);
                warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    max = max_attempts,
                    delay_secs = delay.as_secs(),
                    error = %e,
                    "Retrying after error"
                );

                tokio::time::sleep(delay).await;
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| HuntsmanError::Internal("Retry loop exited unexpectedly".into())))
}
