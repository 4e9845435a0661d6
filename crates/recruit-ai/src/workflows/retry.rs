//! Bounded retry with exponential backoff for calls into external collaborators
//! (calendar availability, sourcing campaigns).

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::config::ConfigError;

/// Failure reported by an external collaborator.
///
/// `retryable` separates outages and timeouts from definitive rejections; only the former are
/// retried, and exhaustion is surfaced instead of being masked as an empty result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} failed: {message}")]
pub struct CollaboratorError {
    pub operation: String,
    pub message: String,
    pub retryable: bool,
}

impl CollaboratorError {
    pub fn unavailable(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rejected(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
            retryable: false,
        }
    }

    fn timed_out(operation: &str, timeout: Duration) -> Self {
        Self::unavailable(
            operation,
            format!("no response within {} ms", timeout.as_millis()),
        )
    }

    fn exhausted(self, attempts: u32) -> Self {
        Self {
            message: format!("{} (gave up after {attempts} attempt(s))", self.message),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            timeout: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::invalid(
                "retry.max_attempts",
                "must allow at least one attempt",
            ));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::invalid("retry.timeout", "must be positive"));
        }
        Ok(())
    }

    /// Backoff after the given 1-based attempt: base, 2x base, 4x base, ...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }

    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, CollaboratorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CollaboratorError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let error = match tokio::time::timeout(self.timeout, call()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(error)) if !error.retryable => return Err(error),
                Ok(Err(error)) => error,
                Err(_) => CollaboratorError::timed_out(operation, self.timeout),
            };

            if attempt >= attempts {
                return Err(error.exhausted(attempt));
            }

            let delay = self.delay_for(attempt);
            warn!(
                operation,
                attempt,
                max_attempts = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "collaborator call failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
