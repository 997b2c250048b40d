//! Retry executor with exponential backoff
//!
//! Wraps remote operations in a bounded attempt loop. Delays grow as
//! `base_delay * 2^(attempt-1)` up to a ceiling, with no jitter. The final
//! error is returned unchanged so callers can pattern-match on the root
//! cause; non-retryable errors short-circuit without consuming attempts.

use std::future::Future;
use std::time::Duration;

use fleetpdm_domain::{FleetPdmError, Result, WarehouseConfig};
use tokio::time::sleep;
use tracing::{info, warn};

const MIN_MAX_ATTEMPTS: u32 = 1;
const MAX_MAX_ATTEMPTS: u32 = 10;
const MAX_BACKOFF_EXPONENT: u32 = 8;

/// Bounded-retry executor shared by the connection manager and the query
/// execution layer.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self {
            max_attempts: fleetpdm_domain::constants::DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(
                fleetpdm_domain::constants::DEFAULT_RETRY_BASE_DELAY_MS,
            ),
            max_delay: Duration::from_millis(
                fleetpdm_domain::constants::DEFAULT_RETRY_MAX_DELAY_MS,
            ),
        }
    }
}

impl RetryExecutor {
    /// Create a custom executor with validation.
    ///
    /// # Errors
    /// Returns `Config` when the attempt budget is out of range or the
    /// base delay exceeds the ceiling.
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Result<Self> {
        if !(MIN_MAX_ATTEMPTS..=MAX_MAX_ATTEMPTS).contains(&max_attempts) {
            return Err(FleetPdmError::Config(format!(
                "max_attempts must be between {MIN_MAX_ATTEMPTS} and {MAX_MAX_ATTEMPTS}, \
                 got {max_attempts}"
            )));
        }
        if base_delay > max_delay {
            return Err(FleetPdmError::Config(format!(
                "base_delay ({base_delay:?}) cannot be greater than max_delay ({max_delay:?})"
            )));
        }
        Ok(Self { max_attempts, base_delay, max_delay })
    }

    /// Build an executor from the warehouse retry settings.
    ///
    /// # Errors
    /// Propagates the validation in [`RetryExecutor::new`].
    pub fn from_config(config: &WarehouseConfig) -> Result<Self> {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.retry_base_delay_ms),
            Duration::from_millis(fleetpdm_domain::constants::DEFAULT_RETRY_MAX_DELAY_MS),
        )
    }

    /// Run `op` up to the attempt budget.
    ///
    /// Every failed attempt is logged with the operation name and attempt
    /// counters before the backoff sleep; a success after at least one
    /// failure logs a recovery line naming the attempt.
    ///
    /// # Errors
    /// The error from the final attempt, unchanged.
    pub async fn execute<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt: u32 = 1;
        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(operation, attempt, "operation recovered after retry");
                    }
                    return Ok(value);
                }
                Err(attempt_error) if !attempt_error.is_retryable() => {
                    return Err(attempt_error);
                }
                Err(attempt_error) => {
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %attempt_error,
                        "attempt failed"
                    );
                    if attempt >= self.max_attempts {
                        return Err(attempt_error);
                    }
                    sleep(self.backoff_delay(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Delay before the retry following failed attempt number `attempt`.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
        let multiplier = 1u32 << shift;
        self.base_delay.saturating_mul(multiplier).min(self.max_delay)
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}
