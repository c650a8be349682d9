//! Retry logic with exponential backoff.
//!
//! The executors never retry on their own. Callers that want to (for example
//! `hpgate connect --retries 3`) wrap the operation with
//! [`retry_with_backoff`].

use log::{debug, warn};
use std::thread;
use std::time::Duration;

use crate::error::Result;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not counting the initial attempt)
    pub max_retries: u32,
    /// Initial delay between retries in milliseconds
    pub initial_delay_ms: u64,
    /// Multiplier for exponential backoff (typically 2.0)
    pub backoff_multiplier: f64,
    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            backoff_multiplier: 2.0,
            max_delay_ms: 10000,
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, initial_delay_ms: u64) -> Self {
        Self {
            max_retries,
            initial_delay_ms,
            ..Self::default()
        }
    }

    /// Calculates the delay before retry number `attempt` (0-based).
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let delay_ms = (self.initial_delay_ms as f64
            * self.backoff_multiplier.powi(attempt as i32))
        .min(self.max_delay_ms as f64) as u64;

        Duration::from_millis(delay_ms)
    }
}

/// Retries an operation with exponential backoff.
///
/// Returns the first success, or the last error once all attempts fail.
pub fn retry_with_backoff<T, F>(
    config: &RetryConfig,
    mut operation: F,
    operation_name: &str,
) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut last_error = match operation() {
        Ok(result) => return Ok(result),
        Err(e) => {
            debug!("{} failed on initial attempt: {}", operation_name, e);
            e
        }
    };

    for attempt in 1..=config.max_retries {
        let delay = config.calculate_delay(attempt - 1);
        warn!(
            "Retrying {} (attempt {}/{}) after {:?}",
            operation_name, attempt, config.max_retries, delay
        );

        thread::sleep(delay);

        match operation() {
            Ok(result) => {
                debug!("{} succeeded on attempt {}", operation_name, attempt);
                return Ok(result);
            }
            Err(e) => {
                debug!("{} failed on attempt {}: {}", operation_name, attempt, e);
                last_error = e;
            }
        }
    }

    Err(last_error)
}
