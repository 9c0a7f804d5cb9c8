//! Application service: bounded retry of transient failures.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;

use crate::application::ports::Attempt;
use crate::domain::RetryError;

/// Fixed-delay retry policy for calls that can fail transiently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retrier {
    /// Total number of attempts, including the first one.
    pub attempts: u32,
    /// Sleep between two attempts.
    pub delay: Duration,
}

impl Default for Retrier {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_secs(10),
        }
    }
}

impl Retrier {
    #[must_use]
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// Run `op` until it succeeds, fails terminally, or runs out of attempts.
    ///
    /// # Errors
    ///
    /// Returns the terminal error unchanged, or [`RetryError::Exhausted`]
    /// carrying the last transient error.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, Attempt>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(Attempt::Terminal(err)) => return Err(err),
                Err(Attempt::Transient(err)) if attempt >= attempts => {
                    return Err(RetryError::Exhausted {
                        attempts,
                        last_error: err,
                    }
                    .into());
                }
                Err(Attempt::Transient(err)) => {
                    tracing::warn!(
                        what,
                        attempt,
                        max_attempts = attempts,
                        error = %err,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
