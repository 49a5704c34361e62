//! Fixed-delay retry executor
//!
//! [`RetryPolicy::run`] wraps any fallible async operation. Errors that report
//! themselves as transient through [`Retryable`] are retried up to
//! `retry_count` times with the same delay before every retry; anything else
//! is returned on first occurrence without waiting.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::RunConfig;
use crate::fetcher::FetchError;

/// Errors that know whether a retry could help
pub trait Retryable {
    /// True if the same operation may succeed when attempted again
    fn is_transient(&self) -> bool;
}

impl Retryable for FetchError {
    fn is_transient(&self) -> bool {
        FetchError::is_transient(self)
    }
}

/// Failure of a retried operation
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// Non-transient error, returned on the attempt that produced it
    #[error(transparent)]
    Fatal(E),

    /// Every attempt failed with a transient error
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        /// Attempts made, including the first
        attempts: u32,
        /// Error from the final attempt
        #[source]
        last: E,
    },
}

/// Attempt bookkeeping for a single [`RetryPolicy::run`] call
#[derive(Debug)]
struct RetryState<E> {
    attempts_made: u32,
    last_error: Option<E>,
}

impl<E> RetryState<E> {
    fn new() -> Self {
        Self {
            attempts_made: 0,
            last_error: None,
        }
    }
}

/// Attempt limit and fixed delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    retry_count: u32,
    interval: Duration,
}

impl RetryPolicy {
    /// Allow `retry_count` retries, waiting `interval` before each
    pub fn new(retry_count: u32, interval: Duration) -> Self {
        Self {
            retry_count,
            interval,
        }
    }

    /// Policy configured for a run
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.retry_count, config.retry_interval)
    }

    /// Total attempts allowed, including the first
    pub fn max_attempts(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }

    /// Run `operation` until it succeeds, fails fatally, or attempts run out.
    ///
    /// On success returns the value together with the number of attempts it
    /// took, including the first. `label` only appears in log messages.
    pub async fn run<T, E, F, Fut>(
        &self,
        label: &str,
        mut operation: F,
    ) -> Result<(T, u32), RetryError<E>>
    where
        E: Retryable + Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.max_attempts();
        let mut state = RetryState::new();

        loop {
            if state.attempts_made > 0 && !self.interval.is_zero() {
                tokio::time::sleep(self.interval).await;
            }
            state.attempts_made += 1;

            match operation().await {
                Ok(value) => {
                    if let Some(previous) = &state.last_error {
                        debug!(
                            attempt = state.attempts_made,
                            max_attempts,
                            %previous,
                            "{label}: retry attempt {}/{} succeeded",
                            state.attempts_made,
                            max_attempts
                        );
                    }
                    return Ok((value, state.attempts_made));
                }
                Err(error) if !error.is_transient() => {
                    debug!(attempt = state.attempts_made, %error, "{label}: non-retryable failure");
                    return Err(RetryError::Fatal(error));
                }
                Err(error) => {
                    if state.attempts_made >= max_attempts {
                        return Err(RetryError::Exhausted {
                            attempts: state.attempts_made,
                            last: error,
                        });
                    }

                    warn!(
                        attempt = state.attempts_made,
                        max_attempts,
                        delay_secs = self.interval.as_secs_f64(),
                        %error,
                        "{label}: attempt {}/{} failed, retrying in {:.1} seconds",
                        state.attempts_made,
                        max_attempts,
                        self.interval.as_secs_f64()
                    );
                    state.last_error = Some(error);
                }
            }
        }
    }
}
