//! Extraction orchestration and retry
//!
//! The extractor drives a run end to end:
//!
//! 1. **Windows**: iterate [`crate::window::DateRange`] from the configured start
//!    date through the end boundary
//! 2. **Fetch**: query each window through [`retry::RetryPolicy`]
//! 3. **Accumulate**: append each window's records in query order
//! 4. **Write**: hand the full set to [`crate::output::csv`] in one atomic write
//!
//! # Error Handling
//!
//! Only transient fetch failures are recovered, inside the retry policy.
//! Authentication failures, malformed responses and exhausted retries abort
//! the run before any output is written; see [`ExtractError`].

pub mod executor;
pub mod job;
pub mod retry;

pub use executor::SpendExtractor;
pub use job::{RunStatus, RunSummary};
pub use retry::{RetryError, RetryPolicy, Retryable};

use crate::config::ConfigError;
use crate::fetcher::{FailureKind, FetchError};
use crate::output::OutputError;
use crate::window::DateWindow;

/// Fatal errors that end an extraction run
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Bad or missing configuration
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Credentials rejected
    #[error("{window}: {source}")]
    Auth {
        /// Window being fetched
        window: DateWindow,
        /// Underlying failure
        source: FetchError,
    },

    /// Provider broke its response contract
    #[error("{window}: {source}")]
    MalformedResponse {
        /// Window being fetched
        window: DateWindow,
        /// Underlying failure
        source: FetchError,
    },

    /// Transient failures persisted through every attempt
    #[error("{window}: retries exhausted after {attempts} attempts: {source}")]
    RetryExhausted {
        /// Window being fetched
        window: DateWindow,
        /// Attempts made, including the first
        attempts: u32,
        /// Error from the final attempt
        source: FetchError,
    },

    /// The CSV could not be written
    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

impl ExtractError {
    /// Convert a failed, retried window fetch
    pub fn from_fetch(window: DateWindow, error: RetryError<FetchError>) -> Self {
        match error {
            RetryError::Exhausted { attempts, last } => ExtractError::RetryExhausted {
                window,
                attempts,
                source: last,
            },
            RetryError::Fatal(source @ FetchError::Auth { .. }) => {
                ExtractError::Auth { window, source }
            }
            RetryError::Fatal(source @ FetchError::MalformedResponse(_)) => {
                ExtractError::MalformedResponse { window, source }
            }
            // RetryPolicy never reports a transient error as fatal
            RetryError::Fatal(source @ FetchError::Transient { .. }) => {
                ExtractError::RetryExhausted {
                    window,
                    attempts: 1,
                    source,
                }
            }
        }
    }

    /// Remediation hint for operators, when one applies
    pub fn suggestion(&self) -> &'static str {
        match self {
            ExtractError::Configuration(_) => "Check the job's environment variables",
            ExtractError::Auth { source, .. }
            | ExtractError::MalformedResponse { source, .. }
            | ExtractError::RetryExhausted { source, .. } => source.kind().suggestion(),
            ExtractError::Output(_) => "Check that OUTPUT_FILE's directory exists and is writable",
        }
    }

    /// Failure classification for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractError::Configuration(_) => "configuration",
            ExtractError::Auth { .. } => "auth",
            ExtractError::MalformedResponse { .. } => "malformed_response",
            ExtractError::RetryExhausted { .. } => "retry_exhausted",
            ExtractError::Output(_) => "output",
        }
    }
}
