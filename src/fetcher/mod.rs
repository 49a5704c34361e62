//! Cost API clients

use crate::window::DateWindow;
use crate::{SpendRecord, VendorAccount};
use async_trait::async_trait;

pub mod classify;
pub mod cloudability;
pub mod parser;

pub use classify::FailureKind;

/// Fetcher errors, classified by how the caller must react
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Timeout, connection failure, 5xx or rate limit; safe to retry
    #[error("{kind}: {message}")]
    Transient {
        /// What went wrong on the wire
        kind: FailureKind,
        /// Underlying error text
        message: String,
    },

    /// Credentials rejected (401/403); never retried
    #[error("authentication failed (HTTP {status}): {message}")]
    Auth {
        /// HTTP status returned
        status: u16,
        /// Response body or error text
        message: String,
    },

    /// Provider response did not match the expected schema; never retried
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    /// Build a classified error from a [`FailureKind`].
    ///
    /// Transience follows [`FailureKind::is_retryable`]; the remaining kinds
    /// split into credential and response-shape failures.
    pub fn from_kind(kind: FailureKind, message: impl Into<String>) -> Self {
        let message = message.into();
        if kind.is_retryable() {
            return FetchError::Transient { kind, message };
        }
        match kind {
            FailureKind::AuthFailed(status) => FetchError::Auth { status, message },
            FailureKind::ClientError(status) => {
                FetchError::MalformedResponse(format!("unexpected HTTP {status}: {message}"))
            }
            _ => FetchError::MalformedResponse(message),
        }
    }

    /// Whether the failure may clear up on its own
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient { .. })
    }

    /// Classification of the failure, for log messages
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Transient { kind, .. } => *kind,
            FetchError::Auth { status, .. } => FailureKind::AuthFailed(*status),
            FetchError::MalformedResponse(_) => FailureKind::Malformed,
        }
    }
}

/// Result type for fetcher operations
pub type FetchResult<T> = Result<T, FetchError>;

/// A source of spend records, queried one window at a time
#[async_trait]
pub trait SpendSource: Send + Sync {
    /// Fetch every record for `account` inside `window`.
    ///
    /// Records are returned in provider order. An empty vector means the
    /// account had no spend in the window.
    async fn fetch_window(
        &self,
        window: &DateWindow,
        account: &VendorAccount,
    ) -> FetchResult<Vec<SpendRecord>>;
}
