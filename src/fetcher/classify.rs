//! Failure classification for cost API requests.
//!
//! Maps HTTP statuses and transport errors onto a small set of kinds that
//! drive both the retry decision and the wording of operator-facing logs.

use reqwest::{Error as ReqwestError, StatusCode};
use std::fmt;

/// Classification of a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Request timed out
    NetworkTimeout,
    /// Connection refused, DNS failure, or similar
    NetworkOffline,
    /// HTTP 429
    RateLimit,
    /// HTTP 5xx
    ServerError(u16),
    /// HTTP 401/403
    AuthFailed(u16),
    /// Any other 4xx
    ClientError(u16),
    /// Body could not be decoded into spend records
    Malformed,
    /// Fallback when nothing more specific fits
    NetworkGeneric,
}

impl FailureKind {
    /// Short description used in log messages
    pub fn description(&self) -> &'static str {
        match self {
            Self::NetworkTimeout => "network timeout",
            Self::NetworkOffline => "connection failed",
            Self::RateLimit => "rate limit exceeded",
            Self::ServerError(code) => match code {
                500 => "internal server error",
                502 => "bad gateway",
                503 => "service unavailable",
                504 => "gateway timeout",
                _ => "server error",
            },
            Self::AuthFailed(code) => match code {
                401 => "authentication failed (401)",
                403 => "authentication failed (403)",
                _ => "authentication failed",
            },
            Self::ClientError(code) => match code {
                400 => "bad request",
                404 => "resource not found",
                _ => "client error",
            },
            Self::Malformed => "malformed response",
            Self::NetworkGeneric => "network error",
        }
    }

    /// Remediation hint shown after a fatal failure
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::NetworkTimeout => "Check network connectivity or raise REQUEST_TIMEOUT",
            Self::NetworkOffline => "Verify internet connectivity and DNS resolution",
            Self::RateLimit => "Raise RETRY_INTERVAL or run the job less often",
            Self::ServerError(_) => "Cloudability may be degraded, try again later",
            Self::AuthFailed(_) => "Verify CLOUDABILITY_AUTH_TOKEN is valid and not expired",
            Self::ClientError(_) => "Check VENDOR_ACCOUNT_ID, START_DATE and CLOUDABILITY_BASE_URL",
            Self::Malformed => "The provider changed its report format; inspect the raw response",
            Self::NetworkGeneric => "Check network connectivity and try again",
        }
    }

    /// Whether failures of this kind are worth retrying
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::AuthFailed(_) | Self::ClientError(_) | Self::Malformed
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Classify a failed request from its status and/or transport error
pub fn classify(status: Option<StatusCode>, err: Option<&ReqwestError>) -> FailureKind {
    if let Some(status) = status {
        let code = status.as_u16();
        match code {
            401 | 403 => return FailureKind::AuthFailed(code),
            429 => return FailureKind::RateLimit,
            _ => {}
        }

        if status.is_server_error() {
            return FailureKind::ServerError(code);
        }

        if status.is_client_error() {
            return FailureKind::ClientError(code);
        }
    }

    if let Some(err) = err {
        if err.is_timeout() {
            return FailureKind::NetworkTimeout;
        }

        if err.is_connect() {
            return FailureKind::NetworkOffline;
        }
    }

    FailureKind::NetworkGeneric
}
