//! Run configuration
//!
//! [`RunConfig`] is an immutable snapshot of everything one extraction run
//! needs. It is built once at startup through [`RunConfigBuilder`], which is
//! where all validation happens, and then passed by reference to every
//! component. Nothing downstream reads the process environment.

use crate::VendorAccount;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default number of retries after the first attempt
pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// Default fixed delay between attempts, in seconds
pub const DEFAULT_RETRY_INTERVAL_SECS: u64 = 30;

/// Default number of days covered by one API request
pub const DEFAULT_WINDOW_DAYS: u32 = 1;

/// Days before today used as start date when none is configured
pub const DEFAULT_LOOKBACK_DAYS: i64 = 7;

/// Default per-request transport timeout, in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://app.cloudability.com/api/1";

/// Default output location
pub const DEFAULT_OUTPUT_FILE: &str = "/data/cloudability-daily-spend.csv";

/// Date format accepted for all configured dates
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required value was not provided or was blank
    #[error("missing required value: {0}")]
    MissingValue(&'static str),

    /// A date could not be parsed
    #[error("invalid {field} '{value}': expected YYYY-MM-DD")]
    InvalidDate {
        /// Which setting was malformed
        field: &'static str,
        /// The raw value supplied
        value: String,
    },

    /// Any other out-of-range value
    #[error("invalid {field}: {reason}")]
    InvalidValue {
        /// Which setting was rejected
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Parse an ISO 8601 calendar date (`YYYY-MM-DD`)
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| ConfigError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

/// The last date (inclusive) a run queries.
///
/// Whether "current day" spend should be extracted depends on how complete
/// the provider's data for today is, so this is always an explicit setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndBoundary {
    /// Include today's (possibly incomplete) spend
    Today,
    /// Stop at yesterday, the last complete day
    Yesterday,
    /// A fixed date, used for backfills and reruns
    Date(NaiveDate),
}

impl EndBoundary {
    /// Resolve the boundary into a concrete date relative to `today`
    pub fn resolve(&self, today: NaiveDate) -> NaiveDate {
        match self {
            EndBoundary::Today => today,
            EndBoundary::Yesterday => today.pred_opt().unwrap_or(today),
            EndBoundary::Date(date) => *date,
        }
    }
}

impl FromStr for EndBoundary {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "today" => Ok(EndBoundary::Today),
            "yesterday" => Ok(EndBoundary::Yesterday),
            other => parse_date("end boundary", other).map(EndBoundary::Date),
        }
    }
}

impl fmt::Display for EndBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndBoundary::Today => write!(f, "today"),
            EndBoundary::Yesterday => write!(f, "yesterday"),
            EndBoundary::Date(date) => write!(f, "{date}"),
        }
    }
}

/// Immutable snapshot of one run's parameters
#[derive(Clone)]
pub struct RunConfig {
    /// API token; never logged
    pub auth_token: String,
    /// Account whose spend is extracted
    pub vendor_account: VendorAccount,
    /// First date queried (inclusive)
    pub start_date: NaiveDate,
    /// Boundary as configured
    pub end_boundary: EndBoundary,
    /// Last date queried (inclusive), resolved from `end_boundary`
    pub end_date: NaiveDate,
    /// Days covered by one request
    pub window_days: u32,
    /// Final CSV location
    pub output_path: PathBuf,
    /// Retries after the first attempt of a window
    pub retry_count: u32,
    /// Fixed delay between attempts
    pub retry_interval: Duration,
    /// API root URL
    pub base_url: String,
    /// Per-request transport timeout
    pub request_timeout: Duration,
}

impl RunConfig {
    /// Start building a configuration for the given token and account
    pub fn builder(auth_token: impl Into<String>, vendor_account: VendorAccount) -> RunConfigBuilder {
        RunConfigBuilder::new(auth_token, vendor_account)
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("auth_token", &"<redacted>")
            .field("vendor_account", &self.vendor_account)
            .field("start_date", &self.start_date)
            .field("end_boundary", &self.end_boundary)
            .field("end_date", &self.end_date)
            .field("window_days", &self.window_days)
            .field("output_path", &self.output_path)
            .field("retry_count", &self.retry_count)
            .field("retry_interval", &self.retry_interval)
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Builder for [`RunConfig`]
#[derive(Debug, Clone)]
pub struct RunConfigBuilder {
    auth_token: String,
    vendor_account: VendorAccount,
    start_date: Option<NaiveDate>,
    end_boundary: EndBoundary,
    today: Option<NaiveDate>,
    window_days: u32,
    output_path: PathBuf,
    retry_count: u32,
    retry_interval: Duration,
    base_url: String,
    request_timeout: Duration,
}

impl RunConfigBuilder {
    fn new(auth_token: impl Into<String>, vendor_account: VendorAccount) -> Self {
        Self {
            auth_token: auth_token.into(),
            vendor_account,
            start_date: None,
            end_boundary: EndBoundary::Yesterday,
            today: None,
            window_days: DEFAULT_WINDOW_DAYS,
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            retry_count: DEFAULT_RETRY_COUNT,
            retry_interval: Duration::from_secs(DEFAULT_RETRY_INTERVAL_SECS),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Set the first date to query
    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    /// Parse and set the first date to query
    pub fn start_date_str(self, value: &str) -> Result<Self, ConfigError> {
        let date = parse_date("start date", value)?;
        Ok(self.start_date(date))
    }

    /// Set the end boundary
    pub fn end_boundary(mut self, boundary: EndBoundary) -> Self {
        self.end_boundary = boundary;
        self
    }

    /// Pin "today" instead of reading the clock
    pub fn today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Set the number of days per request
    pub fn window_days(mut self, days: u32) -> Self {
        self.window_days = days;
        self
    }

    /// Set the output CSV path
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Set the number of retries after the first attempt
    pub fn retry_count(mut self, count: u32) -> Self {
        self.retry_count = count;
        self
    }

    /// Set the fixed delay between attempts
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Override the API root URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the per-request transport timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validate and freeze the configuration
    pub fn build(self) -> Result<RunConfig, ConfigError> {
        if self.auth_token.trim().is_empty() {
            return Err(ConfigError::MissingValue("auth token"));
        }
        if self.vendor_account.id.trim().is_empty() {
            return Err(ConfigError::MissingValue("vendor account id"));
        }
        if self.window_days == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window days",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "request timeout",
                reason: "must be greater than zero".to_string(),
            });
        }
        let base_url = self.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "base url",
                reason: format!("'{base_url}' is not an http(s) URL"),
            });
        }

        let today = self.today.unwrap_or_else(|| Utc::now().date_naive());
        let start_date = self
            .start_date
            .unwrap_or_else(|| today - ChronoDuration::days(DEFAULT_LOOKBACK_DAYS));
        let end_date = self.end_boundary.resolve(today);

        let vendor_account = if self.vendor_account.name.trim().is_empty() {
            VendorAccount::new(self.vendor_account.id.clone(), self.vendor_account.id)
        } else {
            self.vendor_account
        };

        Ok(RunConfig {
            auth_token: self.auth_token,
            vendor_account,
            start_date,
            end_boundary: self.end_boundary,
            end_date,
            window_days: self.window_days,
            output_path: self.output_path,
            retry_count: self.retry_count,
            retry_interval: self.retry_interval,
            base_url,
            request_timeout: self.request_timeout,
        })
    }
}
