//! Command-line arguments
//!
//! Every flag falls back to an environment variable so the job can be
//! configured entirely from its container environment.

use crate::config::{
    parse_date, ConfigError, EndBoundary, RunConfig, RunConfigBuilder, DEFAULT_BASE_URL,
    DEFAULT_OUTPUT_FILE, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RETRY_COUNT,
    DEFAULT_RETRY_INTERVAL_SECS, DEFAULT_WINDOW_DAYS,
};
use crate::VendorAccount;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Cloud Spend Extractor CLI
#[derive(Parser, Debug, Clone)]
#[command(name = "cloud-spend-extractor")]
#[command(about = "Extract daily cloud spend from the Cloudability cost API into CSV", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Cloudability API token
    #[arg(long, env = "CLOUDABILITY_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: String,

    /// Vendor account whose spend is extracted
    #[arg(long, env = "VENDOR_ACCOUNT_ID")]
    pub vendor_account_id: String,

    /// Display name written in the vendor_name column (defaults to the account id)
    #[arg(long, env = "VENDOR_ACCOUNT_NAME")]
    pub vendor_account_name: Option<String>,

    /// First date to extract, YYYY-MM-DD (defaults to 7 days ago)
    #[arg(long, env = "START_DATE")]
    pub start_date: Option<String>,

    /// Last date to extract, inclusive: "today", "yesterday" or YYYY-MM-DD
    #[arg(long, env = "END_BOUNDARY", default_value = "yesterday")]
    pub end_boundary: String,

    /// Days covered by each API request
    #[arg(long, env = "REPORT_LENGTH_DAYS", default_value_t = DEFAULT_WINDOW_DAYS)]
    pub window_days: u32,

    /// Output CSV path
    #[arg(long, env = "OUTPUT_FILE", default_value = DEFAULT_OUTPUT_FILE)]
    pub output_file: PathBuf,

    /// Retries per window after the first attempt
    #[arg(long, env = "RETRY_COUNT", default_value_t = DEFAULT_RETRY_COUNT)]
    pub retry_count: u32,

    /// Seconds to wait between attempts
    #[arg(long, env = "RETRY_INTERVAL", default_value_t = DEFAULT_RETRY_INTERVAL_SECS)]
    pub retry_interval: u64,

    /// Cloudability API root
    #[arg(long, env = "CLOUDABILITY_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout: u64,
}

impl Cli {
    /// Resolve arguments into a validated [`RunConfig`]
    pub fn to_config(&self) -> Result<RunConfig, ConfigError> {
        self.builder()?.build()
    }

    /// Like [`Cli::to_config`] but with a fixed "today"
    pub fn to_config_as_of(&self, today: NaiveDate) -> Result<RunConfig, ConfigError> {
        self.builder()?.today(today).build()
    }

    fn builder(&self) -> Result<RunConfigBuilder, ConfigError> {
        let account = VendorAccount::new(
            self.vendor_account_id.trim(),
            self.vendor_account_name.as_deref().unwrap_or_default().trim(),
        );

        let mut builder = RunConfig::builder(self.auth_token.trim(), account)
            .end_boundary(self.end_boundary.parse::<EndBoundary>()?)
            .window_days(self.window_days)
            .output_path(self.output_file.clone())
            .retry_count(self.retry_count)
            .retry_interval(Duration::from_secs(self.retry_interval))
            .base_url(self.base_url.clone())
            .request_timeout(Duration::from_secs(self.request_timeout));

        if let Some(start) = self.start_date.as_deref().filter(|s| !s.trim().is_empty()) {
            builder = builder.start_date(parse_date("start date", start)?);
        }

        Ok(builder)
    }
}
