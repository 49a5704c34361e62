//! # Cloud Spend Extractor Library
//!
//! Extracts daily cloud-cost line items from the Cloudability cost-reporting API
//! and persists them as a single CSV file for finance and cost-visibility tooling.
//! The crate backs a short-lived batch job: one invocation per scheduling interval,
//! no state carried between runs.
//!
//! ## Features
//!
//! - **Bounded queries**: one API request per [`DateWindow`], from the configured
//!   start date through an explicit end boundary
//! - **Fixed-delay retry**: transient failures (timeouts, 5xx, 429) are retried a
//!   configured number of times; auth and schema failures are never retried
//! - **Fail-fast**: any fatal error aborts the run before output is produced
//! - **Atomic output**: the CSV is written to a temp file and renamed into place
//!
//! ## Quick Start
//!
//! ```no_run
//! use cloud_spend_extractor::config::{EndBoundary, RunConfig};
//! use cloud_spend_extractor::extractor::SpendExtractor;
//! use cloud_spend_extractor::fetcher::cloudability::CloudabilityClient;
//! use cloud_spend_extractor::VendorAccount;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunConfig::builder("token", VendorAccount::new("123456789012", "prod"))
//!     .start_date_str("2024-01-01")?
//!     .end_boundary(EndBoundary::Yesterday)
//!     .output_path("./spend.csv")
//!     .build()?;
//!
//! let client = CloudabilityClient::from_config(&config)?;
//! let summary = SpendExtractor::new(&config, &client).run().await?;
//! println!("wrote {} records", summary.records);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`config`] - Immutable run configuration and date-boundary resolution
//! - [`window`] - Lazy date range iterator producing [`DateWindow`] values
//! - [`fetcher`] - Cost API client and failure classification
//! - [`extractor`] - Extraction loop and the fixed-delay retry executor
//! - [`output`] - Atomic CSV writer
//! - [`cli`] - Command-line / environment surface for the binary

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Command-line surface
pub mod cli;

/// Run configuration
pub mod config;

/// Extraction orchestration and retry
pub mod extractor;

/// Cost API clients
pub mod fetcher;

/// Output writers
pub mod output;

/// Date range iteration
pub mod window;

pub use config::RunConfig;
pub use extractor::{ExtractError, SpendExtractor};
pub use window::{DateRange, DateWindow};

/// Value substituted for tag dimensions the provider reports as unset
pub const UNKNOWN_TAG: &str = "(unknown)";

/// A vendor (cloud provider) account whose spend is being extracted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorAccount {
    /// Provider account identifier, used as the API filter
    pub id: String,
    /// Human-readable label written alongside each record
    pub name: String,
}

impl VendorAccount {
    /// Create a new vendor account
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for VendorAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.name == self.id {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{} ({})", self.id, self.name)
        }
    }
}

/// One cost line item for a given date and account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendRecord {
    /// Day the cost was incurred
    pub date: NaiveDate,
    /// Vendor account identifier
    pub vendor_id: String,
    /// Vendor account display name
    pub vendor_name: String,
    /// Provider resource identifier (instance id, bucket ARN, ...)
    pub resource_id: String,
    /// Service the resource belongs to (e.g. "EC2 Instance")
    pub service_name: String,
    /// Resource name tag
    pub name: String,
    /// Owner email tag, or [`UNKNOWN_TAG`]
    pub owner_email: String,
    /// Application environment tag, or [`UNKNOWN_TAG`]
    pub application_env: String,
    /// Cost before discounts and credits
    pub unblended_cost: Decimal,
    /// Cost after discounts and credits
    pub adjusted_cost: Decimal,
    /// Hours of usage
    pub usage_hours: Decimal,
    /// Usage quantity in the service's native unit
    pub usage_quantity: Decimal,
}
