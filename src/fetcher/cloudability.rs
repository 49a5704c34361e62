//! Cloudability cost API client
//!
//! Issues exactly one `GET {base_url}/reporting/cost/run` per window. The
//! client itself never retries; failures are classified and handed back so
//! the extraction loop can apply its retry policy at a single call site.
//!
//! The token travels both as the `auth_token` query parameter and as the
//! basic-auth user. Request URLs therefore carry the secret and are never
//! logged or copied into error messages.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{ConfigError, RunConfig};
use crate::fetcher::classify::classify;
use crate::fetcher::parser::{SpendParser, DIMENSIONS, METRICS};
use crate::fetcher::{FetchError, FetchResult, SpendSource};
use crate::window::DateWindow;
use crate::{SpendRecord, VendorAccount};

/// Path of the synchronous cost report endpoint, relative to the API root
pub const COST_REPORT_PATH: &str = "/reporting/cost/run";

/// Longest response body excerpt carried in an error message
const MAX_ERROR_BODY: usize = 512;

/// HTTP client for the Cloudability `reporting/cost` API
pub struct CloudabilityClient {
    client: Client,
    endpoint: String,
    auth_token: String,
}

impl CloudabilityClient {
    /// Create a client around an existing [`reqwest::Client`]
    ///
    /// # Arguments
    /// * `client` - HTTP client (timeouts are taken from it)
    /// * `base_url` - API root, e.g. `https://app.cloudability.com/api/1`
    /// * `auth_token` - Cloudability API token
    pub fn new(client: Client, base_url: &str, auth_token: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), COST_REPORT_PATH),
            auth_token: auth_token.into(),
        }
    }

    /// Build a client with the timeout, base URL and token from `config`
    pub fn from_config(config: &RunConfig) -> Result<Self, ConfigError> {
        let client = build_http_client(config.request_timeout)?;
        Ok(Self::new(client, &config.base_url, config.auth_token.clone()))
    }

    /// Query parameters for one window.
    ///
    /// Cloudability treats `end_date` as inclusive.
    pub fn query_params(
        &self,
        window: &DateWindow,
        account: &VendorAccount,
    ) -> Vec<(&'static str, String)> {
        vec![
            ("auth_token", self.auth_token.clone()),
            ("start_date", window.start.to_string()),
            ("end_date", window.last_day().to_string()),
            ("dimensions", DIMENSIONS.join(",")),
            ("metrics", METRICS.join(",")),
            ("filters", format!("vendor_account_identifier=={}", account.id)),
        ]
    }
}

/// Build the HTTP client used for all requests
pub fn build_http_client(timeout: Duration) -> Result<Client, ConfigError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("cloud-spend-extractor/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ConfigError::InvalidValue {
            field: "http client",
            reason: e.to_string(),
        })
}

#[async_trait]
impl SpendSource for CloudabilityClient {
    async fn fetch_window(
        &self,
        window: &DateWindow,
        account: &VendorAccount,
    ) -> FetchResult<Vec<SpendRecord>> {
        let params = self.query_params(window, account);
        debug!(endpoint = %self.endpoint, %window, account = %account.id, "Requesting cost report");

        let response = self
            .client
            .get(&self.endpoint)
            .basic_auth(&self.auth_token, Some(""))
            .query(&params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let kind = classify(Some(status), None);
            return Err(FetchError::from_kind(kind, truncate(&body)));
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        let body: Value = serde_json::from_slice(&bytes)
            .map_err(|e| FetchError::MalformedResponse(format!("invalid JSON: {e}")))?;

        let records = SpendParser::parse_report(&body, window, account)?;
        info!(%window, records = records.len(), "Fetched cost report");
        Ok(records)
    }
}

/// Classify a transport failure, dropping the request URL and its token
fn transport_error(error: reqwest::Error) -> FetchError {
    let kind = classify(None, Some(&error));
    FetchError::from_kind(kind, error.without_url().to_string())
}

fn truncate(body: &str) -> String {
    let body = body.trim();
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
