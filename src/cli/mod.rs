//! Command-line surface

pub mod args;

pub use args::Cli;

use crate::extractor::{ExtractError, RunSummary, SpendExtractor};
use crate::fetcher::cloudability::CloudabilityClient;
use tracing::debug;

/// Resolve configuration from `cli`, then run one extraction against Cloudability
pub async fn execute(cli: &Cli) -> Result<RunSummary, ExtractError> {
    let config = cli.to_config()?;
    debug!(?config, "Resolved configuration");

    let client = CloudabilityClient::from_config(&config)?;

    SpendExtractor::new(&config, &client).run().await
}
