//! Main entry point for the cloud-spend-extractor batch job

use clap::Parser;
use cloud_spend_extractor::cli::{self, Cli};
use cloud_spend_extractor::ExtractError;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cloud_spend_extractor=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Resolves when the process is asked to stop (Ctrl+C, or SIGTERM on unix)
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    info!("cloud-spend-extractor {}", env!("CARGO_PKG_VERSION"));

    // Output is only written after every window succeeds, so stopping early
    // never leaves a partial file behind.
    let result = tokio::select! {
        result = cli::execute(&cli) => result.map_err(anyhow::Error::from),
        _ = shutdown_signal() => {
            warn!("Termination requested; exiting without writing output");
            Err(anyhow::anyhow!("interrupted before the run completed"))
        }
    };

    match result {
        Ok(summary) => {
            info!(
                records = summary.records,
                windows = summary.windows,
                retries = summary.retries,
                "Extraction succeeded"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            match e.downcast_ref::<ExtractError>() {
                Some(extract) => {
                    error!(kind = extract.kind(), "Extraction failed: {}", e);
                    error!("Suggestion: {}", extract.suggestion());
                }
                None => error!("Extraction failed: {}", e),
            }
            ExitCode::FAILURE
        }
    }
}
