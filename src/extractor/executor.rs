//! Extraction loop
//!
//! Walks the configured date range one window at a time, fetching each
//! through the retry policy, and writes the CSV only after every window has
//! succeeded. The first fatal error returns early, so a failed run never
//! produces partial output.

use tracing::{error, info, Instrument};

use crate::config::RunConfig;
use crate::extractor::job::RunSummary;
use crate::extractor::retry::RetryPolicy;
use crate::extractor::ExtractError;
use crate::fetcher::SpendSource;
use crate::output::csv::write_spend_csv;
use crate::window::DateRange;
use crate::SpendRecord;

/// Orchestrates one extraction run
pub struct SpendExtractor<'a, S: SpendSource + ?Sized> {
    config: &'a RunConfig,
    source: &'a S,
    policy: RetryPolicy,
}

impl<'a, S: SpendSource + ?Sized> SpendExtractor<'a, S> {
    /// Create an extractor using the retry settings from `config`
    pub fn new(config: &'a RunConfig, source: &'a S) -> Self {
        Self {
            config,
            source,
            policy: RetryPolicy::from_config(config),
        }
    }

    /// Windows this run will query, in order
    pub fn windows(&self) -> DateRange {
        DateRange::new(self.config.start_date, self.config.end_date)
            .with_window_days(self.config.window_days)
    }

    /// Fetch every window and return the records in query order.
    ///
    /// Progress is counted into `summary` as windows complete. Stops at the
    /// first fatal error; records from earlier windows are discarded with
    /// the accumulator.
    pub async fn collect(&self, summary: &mut RunSummary) -> Result<Vec<SpendRecord>, ExtractError> {
        let account = &self.config.vendor_account;
        let windows = self.windows();
        let total = windows.len();
        let mut records = Vec::new();

        info!(
            account = %account,
            start = %self.config.start_date,
            end = %self.config.end_date,
            end_boundary = %self.config.end_boundary,
            windows = total,
            "Extracting spend"
        );

        for (index, window) in windows.enumerate() {
            info!(
                "Requesting data for {window} ({} of {total}) for {}",
                index + 1,
                account.id
            );

            let label = format!("window {window}");
            let (batch, attempts) = self
                .policy
                .run(&label, || self.source.fetch_window(&window, account))
                .await
                .map_err(|e| ExtractError::from_fetch(window, e))?;

            summary.window_done(batch.len(), attempts);
            records.extend(batch);
        }

        Ok(records)
    }

    /// Run the full extraction and write the output file
    pub async fn run(&self) -> Result<RunSummary, ExtractError> {
        let mut summary = RunSummary::default();
        self.run_with_summary(&mut summary).await?;
        Ok(summary)
    }

    /// Like [`SpendExtractor::run`], but counts into a caller-owned summary.
    ///
    /// On failure the summary is left [`crate::extractor::RunStatus::Failed`]
    /// with the progress made before the abort.
    pub async fn run_with_summary(&self, summary: &mut RunSummary) -> Result<(), ExtractError> {
        let span = tracing::info_span!(
            "extract",
            account = %self.config.vendor_account.id,
            output = %self.config.output_path.display()
        );

        async move {
            let result = self.collect_and_write(summary).await;
            if let Err(e) = &result {
                summary.fail();
                error!(
                    kind = e.kind(),
                    status = %summary.status,
                    windows_completed = summary.windows,
                    error = %e,
                    "Extraction failed; no output written"
                );
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn collect_and_write(&self, summary: &mut RunSummary) -> Result<(), ExtractError> {
        let records = self.collect(summary).await?;

        let path = &self.config.output_path;
        info!(path = %path.display(), records = records.len(), "Writing data");
        write_spend_csv(path, &records)?;

        summary.succeed(path.clone());
        info!(
            status = %summary.status,
            windows = summary.windows,
            records = summary.records,
            retries = summary.retries,
            "All done"
        );
        Ok(())
    }
}
