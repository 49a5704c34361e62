//! Atomic CSV output
//!
//! Rows are written to a temp file in the destination directory, which is
//! flushed, synced and renamed over the target on [`OutputWriter::close`].
//! Dropping a writer without closing it deletes the temp file, so readers
//! only ever see the previous file or the complete new one.

use crate::SpendRecord;
use csv::{Writer, WriterBuilder};
use fd_lock::RwLock;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::{OutputError, OutputResult, OutputWriter, SpendWriter};

const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Column order of the output file
pub const CSV_HEADER: [&str; 12] = [
    "vendor_id",
    "vendor_name",
    "resource_id",
    "service_name",
    "name",
    "owner_email",
    "date",
    "unblended_cost",
    "adjusted_cost",
    "usage_hours",
    "usage_quantity",
    "application_env",
];

/// CSV row for a spend record; field order must match [`CSV_HEADER`]
#[derive(Debug, Serialize)]
struct SpendRow<'a> {
    vendor_id: &'a str,
    vendor_name: &'a str,
    resource_id: &'a str,
    service_name: &'a str,
    name: &'a str,
    owner_email: &'a str,
    date: String,
    unblended_cost: String,
    adjusted_cost: String,
    usage_hours: String,
    usage_quantity: String,
    application_env: &'a str,
}

impl<'a> From<&'a SpendRecord> for SpendRow<'a> {
    fn from(record: &'a SpendRecord) -> Self {
        Self {
            vendor_id: &record.vendor_id,
            vendor_name: &record.vendor_name,
            resource_id: &record.resource_id,
            service_name: &record.service_name,
            name: &record.name,
            owner_email: &record.owner_email,
            date: record.date.format("%Y-%m-%d").to_string(),
            unblended_cost: record.unblended_cost.to_string(),
            adjusted_cost: record.adjusted_cost.to_string(),
            usage_hours: record.usage_hours.to_string(),
            usage_quantity: record.usage_quantity.to_string(),
            application_env: &record.application_env,
        }
    }
}

/// CSV writer for spend records that replaces its target atomically
pub struct CsvSpendWriter {
    writer: Writer<BufWriter<NamedTempFile>>,
    target: PathBuf,
    records_written: u64,
}

impl CsvSpendWriter {
    /// Start a new file that will replace `path` on close.
    ///
    /// Creates missing parent directories and writes the header row
    /// immediately, so a closed writer always yields at least a header.
    pub fn create<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        let target = path.as_ref().to_path_buf();
        let parent = output_dir(&target);
        std::fs::create_dir_all(&parent)
            .map_err(|e| OutputError::IoError(format!("Failed to create directory: {e}")))?;

        let temp_file = NamedTempFile::new_in(&parent)
            .map_err(|e| OutputError::IoError(format!("Failed to create temp file: {e}")))?;
        debug!(temp = %temp_file.path().display(), target = %target.display(), "Created CSV temp file");

        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, temp_file));
        writer
            .write_record(CSV_HEADER)
            .map_err(|e| OutputError::CsvError(format!("Failed to write header: {e}")))?;

        Ok(Self {
            writer,
            target,
            records_written: 0,
        })
    }

    /// Number of data rows written so far
    pub fn records_written(&self) -> u64 {
        self.records_written
    }
}

impl SpendWriter for CsvSpendWriter {
    fn write_record(&mut self, record: &SpendRecord) -> OutputResult<()> {
        self.writer
            .serialize(SpendRow::from(record))
            .map_err(|e| OutputError::CsvError(format!("Failed to write record: {e}")))?;
        self.records_written += 1;
        Ok(())
    }
}

impl OutputWriter for CsvSpendWriter {
    fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::IoError(format!("Failed to flush: {e}")))
    }

    /// Sync the temp file and rename it over the target
    fn close(mut self) -> OutputResult<()> {
        self.flush()?;

        let buf_writer = self
            .writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get inner writer: {e}")))?;
        let temp_file = buf_writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get temp file: {e}")))?;

        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| OutputError::IoError(format!("Failed to sync temp file: {e}")))?;

        temp_file
            .persist(&self.target)
            .map_err(|e| OutputError::IoError(format!("Failed to persist temp file: {e}")))?;

        // Fsync the directory so the rename itself is durable
        if let Ok(dir) = std::fs::File::open(output_dir(&self.target)) {
            let _ = dir.sync_all();
        }

        info!(
            path = %self.target.display(),
            records = self.records_written,
            "CSV written"
        );
        Ok(())
    }
}

/// Write `records` to `path` as one complete CSV, replacing any existing file.
///
/// Holds an exclusive lock on `<path>.lock` for the duration so overlapping
/// runs against the same output take turns.
pub fn write_spend_csv<P: AsRef<Path>>(path: P, records: &[SpendRecord]) -> OutputResult<u64> {
    let path = path.as_ref();
    std::fs::create_dir_all(output_dir(path))
        .map_err(|e| OutputError::IoError(format!("Failed to create directory: {e}")))?;

    let lock_file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(lock_path(path))
        .map_err(|e| OutputError::LockError(format!("Failed to create lock file: {e}")))?;
    let mut lock = RwLock::new(lock_file);
    debug!("Acquiring output lock");
    let _guard = lock
        .write()
        .map_err(|e| OutputError::LockError(format!("Failed to acquire write lock: {e}")))?;

    let mut writer = CsvSpendWriter::create(path)?;
    writer.write_records(records)?;
    let written = writer.records_written();
    writer.close()?;

    Ok(written)
}

/// Lock file guarding `path`
pub fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

fn output_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
