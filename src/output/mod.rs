//! Data output writers

use crate::SpendRecord;

pub mod csv;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV encoding error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Could not lock the output path
    #[error("lock error: {0}")]
    LockError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Generic output writer
pub trait OutputWriter {
    /// Flush any buffered data
    fn flush(&mut self) -> OutputResult<()>;

    /// Finalize output; nothing is visible at the destination before this
    fn close(self) -> OutputResult<()>;
}

/// Trait for writing spend records
pub trait SpendWriter: OutputWriter {
    /// Write a single record
    fn write_record(&mut self, record: &SpendRecord) -> OutputResult<()>;

    /// Write multiple records in order
    fn write_records(&mut self, records: &[SpendRecord]) -> OutputResult<()> {
        for record in records {
            self.write_record(record)?;
        }
        Ok(())
    }
}
