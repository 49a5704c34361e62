//! Run status and summary

use std::fmt;
use std::path::PathBuf;

/// Lifecycle of a single extraction run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    /// Windows are still being fetched
    #[default]
    Running,
    /// All windows fetched and output written
    Succeeded,
    /// Aborted on a fatal error; no output written
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Succeeded => write!(f, "succeeded"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Current status
    pub status: RunStatus,
    /// Windows fetched successfully
    pub windows: u64,
    /// Records collected
    pub records: u64,
    /// Attempts beyond the first, summed over all windows
    pub retries: u64,
    /// Where output was written, once it has been
    pub output_path: Option<PathBuf>,
}

impl RunSummary {
    /// Record a successfully fetched window
    pub fn window_done(&mut self, records: usize, attempts: u32) {
        self.windows += 1;
        self.records += records as u64;
        self.retries += u64::from(attempts.saturating_sub(1));
    }

    /// Mark the run finished with output at `path`
    pub fn succeed(&mut self, path: PathBuf) {
        self.status = RunStatus::Succeeded;
        self.output_path = Some(path);
    }

    /// Mark the run aborted; counters keep the progress made before the failure
    pub fn fail(&mut self) {
        self.status = RunStatus::Failed;
        self.output_path = None;
    }
}
