//! Failure recording
//!
//! Accumulates one record per failed transfer unit and persists them to a
//! dated, append-only CSV under the application directory. Per-object
//! failures are silent at the console; this log is where the detail lives.

use chrono::Local;
use parking_lot::Mutex;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Subdirectory of the application dir that holds failure logs.
pub const ERROR_LOGS_DIR: &str = "error-logs";

const CSV_DELIMITER: &str = ",";
const CSV_HEADER: &str = "Bucket Name, Object Key, Local File Path, File Size, Error Message";

/// Failure log errors
#[derive(Error, Debug)]
pub enum FailureLogError {
    #[error("failed to write failure log: {0}")]
    Io(#[from] std::io::Error),
}

/// One failed transfer unit, immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub bucket: String,
    pub key: String,
    pub local_path: PathBuf,
    /// Local file size in bytes, -1 when unknown.
    pub file_size: i64,
    /// Absent for short transfers (size mismatch with no service error).
    pub error_message: Option<String>,
}

impl FailureRecord {
    fn to_csv_row(&self) -> String {
        format!(
            "{}{d}{}{d}{}{d}{}{d}{}",
            self.bucket,
            self.key,
            self.local_path.display(),
            self.file_size,
            self.error_message.as_deref().unwrap_or(""),
            d = CSV_DELIMITER,
        )
    }
}

/// Thread-safe accumulator of failure records.
///
/// Records may arrive from any worker in any order; each appears exactly
/// once in the persisted log. `flush` drains what has accumulated so far,
/// so repeated flushes within the same run append rather than duplicate.
pub struct FailureRecorder {
    base_dir: PathBuf,
    records: Mutex<Vec<FailureRecord>>,
}

impl FailureRecorder {
    /// Recorder writing beneath `base_dir` (the application directory,
    /// e.g. `~/.s3lift`).
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn record(&self, record: FailureRecord) {
        tracing::error!(
            bucket = %record.bucket,
            key = %record.key,
            local_path = %record.local_path.display(),
            error = record.error_message.as_deref().unwrap_or("size mismatch"),
            "transfer unit failed"
        );
        self.records.lock().push(record);
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Path the current run period's records land in.
    pub fn log_path(&self) -> PathBuf {
        let stamp = Local::now().format("%Y-%m-%d");
        self.base_dir
            .join(ERROR_LOGS_DIR)
            .join(format!("{stamp}-s3-upload-failures.csv"))
    }

    /// Persist accumulated records, appending to the dated log file.
    ///
    /// Returns `Ok(false)` without touching the filesystem when nothing has
    /// been recorded; an empty run must not leave an empty file behind.
    pub fn flush(&self) -> Result<bool, FailureLogError> {
        let drained: Vec<FailureRecord> = std::mem::take(&mut *self.records.lock());
        if drained.is_empty() {
            return Ok(false);
        }

        let path = self.log_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let write_header = !path.exists();

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        if write_header {
            writeln!(file, "{CSV_HEADER}")?;
        }
        for record in &drained {
            writeln!(file, "{}", record.to_csv_row())?;
        }

        tracing::info!(count = drained.len(), path = %path.display(), "failure log written");
        Ok(true)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}
