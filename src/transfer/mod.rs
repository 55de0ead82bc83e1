//! Transfer core
//!
//! Types and coordination for one upload run: a [`TransferRequest`] is
//! expanded into [`TransferUnit`]s, each unit is executed against the
//! storage client, and per-unit [`TransferOutcome`]s are aggregated into a
//! final [`Summary`].

use crate::classify::{Classification, ErrorCategory};
use crate::failures::FailureLogError;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use thiserror::Error;

pub mod executor;
pub mod orchestrator;
pub mod units;

pub use executor::TransferExecutor;
pub use orchestrator::UploadOrchestrator;

/// How the local path of a request is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// One regular file.
    File,
    /// A directory tree, walked recursively.
    Directory,
    /// A manifest file listing one local path per line.
    List,
}

/// One upload run's input, immutable once constructed.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub bucket: String,
    pub local_path: PathBuf,
    /// Remote key prefix; Directory mode defaults it to the root
    /// directory's base name when absent.
    pub prefix: Option<String>,
    pub mode: TransferMode,
}

impl TransferRequest {
    pub fn new(
        bucket: impl Into<String>,
        local_path: impl Into<PathBuf>,
        prefix: Option<String>,
        mode: TransferMode,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            local_path: local_path.into(),
            prefix,
            mode,
        }
    }
}

/// One (local file, remote key) transfer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferUnit {
    pub local_path: PathBuf,
    pub key: String,
}

/// Result of executing one unit.
#[derive(Debug)]
pub struct TransferOutcome {
    pub unit: TransferUnit,
    pub success: bool,
    /// Byte count the remote store confirmed; zero unless successful.
    pub bytes_confirmed: u64,
    /// Local file size, -1 when it could not be read.
    pub local_size: i64,
    /// Present when the storage client raised an error; absent for size
    /// mismatches (a short transfer is not a service error).
    pub classification: Option<Classification>,
    pub error_message: Option<String>,
}

/// Shared counters for one run.
///
/// Owned by the orchestrator; the abort flag is the one field workers
/// consult directly, before starting a new unit.
#[derive(Debug, Default)]
pub struct ProgressState {
    pub bytes_transferred: AtomicU64,
    pub successful: AtomicU64,
    pub failed: AtomicU64,
    abort: AtomicBool,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_abort(&self) {
        self.abort.store(true, Ordering::SeqCst);
    }

    pub fn abort_requested(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }
}

/// Aggregate result of one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub success_count: u64,
    pub failure_count: u64,
    /// Sum of confirmed bytes of successful units only.
    pub total_bytes: u64,
    pub overall_rate_mbps: f64,
    pub min_rate_mbps: f64,
    pub max_rate_mbps: f64,
    pub elapsed_secs: f64,
}

/// A fatal classification that aborted the run.
///
/// Carries the statistics gathered before the abort so the caller can still
/// report them.
#[derive(Debug, Clone)]
pub struct FatalAbort {
    pub category: ErrorCategory,
    pub message: String,
    pub summary: Summary,
}

impl std::fmt::Display for FatalAbort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Transfer run errors
#[derive(Error, Debug)]
pub enum TransferError {
    /// A systemic configuration error aborted the run.
    #[error("{0}")]
    Fatal(FatalAbort),

    /// The request's local path does not name what its mode requires.
    #[error("invalid local path: {}", .0.display())]
    InvalidLocalPath(PathBuf),

    #[error("failed to enumerate transfer units: {0}")]
    Enumeration(#[from] std::io::Error),

    #[error(transparent)]
    FailureLog(#[from] FailureLogError),
}
