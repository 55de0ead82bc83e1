//! Shared test fixtures: an in-memory storage client with programmable
//! per-call behavior.

use async_trait::async_trait;
use parking_lot::Mutex;
use s3lift::client::{ProgressFn, StorageClient, StorageError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// What the mock should do for one upload call.
#[derive(Clone)]
pub enum Behavior {
    /// Confirm exactly the local file's size.
    ConfirmFullSize,
    /// Confirm a fixed byte count regardless of the file.
    Confirm(u64),
    /// Fail with a service error carrying the given code.
    ServiceError(&'static str),
    /// Fail as if the host was unreachable.
    ConnectError,
}

/// In-memory [`StorageClient`] that applies one [`Behavior`] to every call
/// (or per-key overrides) and records what was uploaded.
pub struct MockStorageClient {
    default: Behavior,
    overrides: Mutex<Vec<(String, Behavior)>>,
    calls: AtomicUsize,
    uploaded_keys: Mutex<Vec<String>>,
}

impl MockStorageClient {
    pub fn new(default: Behavior) -> Self {
        Self {
            default,
            overrides: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            uploaded_keys: Mutex::new(Vec::new()),
        }
    }

    pub fn override_key(&self, key: &str, behavior: Behavior) {
        self.overrides.lock().push((key.to_string(), behavior));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn uploaded_keys(&self) -> Vec<String> {
        self.uploaded_keys.lock().clone()
    }
}

#[async_trait]
impl StorageClient for MockStorageClient {
    async fn upload(
        &self,
        _bucket: &str,
        key: &str,
        local_file: &Path,
        progress: ProgressFn,
    ) -> Result<u64, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.uploaded_keys.lock().push(key.to_string());

        let behavior = self
            .overrides
            .lock()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, b)| b.clone())
            .unwrap_or_else(|| self.default.clone());

        match behavior {
            Behavior::ConfirmFullSize => {
                let size = tokio::fs::metadata(local_file).await?.len();
                // deltas arrive in two increments to exercise accumulation
                let half = size / 2;
                progress(half);
                progress(size - half);
                Ok(size)
            }
            Behavior::Confirm(n) => {
                progress(n);
                Ok(n)
            }
            Behavior::ServiceError(code) => Err(StorageError::Service {
                code: code.into(),
                message: "injected failure".into(),
            }),
            Behavior::ConnectError => {
                Err(StorageError::Connect("dns lookup failed".into()))
            }
        }
    }
}

/// Write `size` bytes of zeroes at `path`.
pub fn write_file(path: &PathBuf, size: usize) {
    std::fs::write(path, vec![0u8; size]).unwrap();
}
