//! Transfer execution
//!
//! Runs one unit against the storage client and turns the result into a
//! [`TransferOutcome`]. A transfer only counts as successful when the
//! remote-confirmed byte count matches the local file size; a mismatch is a
//! failure with no error message, distinct from a service error. The
//! executor never retries and never decides fatality, it only attaches the
//! classification for the orchestrator to act on.

use super::{TransferOutcome, TransferUnit};
use crate::classify::classify;
use crate::client::{ProgressFn, StorageClient};
use std::sync::Arc;

pub struct TransferExecutor {
    client: Arc<dyn StorageClient>,
    bucket: String,
}

impl TransferExecutor {
    pub fn new(client: Arc<dyn StorageClient>, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Execute one unit. Safe to call from many workers concurrently.
    #[tracing::instrument(
        name = "transfer.unit",
        skip(self, progress),
        fields(bucket = %self.bucket, key = %unit.key)
    )]
    pub async fn transfer(&self, unit: TransferUnit, progress: ProgressFn) -> TransferOutcome {
        let local_size = match tokio::fs::metadata(&unit.local_path).await {
            Ok(meta) => meta.len() as i64,
            Err(e) => {
                let err = crate::client::StorageError::Io(e);
                let classification = classify(&err);
                return TransferOutcome {
                    unit,
                    success: false,
                    bytes_confirmed: 0,
                    local_size: -1,
                    classification: Some(classification),
                    error_message: Some(err.to_string()),
                };
            }
        };

        match self
            .client
            .upload(&self.bucket, &unit.key, &unit.local_path, progress)
            .await
        {
            Ok(confirmed) if confirmed as i64 == local_size => {
                tracing::info!(
                    local_path = %unit.local_path.display(),
                    size_local = local_size,
                    size_remote = confirmed,
                    "upload successful"
                );
                TransferOutcome {
                    unit,
                    success: true,
                    bytes_confirmed: confirmed,
                    local_size,
                    classification: None,
                    error_message: None,
                }
            }
            Ok(confirmed) => {
                // Short transfer: the service accepted the request but the
                // confirmed length disagrees with the local file.
                tracing::warn!(
                    local_path = %unit.local_path.display(),
                    size_local = local_size,
                    size_remote = confirmed,
                    "upload size mismatch"
                );
                TransferOutcome {
                    unit,
                    success: false,
                    bytes_confirmed: 0,
                    local_size,
                    classification: None,
                    error_message: None,
                }
            }
            Err(err) => {
                let classification = classify(&err);
                tracing::warn!(
                    local_path = %unit.local_path.display(),
                    error = %err,
                    fatal = classification.fatal,
                    "upload error"
                );
                TransferOutcome {
                    unit,
                    success: false,
                    bytes_confirmed: 0,
                    local_size,
                    classification: Some(classification),
                    error_message: Some(err.to_string()),
                }
            }
        }
    }
}
