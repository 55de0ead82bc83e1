//! S3 implementation of the storage client capability
//!
//! Wraps the AWS SDK: `PutObject` for the byte transfer, `HeadObject` to
//! read back the content length the service recorded. The confirmed length
//! is what the transfer core compares against the local file size.

use super::{ProgressFn, StorageClient, StorageError};
use crate::config::CredentialsConfig;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use std::path::Path;

/// S3-backed storage client
///
/// One instance per run; the underlying SDK client is cheap to clone and
/// handles its own connection pooling.
#[derive(Clone)]
pub struct S3StorageClient {
    client: aws_sdk_s3::Client,
}

impl S3StorageClient {
    /// Build a client from stored credentials and region.
    pub async fn connect(creds: &CredentialsConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(creds.region.clone()))
            .credentials_provider(Credentials::new(
                creds.access_key.clone(),
                creds.secret_key.clone(),
                None,
                None,
                "s3lift-config",
            ))
            .load()
            .await;

        Self {
            client: aws_sdk_s3::Client::new(&sdk_config),
        }
    }

    /// Wrap an existing SDK client (tests and embedders).
    pub fn from_sdk_client(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StorageClient for S3StorageClient {
    #[tracing::instrument(
        name = "s3.upload",
        skip(self, progress),
        fields(s3.bucket = %bucket, s3.key = %key, upload.bytes = tracing::field::Empty)
    )]
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        local_file: &Path,
        progress: ProgressFn,
    ) -> Result<u64, StorageError> {
        // Surfaces a NotFound io error for missing paths before the SDK
        // gets involved, so classification sees InvalidLocalPath.
        let metadata = tokio::fs::metadata(local_file).await?;
        tracing::Span::current().record("upload.bytes", metadata.len());

        let body = ByteStream::from_path(local_file)
            .await
            .map_err(|e| StorageError::Io(std::io::Error::other(e.to_string())))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(map_sdk_error)?;

        let head = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(map_sdk_error)?;

        let confirmed = head.content_length().unwrap_or_default().max(0) as u64;
        progress(confirmed);

        tracing::debug!(confirmed, "upload confirmed");
        Ok(confirmed)
    }
}

/// Flatten an SDK error into the classifiable [`StorageError`] shape,
/// preserving the service error code when one is present.
fn map_sdk_error<E>(err: SdkError<E, HttpResponse>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    match &err {
        SdkError::DispatchFailure(failure) => {
            let detail = failure
                .as_connector_error()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "dispatch failure".to_string());
            StorageError::Connect(detail)
        }
        SdkError::TimeoutError(_) => StorageError::Connect("request timed out".to_string()),
        _ => {
            let code = err
                .as_service_error()
                .and_then(|e| e.code())
                .unwrap_or("Unknown")
                .to_string();
            let message = err
                .as_service_error()
                .and_then(|e| e.message())
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            StorageError::Service { code, message }
        }
    }
}
