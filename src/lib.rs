//! s3lift Library
//!
//! Uploads local files or directory trees to an S3 bucket, tracking
//! throughput and recording per-object failures for later inspection.
//!
//! # Features
//!
//! - **Three transfer modes**: single file, recursive directory tree, or a
//!   manifest listing local paths
//! - **Bounded concurrency**: a worker pool (default 20) drives transfers
//! - **Fail fast**: configuration errors (bad credentials, wrong region,
//!   missing bucket, no connectivity) abort the whole run immediately
//! - **Failure log**: per-object failures land in a dated, append-only CSV
//! - **Throughput tracking**: overall plus min/max instantaneous Mbps
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use s3lift::client::S3StorageClient;
//! use s3lift::config::CredentialsConfig;
//! use s3lift::failures::FailureRecorder;
//! use s3lift::transfer::{TransferMode, TransferRequest, UploadOrchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let creds = CredentialsConfig {
//!         access_key: "AKIA...".into(),
//!         secret_key: "...".into(),
//!         region: "us-east-1".into(),
//!     };
//!     let client = Arc::new(S3StorageClient::connect(&creds).await);
//!     let recorder = Arc::new(FailureRecorder::new(".s3lift"));
//!     let orchestrator = UploadOrchestrator::new(client, recorder);
//!
//!     let request = TransferRequest::new(
//!         "my-bucket",
//!         "photos/",
//!         None,
//!         TransferMode::Directory,
//!     );
//!     let summary = orchestrator.execute(request).await?;
//!     println!("{} object(s), {} byte(s)", summary.success_count, summary.total_bytes);
//!     Ok(())
//! }
//! ```

pub mod classify;
pub mod client;
pub mod config;
pub mod failures;
pub mod perf;
pub mod transfer;

// Re-export commonly used types
pub use transfer::{Summary, TransferMode, TransferRequest, UploadOrchestrator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
