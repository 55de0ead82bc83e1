//! Upload orchestration integration tests
//!
//! Drives full transfer runs against the in-memory mock storage client and
//! checks summaries, failure logs, and fail-fast behavior.

mod common;

use common::{write_file, Behavior, MockStorageClient};
use s3lift::classify::ErrorCategory;
use s3lift::failures::FailureRecorder;
use s3lift::transfer::{
    TransferError, TransferMode, TransferRequest, UploadOrchestrator,
};
use std::sync::Arc;
use tempfile::TempDir;

const MIB: usize = 1_048_576;

struct Fixture {
    _dir: TempDir,
    root: std::path::PathBuf,
    client: Arc<MockStorageClient>,
    recorder: Arc<FailureRecorder>,
}

impl Fixture {
    fn new(behavior: Behavior) -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("data");
        std::fs::create_dir_all(&root).unwrap();
        let client = Arc::new(MockStorageClient::new(behavior));
        let recorder = Arc::new(FailureRecorder::new(dir.path().join("app")));
        Self {
            _dir: dir,
            root,
            client,
            recorder,
        }
    }

    fn orchestrator(&self, concurrency: usize) -> UploadOrchestrator {
        UploadOrchestrator::new(
            Arc::clone(&self.client) as Arc<dyn s3lift::client::StorageClient>,
            Arc::clone(&self.recorder),
        )
        .with_concurrency(concurrency)
    }
}

// Scenario A: a 1 MiB file uploads and the remote confirms the full size.
#[tokio::test]
async fn single_file_full_confirmation() {
    let fx = Fixture::new(Behavior::ConfirmFullSize);
    let file = fx.root.join("payload.bin");
    write_file(&file, MIB);

    let request = TransferRequest::new("bucket", &file, None, TransferMode::File);
    let summary = fx.orchestrator(4).execute(request).await.unwrap();

    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.failure_count, 0);
    assert_eq!(summary.total_bytes, MIB as u64);
    // no failures recorded, no log file written
    assert!(!fx.recorder.log_path().exists());
}

// Scenario B: the remote confirms fewer bytes than the local file holds.
#[tokio::test]
async fn short_transfer_is_failure_without_message() {
    let fx = Fixture::new(Behavior::Confirm(1_048_000));
    let file = fx.root.join("payload.bin");
    write_file(&file, MIB);

    let request = TransferRequest::new("bucket", &file, None, TransferMode::File);
    let summary = fx.orchestrator(4).execute(request).await.unwrap();

    assert_eq!(summary.success_count, 0);
    assert_eq!(summary.failure_count, 1);
    assert_eq!(summary.total_bytes, 0);

    let log = std::fs::read_to_string(fx.recorder.log_path()).unwrap();
    let row = log.lines().nth(1).unwrap();
    assert!(row.contains("payload.bin"));
    assert!(row.contains(",1048576,"));
    // short transfer carries no error message
    assert!(row.ends_with(','));
}

// Scenario C: a tree of 3 files plus a subdirectory holding 2 more.
#[tokio::test]
async fn directory_tree_uploads_every_regular_file() {
    let fx = Fixture::new(Behavior::ConfirmFullSize);
    let sub = fx.root.join("nested");
    std::fs::create_dir_all(&sub).unwrap();
    for name in ["a.bin", "b.bin", "c.bin"] {
        write_file(&fx.root.join(name), 100);
    }
    for name in ["d.bin", "e.bin"] {
        write_file(&sub.join(name), 100);
    }

    let request = TransferRequest::new("bucket", &fx.root, None, TransferMode::Directory);
    let summary = fx.orchestrator(4).execute(request).await.unwrap();

    assert_eq!(summary.success_count, 5);
    assert_eq!(summary.total_bytes, 500);

    let mut keys = fx.client.uploaded_keys();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            "data/a.bin",
            "data/b.bin",
            "data/c.bin",
            "data/nested/d.bin",
            "data/nested/e.bin",
        ]
    );
}

// Scenario D: an invalid access key aborts the run before further units start.
#[tokio::test]
async fn invalid_access_key_fails_fast() {
    let fx = Fixture::new(Behavior::ServiceError("InvalidAccessKeyId"));
    let paths: Vec<_> = (0..4)
        .map(|i| {
            let p = fx.root.join(format!("f{i}.bin"));
            write_file(&p, 10);
            p
        })
        .collect();
    let manifest = fx.root.join("manifest.txt");
    std::fs::write(
        &manifest,
        paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join("\n"),
    )
    .unwrap();

    // width 1 makes scheduling order deterministic
    let request = TransferRequest::new("bucket", &manifest, None, TransferMode::List);
    let err = fx.orchestrator(1).execute(request).await.unwrap_err();

    let TransferError::Fatal(abort) = err else {
        panic!("expected fatal abort");
    };
    assert_eq!(abort.category, ErrorCategory::InvalidCredentials);
    assert_eq!(abort.message, "Please configure valid Access Key");
    assert_eq!(abort.summary.success_count, 0);
    // only the triggering unit ever reached the client
    assert_eq!(fx.client.calls(), 1);
}

// Scenario E: a two-line manifest yields exactly two units.
#[tokio::test]
async fn manifest_transfers_each_listed_file() {
    let fx = Fixture::new(Behavior::ConfirmFullSize);
    let a = fx.root.join("first.bin");
    let b = fx.root.join("second.bin");
    write_file(&a, 64);
    write_file(&b, 128);
    let manifest = fx.root.join("manifest.txt");
    std::fs::write(&manifest, format!("{}\n{}\n", a.display(), b.display())).unwrap();

    let request = TransferRequest::new("bucket", &manifest, None, TransferMode::List);
    let summary = fx.orchestrator(4).execute(request).await.unwrap();

    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.total_bytes, 192);
    let mut keys = fx.client.uploaded_keys();
    keys.sort();
    assert_eq!(keys, vec!["first.bin", "second.bin"]);
}

// Failed units contribute nothing to total_bytes even when some succeed.
#[tokio::test]
async fn mixed_outcomes_count_confirmed_bytes_only() {
    let fx = Fixture::new(Behavior::ConfirmFullSize);
    for name in ["good.bin", "bad.bin"] {
        write_file(&fx.root.join(name), 1000);
    }
    fx.client.override_key("data/bad.bin", Behavior::ServiceError("InternalError"));

    let request = TransferRequest::new("bucket", &fx.root, None, TransferMode::Directory);
    let summary = fx.orchestrator(4).execute(request).await.unwrap();

    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.failure_count, 1);
    assert_eq!(summary.total_bytes, 1000);

    // the per-object failure is in the log, run did not abort
    let log = std::fs::read_to_string(fx.recorder.log_path()).unwrap();
    assert!(log.contains("bad.bin"));
    assert!(log.contains("InternalError"));
}

// A connect failure is systemic and aborts like a credential error.
#[tokio::test]
async fn connectivity_loss_aborts_run() {
    let fx = Fixture::new(Behavior::ConnectError);
    let file = fx.root.join("f.bin");
    write_file(&file, 10);

    let request = TransferRequest::new("bucket", &file, None, TransferMode::File);
    let err = fx.orchestrator(4).execute(request).await.unwrap_err();

    let TransferError::Fatal(abort) = err else {
        panic!("expected fatal abort");
    };
    assert_eq!(abort.category, ErrorCategory::NoConnectivity);
    assert_eq!(
        abort.message,
        "Cannot connect to host. Please check internet connectivity"
    );
}

// A missing request path surfaces as an invalid-path error, not a panic.
#[tokio::test]
async fn missing_request_path_is_invalid() {
    let fx = Fixture::new(Behavior::ConfirmFullSize);
    let request = TransferRequest::new(
        "bucket",
        fx.root.join("does-not-exist"),
        None,
        TransferMode::File,
    );
    let err = fx.orchestrator(4).execute(request).await.unwrap_err();
    assert!(matches!(err, TransferError::InvalidLocalPath(_)));
    assert_eq!(fx.client.calls(), 0);
}

// Zero-length runs report zero rates rather than dividing by zero.
#[tokio::test]
async fn empty_directory_reports_zero_rates() {
    let fx = Fixture::new(Behavior::ConfirmFullSize);
    let request = TransferRequest::new("bucket", &fx.root, None, TransferMode::Directory);
    let summary = fx.orchestrator(4).execute(request).await.unwrap();

    assert_eq!(summary.success_count, 0);
    assert_eq!(summary.failure_count, 0);
    assert_eq!(summary.total_bytes, 0);
    assert!(summary.overall_rate_mbps >= 0.0);
    assert!(summary.min_rate_mbps.is_finite());
    assert!(summary.max_rate_mbps.is_finite());
}

// Prefixes carry through to the keys the client sees.
#[tokio::test]
async fn explicit_prefix_prepends_keys() {
    let fx = Fixture::new(Behavior::ConfirmFullSize);
    let file = fx.root.join("report.pdf");
    write_file(&file, 10);

    let request = TransferRequest::new(
        "bucket",
        &file,
        Some("docs/2024".into()),
        TransferMode::File,
    );
    fx.orchestrator(4).execute(request).await.unwrap();
    assert_eq!(fx.client.uploaded_keys(), vec!["docs/2024/report.pdf"]);
}
