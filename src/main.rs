//! s3lift - S3 bulk upload CLI
//!
//! Uploads a file, a directory tree, or a manifest of files to an S3
//! bucket, with throughput tracking and a persisted failure log.

use clap::{Parser, Subcommand};
use s3lift::classify::MSG_INVALID_FILEPATH;
use s3lift::client::S3StorageClient;
use s3lift::config::{ConfigStore, CredentialsConfig, MSG_CONFIGURE_CREDENTIALS};
use s3lift::failures::FailureRecorder;
use s3lift::transfer::orchestrator::DEFAULT_CONCURRENCY;
use s3lift::transfer::{
    Summary, TransferError, TransferMode, TransferRequest, UploadOrchestrator,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// s3lift - upload local files or directory trees to S3
#[derive(Parser, Debug)]
#[command(name = "s3lift")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store AWS credentials and region (prompted interactively)
    Credentials,

    /// Upload a file, directory tree, or manifest of files
    Put {
        /// Local file, directory, or manifest path
        local_path: PathBuf,

        /// Target S3 bucket
        bucket: String,

        /// Remote key prefix (directory uploads default to the
        /// directory's own name)
        #[arg(short, long)]
        prefix: Option<String>,

        /// Treat the local path as a manifest listing one file per line
        #[arg(long)]
        manifest: bool,

        /// Number of concurrent transfers
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting s3lift v{}", s3lift::VERSION);

    let store = ConfigStore::default_location()?;
    match args.command {
        Command::Credentials => configure_credentials(&store),
        Command::Put {
            local_path,
            bucket,
            prefix,
            manifest,
            concurrency,
        } => run_put(&store, local_path, bucket, prefix, manifest, concurrency).await,
    }
}

fn configure_credentials(store: &ConfigStore) -> anyhow::Result<()> {
    let config = CredentialsConfig {
        access_key: prompt("Access Key:")?,
        secret_key: prompt("Secret Key:")?,
        region: prompt("Region:")?,
    };
    store.save(&config)?;
    println!("Credentials saved to {}", store.path().display());
    Ok(())
}

fn prompt(label: &str) -> anyhow::Result<String> {
    println!("{label}");
    std::io::stdout().flush()?;
    let mut value = String::new();
    std::io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

async fn run_put(
    store: &ConfigStore,
    local_path: PathBuf,
    bucket: String,
    prefix: Option<String>,
    manifest: bool,
    concurrency: usize,
) -> anyhow::Result<()> {
    let creds = match store.load()? {
        Some(c) if c.is_complete() => c,
        _ => {
            eprintln!();
            eprintln!("{MSG_CONFIGURE_CREDENTIALS}");
            std::process::exit(1);
        }
    };
    info!("AWS Region - {}", creds.region);

    let mode = if manifest {
        TransferMode::List
    } else if local_path.is_dir() {
        TransferMode::Directory
    } else if local_path.is_file() {
        TransferMode::File
    } else {
        eprintln!();
        eprintln!("{MSG_INVALID_FILEPATH}");
        std::process::exit(1);
    };

    let client = Arc::new(S3StorageClient::connect(&creds).await);
    let recorder = Arc::new(FailureRecorder::new(store.app_dir()));
    let orchestrator =
        UploadOrchestrator::new(client, recorder).with_concurrency(concurrency);

    let request = TransferRequest::new(bucket, local_path, prefix, mode);
    info!(
        "Initializing S3 put operation - BucketName={}, prefix={:?}, mode={:?}",
        request.bucket, request.prefix, request.mode
    );

    match orchestrator.execute(request).await {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(TransferError::Fatal(abort)) => {
            print_summary(&abort.summary);
            eprintln!();
            eprintln!("{}", abort.message);
            std::process::exit(1);
        }
        Err(TransferError::InvalidLocalPath(_)) => {
            eprintln!();
            eprintln!("{MSG_INVALID_FILEPATH}");
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

fn print_summary(summary: &Summary) {
    println!("---------------------------------------");
    println!("S3 Upload Summary");
    println!("---------------------------------------");
    println!("Successful Object(s): {}", summary.success_count);
    println!("Failed Object(s): {}", summary.failure_count);
    println!("Total Byte(s) Transferred: {}", summary.total_bytes);
    println!(
        "Overall Rate: {:.2} Mbps over {:.1}s (min {:.2} / max {:.2})",
        summary.overall_rate_mbps,
        summary.elapsed_secs,
        summary.min_rate_mbps,
        summary.max_rate_mbps
    );
}
