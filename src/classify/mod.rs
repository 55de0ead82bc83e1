//! Error classification
//!
//! Single authority for deciding whether a storage failure is systemic
//! (every subsequent transfer would fail the same way, so the run should
//! abort) or per-object (record it and keep going). Transfer workers never
//! make this call themselves.
//!
//! The mapping is a flat decision table keyed on the error's service code
//! or transport kind. The fatal categories all describe configuration
//! problems: continuing would only produce a wall of identical failures.

use crate::client::StorageError;

pub const MSG_INCORRECT_REGION: &str = "Please configure correct region";
pub const MSG_INVALID_ACCESS_KEY: &str = "Please configure valid Access Key";
pub const MSG_INVALID_SECRET_KEY: &str = "Please configure valid Secret Key";
pub const MSG_INVALID_BUCKET_NAME: &str = "Please provide a valid S3 bucket name";
pub const MSG_NO_CONNECTIVITY: &str = "Cannot connect to host. Please check internet connectivity";
pub const MSG_INVALID_FILEPATH: &str = "Please provide a valid file or directory";

/// Domain category of a transfer failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    IncorrectRegion,
    InvalidCredentials,
    InvalidBucket,
    NoConnectivity,
    InvalidLocalPath,
    TransferFailure,
}

/// Result of classifying a storage error
#[derive(Debug, Clone, Copy)]
pub struct Classification {
    pub category: ErrorCategory,
    /// Whether the orchestrator should stop submitting new units.
    pub fatal: bool,
    /// Short cause printed to the user before a fatal exit; generic
    /// per-object failures carry no user message and live only in the
    /// failure log.
    pub user_message: Option<&'static str>,
}

impl Classification {
    fn fatal(category: ErrorCategory, user_message: &'static str) -> Self {
        Self {
            category,
            fatal: true,
            user_message: Some(user_message),
        }
    }

    fn recoverable() -> Self {
        Self {
            category: ErrorCategory::TransferFailure,
            fatal: false,
            user_message: None,
        }
    }
}

/// Classify a storage error into a category and a fatal/recoverable verdict.
pub fn classify(err: &StorageError) -> Classification {
    match err {
        StorageError::Service { code, .. } => match code.as_str() {
            // StatusCode: 301
            "PermanentRedirect" => {
                Classification::fatal(ErrorCategory::IncorrectRegion, MSG_INCORRECT_REGION)
            }
            // StatusCode: 403
            "InvalidAccessKeyId" => {
                Classification::fatal(ErrorCategory::InvalidCredentials, MSG_INVALID_ACCESS_KEY)
            }
            "SignatureDoesNotMatch" => {
                Classification::fatal(ErrorCategory::InvalidCredentials, MSG_INVALID_SECRET_KEY)
            }
            "NoSuchBucket" => {
                Classification::fatal(ErrorCategory::InvalidBucket, MSG_INVALID_BUCKET_NAME)
            }
            _ => Classification::recoverable(),
        },
        StorageError::Connect(_) => {
            Classification::fatal(ErrorCategory::NoConnectivity, MSG_NO_CONNECTIVITY)
        }
        StorageError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
            Classification::fatal(ErrorCategory::InvalidLocalPath, MSG_INVALID_FILEPATH)
        }
        StorageError::Io(_) => Classification::recoverable(),
    }
}
