//! Chunked image upload with live progress, cancellation and batch
//! fan-out.
//!
//! [`UploadEngine`] owns one outbound transfer per file and streams
//! ordered [`UploadEvent`]s until a terminal state; [`BatchUploader`]
//! fans one user action out across N concurrent transfers and
//! aggregates their progress.

mod batch;
mod engine;
mod types;

pub use batch::{BatchEvent, BatchUploader};
pub use engine::{UploadEngine, UploadHandle};
pub use types::{UploadEvent, UploadOptions, UploadOutcome, UploadRecord, UploadStatus};

use pixvault_intake::FileRejection;

/// Default transfer chunk size: 256 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

/// Errors produced while transferring a file.
///
/// The first three mirror the intake rules — the engine re-checks them
/// before any backend call, and a hit surfaces as a failed transfer
/// rather than a validation rejection.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("\"{name}\" is not an image file")]
    UnsupportedType { name: String },

    #[error("\"{name}\" is too large (max 10MB)")]
    FileTooLarge { name: String },

    #[error("\"{name}\" is empty")]
    EmptyFile { name: String },

    #[error("transfer failed: {0}")]
    TransferFailed(#[from] pixvault_store::StoreError),

    #[error("cancelled")]
    Cancelled,
}

impl From<FileRejection> for UploadError {
    fn from(rejection: FileRejection) -> Self {
        match rejection {
            FileRejection::NotAnImage { name } => UploadError::UnsupportedType { name },
            FileRejection::TooLarge { name } => UploadError::FileTooLarge { name },
            FileRejection::Empty { name } => UploadError::EmptyFile { name },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_messages_match_intake() {
        let rejection = FileRejection::NotAnImage {
            name: "b.txt".into(),
        };
        let intake_message = rejection.to_string();
        let error: UploadError = rejection.into();
        assert_eq!(error.to_string(), intake_message);
    }

    #[test]
    fn cancelled_is_distinct_from_failure() {
        let cancelled = UploadError::Cancelled;
        assert!(matches!(cancelled, UploadError::Cancelled));
        let failed =
            UploadError::TransferFailed(pixvault_store::StoreError::Backend("down".into()));
        assert!(!matches!(failed, UploadError::Cancelled));
        assert_eq!(failed.to_string(), "transfer failed: backend error: down");
    }
}
