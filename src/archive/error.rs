//! Archive error module
//!
//! Every failure on the download path is one `ArchiveError` variant. The
//! variant decides the HTTP status and the public message; the `Display`
//! text carries details and only goes to the error log.

use hyper::StatusCode;
use std::io;
use std::path::PathBuf;

pub const MSG_MISSING_IDENTIFIER: &str = "No MD5 provided.";
pub const MSG_INVALID_IDENTIFIER: &str = "Invalid MD5 provided.";
pub const MSG_OPEN_FAILED: &str = "Failed to open ZIP file.";
pub const MSG_EMPTY_ARCHIVE: &str = "ZIP file contains no entries.";
pub const MSG_EXTRACT_FAILED: &str = "Failed to extract file.";

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("identifier parameter is missing")]
    MissingIdentifier,

    #[error("identifier '{0}' does not match the allowed pattern")]
    InvalidIdentifier(String),

    #[error("failed to open archive {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("archive {0} contains no entries")]
    Empty(PathBuf),

    #[error("archive entry '{0}' cannot be extracted safely")]
    UnsafeEntry(String),

    #[error("archive entry '{name}' is {size} bytes, limit is {limit}")]
    TooLarge { name: String, size: u64, limit: u64 },

    #[error("failed to extract archive entry: {0}")]
    Extract(#[from] io::Error),

    #[error("failed to read archive entry: {0}")]
    Read(#[source] zip::result::ZipError),
}

impl ArchiveError {
    /// Status sent to the client when error statuses are enabled
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingIdentifier | Self::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            Self::Open { .. } => StatusCode::NOT_FOUND,
            Self::Empty(_)
            | Self::UnsafeEntry(_)
            | Self::TooLarge { .. }
            | Self::Extract(_)
            | Self::Read(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable plain-text body sent to the client
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::MissingIdentifier => MSG_MISSING_IDENTIFIER,
            Self::InvalidIdentifier(_) => MSG_INVALID_IDENTIFIER,
            Self::Open { .. } => MSG_OPEN_FAILED,
            Self::Empty(_) => MSG_EMPTY_ARCHIVE,
            Self::UnsafeEntry(_) | Self::TooLarge { .. } | Self::Extract(_) | Self::Read(_) => {
                MSG_EXTRACT_FAILED
            }
        }
    }

    /// Client-side mistakes are logged as warnings, the rest as errors
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}
