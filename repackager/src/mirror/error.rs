//! Error types for the mirror tool.

use crate::command::CommandError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors arising from mirroring a release.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// An HTTP request failed.
    #[error("request failed for {url}: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The index has no such project or file (HTTP 404).
    #[error("not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// The project page is not the expected JSON document.
    #[error("invalid project page from {url}: {source}")]
    InvalidProjectPage {
        /// The project page URL.
        url: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A local file operation failed.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        /// The path being accessed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Running the upload client failed.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The `anaconda` client is not installed or does not run.
    #[error(
        "anaconda client is not available; install it with `conda install anaconda-client`"
    )]
    ClientUnavailable,

    /// No upload token was supplied.
    #[error("no upload token; set ANACONDA_API_TOKEN")]
    MissingToken,

    /// There are no wheels to upload.
    #[error("no wheels to upload in {}", .0.display())]
    NoWheels(PathBuf),

    /// The upload command exited unsuccessfully.
    #[error("upload failed: {stderr}")]
    UploadFailed {
        /// The command's trimmed stderr.
        stderr: String,
    },
}
