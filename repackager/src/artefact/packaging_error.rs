//! Error types for wheel packaging operations.
//!
//! Covers failures while walking the unpacked tree, writing the ZIP
//! archive, and moving the finished archive into place.

use std::path::PathBuf;
use thiserror::Error;

/// Errors arising from wheel packaging operations.
#[derive(Debug, Error)]
pub enum PackagingError {
    /// An I/O operation failed (reading source files, writing the archive).
    #[error("I/O error during packaging: {0}")]
    Io(#[from] std::io::Error),

    /// The ZIP writer rejected an entry or failed to finalise the archive.
    #[error("archive write error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Walking the source tree failed.
    #[error("failed to walk {}: {source}", .root.display())]
    Walk {
        /// The directory being packaged.
        root: PathBuf,
        /// The underlying traversal error.
        #[source]
        source: walkdir::Error,
    },

    /// A file path inside the source tree is not valid UTF-8 and cannot be
    /// stored as an entry name.
    #[error("entry path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    /// The output path has no parent directory or no filename.
    #[error("invalid output path: {}", .0.display())]
    InvalidOutputPath(PathBuf),

    /// The finished archive could not be renamed onto the output path.
    #[error("failed to move archive into place at {}: {source}", .path.display())]
    Persist {
        /// The final output path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
