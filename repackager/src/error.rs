//! Error types for the repackaging transform.
//!
//! Every variant is fatal for the package being processed. Missing
//! cross-build files are not errors; they are reported as
//! [`RepackageWarning`](crate::repackage::RepackageWarning)s instead.

use crate::artefact::extraction::ExtractionError;
use crate::artefact::locator::LocateError;
use crate::artefact::packaging_error::PackagingError;
use crate::artefact::record::RecordError;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Which of the two input wheels an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelRole {
    /// The natively-built wheel supplying everything but the overlaid files.
    Native,
    /// The cross-compiled wheel supplying the overlaid files.
    Cross,
}

impl fmt::Display for WheelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("native"),
            Self::Cross => f.write_str("cross-compiled"),
        }
    }
}

/// Errors that abort repackaging of a single package.
#[derive(Debug, Error)]
pub enum RepackageError {
    /// An input wheel could not be uniquely located.
    #[error("{role} wheel: {source}")]
    Locate {
        /// Which input wheel was being located.
        role: WheelRole,
        /// The lookup failure.
        #[source]
        source: LocateError,
    },

    /// A declared cross-build file is absolute or escapes the wheel root.
    #[error("invalid cross-build file {path}: must be a relative path inside the wheel")]
    InvalidCrossBuildFile {
        /// The declared path as written in the recipe.
        path: String,
    },

    /// The scratch area could not be allocated.
    #[error("failed to allocate scratch area: {0}")]
    Scratch(#[source] io::Error),

    /// An input wheel could not be extracted.
    #[error("failed to extract {}: {source}", .archive.display())]
    Extraction {
        /// The wheel being extracted.
        archive: PathBuf,
        /// The extraction failure.
        #[source]
        source: ExtractionError,
    },

    /// A cross-build file could not be moved over its native counterpart.
    #[error("failed to overlay {path}: {source}")]
    Overlay {
        /// The declared cross-build file.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The `RECORD` file could not be refreshed.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// The output wheel could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        /// The intended output path.
        path: PathBuf,
        /// The packaging failure.
        #[source]
        source: PackagingError,
    },
}

/// Result type for repackaging operations.
pub type Result<T> = std::result::Result<T, RepackageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_error_names_the_role() {
        let err = RepackageError::Locate {
            role: WheelRole::Cross,
            source: LocateError::MissingDirectory {
                directory: PathBuf::from("/wheels"),
            },
        };
        assert_eq!(
            err.to_string(),
            "cross-compiled wheel: wheel directory /wheels does not exist"
        );
    }

    #[test]
    fn invalid_cross_build_file_names_the_path() {
        let err = RepackageError::InvalidCrossBuildFile {
            path: "../escape.h".to_owned(),
        };
        assert!(err.to_string().contains("../escape.h"));
    }
}
