//! Unique wheel lookup inside a directory.
//!
//! A wheel for `{name}` at `{version}` is any file matching
//! `{normalized_name}*{version}*.whl`. Exactly one file must match: when a
//! native and a rebuilt wheel, or two platform builds, share a directory the
//! caller has to disambiguate rather than have one picked silently.

use super::WHEEL_EXTENSION;
use crate::package_name::PackageName;
use glob::{MatchOptions, Pattern};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors arising from wheel lookup.
#[derive(Debug, Error)]
pub enum LocateError {
    /// The search directory does not exist or is not a directory.
    #[error("wheel directory {} does not exist", .directory.display())]
    MissingDirectory {
        /// The directory that was searched.
        directory: PathBuf,
    },

    /// No file matched the wheel pattern.
    #[error("no wheel matching {pattern} in {}", .directory.display())]
    NotFound {
        /// The directory that was searched.
        directory: PathBuf,
        /// The glob pattern that was applied.
        pattern: String,
    },

    /// More than one file matched the wheel pattern.
    #[error(
        "{} wheels match {pattern} in {}: {}",
        .matches.len(),
        .directory.display(),
        render_matches(.matches)
    )]
    Ambiguous {
        /// The directory that was searched.
        directory: PathBuf,
        /// The glob pattern that was applied.
        pattern: String,
        /// Every matching path, sorted.
        matches: Vec<PathBuf>,
    },

    /// The pattern built from the name and version could not be compiled.
    #[error("invalid wheel pattern {pattern}: {source}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// The underlying glob error.
        #[source]
        source: glob::PatternError,
    },

    /// Reading the directory failed.
    #[error("failed to read {}: {source}", .directory.display())]
    Io {
        /// The directory that was searched.
        directory: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

fn render_matches(matches: &[PathBuf]) -> String {
    matches
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the filename pattern for a package version.
///
/// Glob metacharacters in the name or version are escaped so that only the
/// two separating wildcards are live.
///
/// # Examples
///
/// ```
/// use wheel_repackager::artefact::locator::wheel_pattern;
/// use wheel_repackager::package_name::PackageName;
///
/// let pattern = wheel_pattern(&PackageName::from("scikit-learn"), "1.5.2");
/// assert_eq!(pattern, "scikit_learn*1.5.2*.whl");
/// ```
#[must_use]
pub fn wheel_pattern(name: &PackageName, version: &str) -> String {
    format!(
        "{}*{}*.{WHEEL_EXTENSION}",
        Pattern::escape(&name.normalized()),
        Pattern::escape(version)
    )
}

/// Find the single wheel for `name` at `version` in `directory`.
///
/// Matching is case-insensitive because index filenames keep the project's
/// display casing (`PyYAML-6.0.2-...`) while recipes usually do not.
///
/// # Errors
///
/// Returns [`LocateError::NotFound`] when nothing matches,
/// [`LocateError::Ambiguous`] when several files match, and
/// [`LocateError::MissingDirectory`] or [`LocateError::Io`] when the
/// directory cannot be read.
pub fn locate_wheel(
    directory: &Path,
    name: &PackageName,
    version: &str,
) -> Result<PathBuf, LocateError> {
    if !directory.is_dir() {
        return Err(LocateError::MissingDirectory {
            directory: directory.to_path_buf(),
        });
    }

    let pattern_text = wheel_pattern(name, version);
    let pattern = Pattern::new(&pattern_text).map_err(|source| LocateError::InvalidPattern {
        pattern: pattern_text.clone(),
        source,
    })?;
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };

    let io_error = |source: std::io::Error| LocateError::Io {
        directory: directory.to_path_buf(),
        source,
    };
    let mut matches = Vec::new();
    for entry in fs::read_dir(directory).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        if !entry.file_type().map_err(io_error)?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        if pattern.matches_with(&file_name.to_string_lossy(), options) {
            matches.push(entry.path());
        }
    }
    matches.sort();

    debug!(
        "wheel pattern {pattern_text} matched {} file(s) in {}",
        matches.len(),
        directory.display()
    );

    match matches.len() {
        0 => Err(LocateError::NotFound {
            directory: directory.to_path_buf(),
            pattern: pattern_text,
        }),
        1 => Ok(matches.remove(0)),
        _ => Err(LocateError::Ambiguous {
            directory: directory.to_path_buf(),
            pattern: pattern_text,
            matches,
        }),
    }
}
