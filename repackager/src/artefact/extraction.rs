//! Wheel extraction with path traversal protection.
//!
//! Unpacks a wheel into a destination directory, validating every entry
//! before anything is written so that an archive containing `../` or
//! absolute entries is rejected as a whole (zip-slip).

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Unpacks a wheel into a directory.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use wheel_repackager::artefact::extraction::{ArchiveExtractor, ZipExtractor};
///
/// let files = ZipExtractor.extract(
///     Path::new("dist/numpy-2.0.2-cp312-cp312-linux_x86_64.whl"),
///     Path::new("scratch/native"),
/// )?;
/// assert!(!files.is_empty());
/// # Ok::<(), wheel_repackager::artefact::extraction::ExtractionError>(())
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor {
    /// Unpack `archive_path` below `dest_dir` and return the relative path
    /// of every entry, files and directories alike, in archive order.
    ///
    /// # Errors
    ///
    /// Fails with [`ExtractionError::PathTraversal`] when an entry would land
    /// outside `dest_dir`, [`ExtractionError::Archive`] when the wheel is not
    /// a readable ZIP file, and [`ExtractionError::Io`] when writing fails.
    fn extract(&self, archive_path: &Path, dest_dir: &Path)
    -> Result<Vec<PathBuf>, ExtractionError>;
}

/// Why a wheel could not be unpacked.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// Reading the wheel or writing a file failed.
    #[error("failed to unpack wheel: {0}")]
    Io(#[from] io::Error),

    /// The archive could not be read as a ZIP file.
    #[error("malformed archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// An entry name points outside the destination directory.
    #[error("entry {path} escapes the extraction directory")]
    PathTraversal {
        /// The offending entry name from the archive.
        path: String,
    },
}

/// Default extractor for ZIP-based wheels.
///
/// All entry names are validated before the first file is written, so a
/// rejected archive leaves `dest_dir` untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract(
        &self,
        archive_path: &Path,
        dest_dir: &Path,
    ) -> Result<Vec<PathBuf>, ExtractionError> {
        let file = fs::File::open(archive_path)?;
        let mut archive = zip::ZipArchive::new(file)?;

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let entry = archive.by_index_raw(index)?;
            let relative = validated_entry_path(
                entry.name(),
                entry.enclosed_name().map(|path| path.to_path_buf()),
            )?;
            entries.push((index, relative, entry.is_dir()));
        }

        let mut extracted = Vec::new();
        for (index, relative, is_dir) in entries {
            let dest_path = dest_dir.join(&relative);
            if is_dir {
                fs::create_dir_all(&dest_path)?;
                extracted.push(relative);
                continue;
            }
            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent)?;
            }

            let mut entry = archive.by_index(index)?;
            let mut output = fs::File::create(&dest_path)?;
            io::copy(&mut entry, &mut output)?;

            #[cfg(unix)]
            if let Some(mode) = entry.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&dest_path, fs::Permissions::from_mode(mode & 0o777))?;
            }

            extracted.push(relative);
        }

        Ok(extracted)
    }
}

/// Resolve an entry name to a relative path inside the destination.
///
/// `enclosed` is the archive reader's own sanitised view of the name; an
/// entry it cannot enclose is rejected outright.
fn validated_entry_path(
    name: &str,
    enclosed: Option<PathBuf>,
) -> Result<PathBuf, ExtractionError> {
    let relative = enclosed.ok_or_else(|| ExtractionError::PathTraversal {
        path: name.to_owned(),
    })?;
    validate_entry_path(Path::new(name))?;
    validate_entry_path(&relative)?;
    Ok(relative)
}

/// Validate that an entry path does not escape the destination
/// directory via `..` components or absolute paths.
pub(crate) fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    let escapes = path.is_absolute()
        || path.has_root()
        || path
            .components()
            .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)));
    if escapes {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}
