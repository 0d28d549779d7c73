//! Wheel packaging from an unpacked directory tree.
//!
//! Archives are reproducible: entries are ordered by their `/`-separated
//! relative path, every entry carries the same fixed timestamp, and only the
//! Unix permission bits of the source files vary. Directory entries are
//! written only for the directories the caller names, so a tree unpacked
//! from a wheel without them is repacked without them. The archive is written to
//! a hidden temporary file beside the output and renamed into place, so the
//! output path only ever holds a complete archive.

use super::packaging_error::PackagingError;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Default permission bits for entries whose source mode is unknown.
const DEFAULT_ENTRY_MODE: u32 = 0o644;

/// Permission bits recorded for every directory entry.
const DIRECTORY_MODE: u32 = 0o755;

/// A file scheduled for inclusion in an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry name inside the archive, always `/`-separated. Directory
    /// names end with `/`.
    pub name: String,
    /// Path on disk.
    pub source: PathBuf,
    /// Unix permission bits recorded for the entry.
    pub mode: u32,
    /// Whether the entry is a directory.
    pub directory: bool,
}

/// Collect every regular file below `root`, plus each of `directories`
/// that exists below `root`, as an [`ArchiveEntry`].
///
/// `directories` are relative to `root`. Entries are sorted
/// lexicographically by name, independent of the order the filesystem
/// returns directory entries in.
///
/// # Errors
///
/// Returns [`PackagingError::Walk`] if the tree cannot be traversed and
/// [`PackagingError::NonUtf8Path`] for names that cannot be stored.
pub fn collect_entries(
    root: &Path,
    directories: &[PathBuf],
) -> Result<Vec<ArchiveEntry>, PackagingError> {
    let walk_error = |source: walkdir::Error| PackagingError::Walk {
        root: root.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry_result in WalkDir::new(root).follow_links(false) {
        let item = entry_result.map_err(walk_error)?;
        if !item.file_type().is_file() {
            continue;
        }
        // WalkDir only yields paths below `root`.
        let Ok(relative) = item.path().strip_prefix(root) else {
            continue;
        };
        let metadata = item.metadata().map_err(walk_error)?;
        entries.push(ArchiveEntry {
            name: entry_name(relative)?,
            source: item.path().to_path_buf(),
            mode: entry_mode(&metadata),
            directory: false,
        });
    }

    let explicit: BTreeSet<&Path> = directories
        .iter()
        .map(PathBuf::as_path)
        .filter(|dir| dir.components().next().is_some() && root.join(dir).is_dir())
        .collect();
    for dir in explicit {
        entries.push(ArchiveEntry {
            name: format!("{}/", entry_name(dir)?),
            source: root.join(dir),
            mode: DIRECTORY_MODE,
            directory: true,
        });
    }
    entries.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(entries)
}

/// Join the components of a relative path with `/`.
fn entry_name(relative: &Path) -> Result<String, PackagingError> {
    let parts = relative
        .components()
        .map(|component| {
            component
                .as_os_str()
                .to_str()
                .ok_or_else(|| PackagingError::NonUtf8Path(relative.to_path_buf()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join("/"))
}

#[cfg(unix)]
fn entry_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
const fn entry_mode(_metadata: &fs::Metadata) -> u32 {
    DEFAULT_ENTRY_MODE
}

/// Options shared by every entry: deflate, fixed 1980-01-01 timestamp.
fn entry_options(mode: u32) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(mode)
}

/// Package the files below `source_dir` into a wheel at `output_path`,
/// without directory entries.
///
/// # Errors
///
/// See [`create_archive_with_directories`].
pub fn create_archive(source_dir: &Path, output_path: &Path) -> Result<(), PackagingError> {
    create_archive_with_directories(source_dir, &[], output_path)
}

/// Package the tree below `source_dir` into a wheel at `output_path`,
/// recording an explicit entry for each of `directories`.
///
/// Any existing file at `output_path` is replaced as a whole once the new
/// archive is complete. On failure the temporary file is removed and
/// `output_path` is left as it was.
///
/// # Errors
///
/// Returns [`PackagingError::InvalidOutputPath`] if `output_path` has no
/// filename, [`PackagingError::Persist`] if the final rename fails, and
/// [`PackagingError::Io`] / [`PackagingError::Archive`] on write failures.
pub fn create_archive_with_directories(
    source_dir: &Path,
    directories: &[PathBuf],
    output_path: &Path,
) -> Result<(), PackagingError> {
    if output_path.file_name().is_none() {
        return Err(PackagingError::InvalidOutputPath(output_path.to_path_buf()));
    }
    let parent = match output_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let entries = collect_entries(source_dir, directories)?;
    fs::create_dir_all(parent)?;

    let staging = tempfile::Builder::new()
        .prefix(".wheel-repackage-")
        .suffix(".tmp")
        .tempfile_in(parent)?;
    write_entries(staging.as_file(), &entries)?;
    staging.as_file().sync_all()?;
    publish_permissions(staging.path())?;

    staging
        .persist(output_path)
        .map_err(|err| PackagingError::Persist {
            path: output_path.to_path_buf(),
            source: err.error,
        })?;
    Ok(())
}

/// Stream `entries` into a ZIP archive backed by `file`.
fn write_entries(file: &fs::File, entries: &[ArchiveEntry]) -> Result<(), PackagingError> {
    let mut writer = zip::ZipWriter::new(file);
    for entry in entries {
        if entry.directory {
            writer.add_directory(entry.name.as_str(), entry_options(entry.mode))?;
            continue;
        }
        writer.start_file(entry.name.as_str(), entry_options(entry.mode))?;
        let mut source = fs::File::open(&entry.source)?;
        io::copy(&mut source, &mut writer)?;
    }
    writer.finish()?;
    Ok(())
}

/// Temporary files are created owner-only; published wheels are not.
#[cfg(unix)]
fn publish_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(DEFAULT_ENTRY_MODE))
}

#[cfg(not(unix))]
const fn publish_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[path = "packaging_tests.rs"]
mod tests;
