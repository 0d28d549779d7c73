//! The repackaging transform.
//!
//! Rebuilds a native wheel with a declared set of files taken from a
//! cross-compiled build of the same package:
//!
//! 1. locate both wheels (before any scratch space is allocated);
//! 2. unpack each into its half of a [`ScratchArea`];
//! 3. move every declared cross-build file over its native counterpart;
//! 4. repack the native tree into `output_dir` under the native filename.
//!
//! Declared files missing from either tree are reported as warnings and
//! leave the native content in place.

use crate::artefact::extraction::{ArchiveExtractor, ZipExtractor, validate_entry_path};
use crate::artefact::locator::locate_wheel;
use crate::artefact::packaging::create_archive_with_directories;
use crate::artefact::packaging_error::PackagingError;
use crate::artefact::record::refresh_record;
use crate::error::{RepackageError, Result, WheelRole};
use crate::package_name::PackageName;
use crate::scratch::ScratchArea;
use log::{debug, info, warn};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Inputs for a single repackage operation.
#[derive(Debug, Clone)]
pub struct RepackageRequest {
    /// Package name as given by the recipe.
    pub name: PackageName,
    /// Package version as given by the recipe.
    pub version: String,
    /// Directory holding the natively-built wheel.
    pub native_dir: PathBuf,
    /// Directory holding the cross-compiled wheel.
    pub cross_dir: PathBuf,
    /// Directory receiving the repackaged wheel.
    pub output_dir: PathBuf,
    /// Wheel-relative paths to take from the cross-compiled wheel, in order.
    pub cross_build_files: Vec<String>,
    /// Parent for the scratch area; the system temporary directory if unset.
    pub scratch_root: Option<PathBuf>,
    /// Rewrite `RECORD` entries for replaced files.
    pub update_record: bool,
}

/// Why a declared cross-build file was not overlaid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// The cross-compiled wheel does not contain the file.
    MissingSourceFile,
    /// The native wheel does not contain the file.
    MissingTargetFile,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSourceFile => f.write_str("not found in cross-compiled wheel"),
            Self::MissingTargetFile => f.write_str("not found in native wheel"),
        }
    }
}

/// A non-fatal problem with one declared cross-build file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepackageWarning {
    /// What went wrong.
    pub kind: WarningKind,
    /// The declared path.
    pub path: String,
}

impl fmt::Display for RepackageWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)
    }
}

/// Result of a successful repackage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepackageOutput {
    /// The written wheel.
    pub output_path: PathBuf,
    /// Declared files that were skipped.
    pub warnings: Vec<RepackageWarning>,
}

/// Repackage using the ZIP extractor.
///
/// # Errors
///
/// See [`repackage_with`].
pub fn repackage(request: &RepackageRequest) -> Result<RepackageOutput> {
    repackage_with(request, &ZipExtractor)
}

/// Repackage using `extractor` to unpack both wheels.
///
/// # Errors
///
/// Returns [`RepackageError::InvalidCrossBuildFile`] for a declared path
/// that is absolute or climbs out of the wheel root, and
/// [`RepackageError::Locate`] when either wheel is missing or ambiguous.
/// Both are raised before anything is extracted. Extraction, overlay,
/// `RECORD` and write failures are returned as their respective variants;
/// in every case the scratch area is removed and no output is left behind.
pub fn repackage_with(
    request: &RepackageRequest,
    extractor: &dyn ArchiveExtractor,
) -> Result<RepackageOutput> {
    for path in &request.cross_build_files {
        validate_cross_build_file(path)?;
    }

    let native_wheel = locate(request, &request.native_dir, WheelRole::Native)?;
    let cross_wheel = locate(request, &request.cross_dir, WheelRole::Cross)?;
    let output_path = output_path_for(&native_wheel, &request.output_dir)?;

    let scratch = ScratchArea::create(request.scratch_root.as_deref())
        .map_err(RepackageError::Scratch)?;
    let native_entries = extract(extractor, &native_wheel, scratch.native())?;
    extract(extractor, &cross_wheel, scratch.cross())?;
    let native_directories: Vec<PathBuf> = native_entries
        .into_iter()
        .filter(|entry| scratch.native().join(entry).is_dir())
        .collect();

    let (replaced, warnings) = overlay(&scratch, &request.cross_build_files)?;
    if request.update_record && !replaced.is_empty() {
        refresh_record(scratch.native(), &replaced)?;
    }

    create_archive_with_directories(scratch.native(), &native_directories, &output_path)
        .map_err(|source| RepackageError::Write {
            path: output_path.clone(),
            source,
        })?;

    info!(
        "repackaged {} {}: {} file(s) replaced, {} warning(s), wrote {}",
        request.name,
        request.version,
        replaced.len(),
        warnings.len(),
        output_path.display()
    );
    Ok(RepackageOutput {
        output_path,
        warnings,
    })
}

fn validate_cross_build_file(path: &str) -> Result<()> {
    let invalid = || RepackageError::InvalidCrossBuildFile {
        path: path.to_owned(),
    };
    if path.trim().is_empty() {
        return Err(invalid());
    }
    validate_entry_path(Path::new(path)).map_err(|_| invalid())
}

fn locate(request: &RepackageRequest, directory: &Path, role: WheelRole) -> Result<PathBuf> {
    let wheel = locate_wheel(directory, &request.name, &request.version)
        .map_err(|source| RepackageError::Locate { role, source })?;
    debug!("{role} wheel for {}: {}", request.name, wheel.display());
    Ok(wheel)
}

fn output_path_for(native_wheel: &Path, output_dir: &Path) -> Result<PathBuf> {
    native_wheel
        .file_name()
        .map(|file_name| output_dir.join(file_name))
        .ok_or_else(|| RepackageError::Write {
            path: output_dir.to_path_buf(),
            source: PackagingError::InvalidOutputPath(native_wheel.to_path_buf()),
        })
}

fn extract(
    extractor: &dyn ArchiveExtractor,
    archive: &Path,
    dest: &Path,
) -> Result<Vec<PathBuf>> {
    let entries = extractor
        .extract(archive, dest)
        .map_err(|source| RepackageError::Extraction {
            archive: archive.to_path_buf(),
            source,
        })?;
    debug!("extracted {} entries from {}", entries.len(), archive.display());
    Ok(entries)
}

/// Move each declared file from the cross tree over the native tree.
///
/// Returns the declared paths that were replaced alongside the warnings for
/// those that were not.
fn overlay<'a>(
    scratch: &ScratchArea,
    cross_build_files: &'a [String],
) -> Result<(Vec<&'a str>, Vec<RepackageWarning>)> {
    let mut replaced = Vec::new();
    let mut warnings = Vec::new();

    for path in cross_build_files {
        let source = scratch.cross().join(path);
        let target = scratch.native().join(path);

        let missing = if !source.is_file() {
            Some(WarningKind::MissingSourceFile)
        } else if !target.is_file() {
            Some(WarningKind::MissingTargetFile)
        } else {
            None
        };
        if let Some(kind) = missing {
            let warning = RepackageWarning {
                kind,
                path: path.clone(),
            };
            warn!("skipping cross-build file {warning}");
            warnings.push(warning);
            continue;
        }

        fs::rename(&source, &target).map_err(|err| RepackageError::Overlay {
            path: path.clone(),
            source: err,
        })?;
        debug!("overlaid {path}");
        replaced.push(path.as_str());
    }

    Ok((replaced, warnings))
}

#[cfg(test)]
#[path = "repackage_tests.rs"]
mod tests;
