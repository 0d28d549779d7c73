//! Scoped scratch directories for one repackage operation.
//!
//! A [`ScratchArea`] owns a temporary directory holding two empty
//! subdirectories, one per unpacked wheel. The directory is removed when the
//! area is dropped, so every exit path of the transform (success, warning,
//! error or panic unwinding) cleans up after itself.

use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SCRATCH_PREFIX: &str = ".wheel-repackage-scratch-";
const NATIVE_SUBDIR: &str = "native";
const CROSS_SUBDIR: &str = "cross";

/// A pair of empty directories for the native and cross-compiled unpacks.
#[derive(Debug)]
pub struct ScratchArea {
    root: TempDir,
    native: PathBuf,
    cross: PathBuf,
}

impl ScratchArea {
    /// Allocate a scratch area under `parent`, or under the system temporary
    /// directory when `parent` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directories cannot be created.
    pub fn create(parent: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_PREFIX);
        let root = parent.map_or_else(|| builder.tempdir(), |dir| builder.tempdir_in(dir))?;

        let native = root.path().join(NATIVE_SUBDIR);
        let cross = root.path().join(CROSS_SUBDIR);
        fs::create_dir(&native)?;
        fs::create_dir(&cross)?;
        debug!("allocated scratch area {}", root.path().display());

        Ok(Self {
            root,
            native,
            cross,
        })
    }

    /// Root of the scratch area.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Directory receiving the native wheel's contents.
    #[must_use]
    pub fn native(&self) -> &Path {
        &self.native
    }

    /// Directory receiving the cross-compiled wheel's contents.
    #[must_use]
    pub fn cross(&self) -> &Path {
        &self.cross
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_empty_subdirectories() {
        let parent = tempfile::tempdir().expect("tempdir");
        let area = ScratchArea::create(Some(parent.path())).expect("scratch");

        assert!(area.path().starts_with(parent.path()));
        for dir in [area.native(), area.cross()] {
            assert!(dir.is_dir());
            assert_eq!(fs::read_dir(dir).expect("read_dir").count(), 0);
        }
    }

    #[test]
    fn removes_everything_on_drop() {
        let parent = tempfile::tempdir().expect("tempdir");
        let area = ScratchArea::create(Some(parent.path())).expect("scratch");
        fs::write(area.native().join("file.txt"), "contents").expect("write");
        let root = area.path().to_path_buf();

        drop(area);

        assert!(!root.exists());
        assert_eq!(fs::read_dir(parent.path()).expect("read_dir").count(), 0);
    }

    #[test]
    fn missing_parent_is_an_error() {
        let parent = tempfile::tempdir().expect("tempdir");
        let missing = parent.path().join("absent");
        assert!(ScratchArea::create(Some(&missing)).is_err());
    }
}
