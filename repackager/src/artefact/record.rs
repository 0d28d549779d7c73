//! `*.dist-info/RECORD` refresh for substituted files.
//!
//! A wheel's RECORD lists `path,sha256=<digest>,size` for every file.
//! Replacing a file leaves its line stale; [`refresh_record`] rewrites only
//! the lines of replaced paths and keeps every other line byte-for-byte.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use log::debug;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors arising from RECORD refresh.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Reading or writing RECORD, or hashing a file, failed.
    #[error("RECORD I/O error for {}: {source}", .path.display())]
    Io {
        /// The file being read or written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The unpacked wheel holds more than one `.dist-info` directory.
    #[error("multiple .dist-info directories found in {}", .root.display())]
    AmbiguousDistInfo {
        /// The unpacked wheel root.
        root: PathBuf,
    },
}

/// Compute a RECORD hash field (`sha256=` plus URL-safe base64, no padding).
///
/// # Examples
///
/// ```
/// use wheel_repackager::artefact::record::record_digest;
///
/// assert_eq!(
///     record_digest(b""),
///     "sha256=47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU"
/// );
/// ```
#[must_use]
pub fn record_digest(contents: &[u8]) -> String {
    let digest = Sha256::digest(contents);
    format!("sha256={}", URL_SAFE_NO_PAD.encode(digest))
}

/// Locate `<root>/*.dist-info/RECORD`.
///
/// Returns `Ok(None)` when the tree has no `.dist-info` directory or the
/// directory has no RECORD.
///
/// # Errors
///
/// Returns [`RecordError::AmbiguousDistInfo`] when several `.dist-info`
/// directories exist and [`RecordError::Io`] when `root` cannot be read.
pub fn find_record(root: &Path) -> Result<Option<PathBuf>, RecordError> {
    let io_error = |source: std::io::Error| RecordError::Io {
        path: root.to_path_buf(),
        source,
    };
    let mut dist_info = Vec::new();
    for entry in fs::read_dir(root).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        let is_dist_info = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().ends_with(".dist-info"));
        if is_dist_info && path.is_dir() {
            dist_info.push(path);
        }
    }

    match dist_info.as_slice() {
        [] => Ok(None),
        [single] => {
            let record = single.join("RECORD");
            Ok(record.is_file().then_some(record))
        }
        _ => Err(RecordError::AmbiguousDistInfo {
            root: root.to_path_buf(),
        }),
    }
}

/// Rewrite the RECORD lines of `replaced` paths under `root`.
///
/// Returns the RECORD path when one was found and rewritten, or `None`
/// when the tree has no RECORD.
///
/// # Errors
///
/// Returns [`RecordError`] if RECORD cannot be located, read, or written,
/// or a replaced file cannot be hashed.
pub fn refresh_record(root: &Path, replaced: &[&str]) -> Result<Option<PathBuf>, RecordError> {
    let Some(record_path) = find_record(root)? else {
        return Ok(None);
    };
    let targets: BTreeSet<&str> = replaced.iter().copied().collect();

    let contents = fs::read_to_string(&record_path).map_err(|source| RecordError::Io {
        path: record_path.clone(),
        source,
    })?;

    let mut updated = String::with_capacity(contents.len());
    let mut refreshed = 0_usize;
    for line in contents.lines() {
        let (path, raw_field) = path_field(line);
        if targets.contains(path.as_str()) {
            updated.push_str(&record_line(root, &path, raw_field)?);
            refreshed += 1;
        } else {
            updated.push_str(line);
        }
        updated.push('\n');
    }

    fs::write(&record_path, updated).map_err(|source| RecordError::Io {
        path: record_path.clone(),
        source,
    })?;
    debug!(
        "refreshed {refreshed} RECORD line(s) in {}",
        record_path.display()
    );
    Ok(Some(record_path))
}

/// Build the refreshed line for `path`, keeping its original path field.
fn record_line(root: &Path, path: &str, raw_field: &str) -> Result<String, RecordError> {
    let file = root.join(path);
    let contents = fs::read(&file).map_err(|source| RecordError::Io { path: file, source })?;
    Ok(format!(
        "{raw_field},{},{}",
        record_digest(&contents),
        contents.len()
    ))
}

/// Split the CSV path field off a RECORD line.
///
/// Returns the unquoted path and the raw field text as it appears in the
/// line.
fn path_field(line: &str) -> (String, &str) {
    let Some(rest) = line.strip_prefix('"') else {
        let raw = line.split_once(',').map_or(line, |(head, _)| head);
        return (raw.to_owned(), raw);
    };

    let mut path = String::new();
    let mut chars = rest.char_indices().peekable();
    while let Some((index, current)) = chars.next() {
        if current != '"' {
            path.push(current);
            continue;
        }
        if chars.next_if(|(_, next)| *next == '"').is_some() {
            path.push('"');
            continue;
        }
        // Opening quote plus everything up to and including the closing one.
        let raw = line.get(..index + 2).unwrap_or(line);
        return (path, raw);
    }
    (path, line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    const RECORD: &str = concat!(
        "demo/__init__.py,sha256=47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU,0\n",
        "demo/include/demo.h,sha256=stale,3\n",
        "\"demo/odd,name.h\",sha256=stale,3\n",
        "demo-1.0.dist-info/RECORD,,\n",
    );

    #[fixture]
    fn wheel_root() -> TempDir {
        let root = TempDir::new().expect("temp dir");
        let dist_info = root.path().join("demo-1.0.dist-info");
        fs::create_dir_all(&dist_info).expect("mkdir dist-info");
        fs::create_dir_all(root.path().join("demo/include")).expect("mkdir include");
        fs::write(dist_info.join("RECORD"), RECORD).expect("write RECORD");
        fs::write(root.path().join("demo/__init__.py"), b"").expect("write init");
        fs::write(root.path().join("demo/include/demo.h"), b"new header").expect("write h");
        fs::write(root.path().join("demo/odd,name.h"), b"odd").expect("write odd");
        root
    }

    #[rstest]
    fn refresh_updates_only_replaced_lines(wheel_root: TempDir) {
        let record = refresh_record(wheel_root.path(), &["demo/include/demo.h"])
            .expect("refresh")
            .expect("RECORD present");

        let text = fs::read_to_string(record).expect("read RECORD");
        let lines: Vec<&str> = text.lines().collect();
        let header_line = format!("demo/include/demo.h,{},10", record_digest(b"new header"));
        assert_eq!(
            lines,
            vec![
                "demo/__init__.py,sha256=47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU,0",
                header_line.as_str(),
                "\"demo/odd,name.h\",sha256=stale,3",
                "demo-1.0.dist-info/RECORD,,",
            ]
        );
    }

    #[rstest]
    fn refresh_handles_quoted_paths(wheel_root: TempDir) {
        refresh_record(wheel_root.path(), &["demo/odd,name.h"]).expect("refresh");

        let text = fs::read_to_string(wheel_root.path().join("demo-1.0.dist-info/RECORD"))
            .expect("read RECORD");
        assert!(text.contains(&format!("\"demo/odd,name.h\",{},3", record_digest(b"odd"))));
    }

    #[test]
    fn missing_dist_info_is_not_an_error() {
        let root = TempDir::new().expect("temp dir");
        let result = refresh_record(root.path(), &["demo/include/demo.h"]).expect("refresh");
        assert!(result.is_none());
    }

    #[test]
    fn several_dist_info_directories_are_ambiguous() {
        let root = TempDir::new().expect("temp dir");
        fs::create_dir_all(root.path().join("a-1.0.dist-info")).expect("mkdir a");
        fs::create_dir_all(root.path().join("b-1.0.dist-info")).expect("mkdir b");

        let result = find_record(root.path());
        assert!(matches!(result, Err(RecordError::AmbiguousDistInfo { .. })));
    }

    #[rstest]
    #[case::plain("a/b.py,sha256=x,1", "a/b.py", "a/b.py")]
    #[case::quoted("\"a,b.py\",sha256=x,1", "a,b.py", "\"a,b.py\"")]
    #[case::escaped_quote("\"a\"\"b.py\",,", "a\"b.py", "\"a\"\"b.py\"")]
    fn path_field_parses_csv(#[case] line: &str, #[case] path: &str, #[case] raw: &str) {
        assert_eq!(path_field(line), (path.to_owned(), raw));
    }
}
