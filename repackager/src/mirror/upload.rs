//! Upload through the `anaconda` command-line client.
//!
//! The client is run as an argument vector; the token is passed with `-t`
//! and never logged.

use super::error::MirrorError;
use crate::artefact::WHEEL_EXTENSION;
use crate::command::{CommandExecutor, command_succeeds, stderr_text};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the upload client.
pub const ANACONDA: &str = "anaconda";

/// Fail unless `anaconda --version` runs successfully.
///
/// # Errors
///
/// Returns [`MirrorError::ClientUnavailable`] when the client is missing.
pub fn check_client(executor: &dyn CommandExecutor) -> Result<(), MirrorError> {
    if command_succeeds(executor, ANACONDA, &["--version"]) {
        Ok(())
    } else {
        Err(MirrorError::ClientUnavailable)
    }
}

/// The wheels in `dest`, sorted by path.
///
/// # Errors
///
/// Returns [`MirrorError::Io`] if `dest` cannot be listed.
pub fn wheels_in(dest: &Path) -> Result<Vec<PathBuf>, MirrorError> {
    let io_error = |source: std::io::Error| MirrorError::Io {
        path: dest.to_path_buf(),
        source,
    };
    let mut wheels = Vec::new();
    for entry in fs::read_dir(dest).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        let is_wheel = path
            .extension()
            .is_some_and(|extension| extension == WHEEL_EXTENSION);
        if is_wheel && path.is_file() {
            wheels.push(path);
        }
    }
    wheels.sort();
    Ok(wheels)
}

/// Upload every wheel in `dest` with `token`, returning how many were sent.
///
/// Summary and description are blanked to stay within the channel's size
/// limits.
///
/// # Errors
///
/// Returns [`MirrorError::NoWheels`] if `dest` holds no wheels,
/// [`MirrorError::Command`] if the client cannot be run, and
/// [`MirrorError::UploadFailed`] if it exits unsuccessfully.
pub fn upload_wheels(
    executor: &dyn CommandExecutor,
    dest: &Path,
    token: &str,
) -> Result<usize, MirrorError> {
    let wheels = wheels_in(dest)?;
    if wheels.is_empty() {
        return Err(MirrorError::NoWheels(dest.to_path_buf()));
    }

    let wheel_args: Vec<String> = wheels
        .iter()
        .map(|path| path.to_string_lossy().into_owned())
        .collect();
    let mut args = vec!["-t", token, "upload"];
    args.extend(wheel_args.iter().map(String::as_str));
    args.extend(["--summary= ", "--description= "]);

    let output = executor.run(ANACONDA, &args)?;
    if !output.status.success() {
        return Err(MirrorError::UploadFailed {
            stderr: stderr_text(&output),
        });
    }
    info!("uploaded {} wheel(s) from {}", wheels.len(), dest.display());
    Ok(wheels.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandError;
    use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, success_output};
    use std::io;

    fn dest_with(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in files {
            fs::write(dir.path().join(name), b"wheel").expect("write");
        }
        dir
    }

    #[test]
    fn check_client_accepts_working_client() {
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            ANACONDA,
            &["--version"],
            Ok(success_output()),
        )]);
        assert!(check_client(&executor).is_ok());
        executor.assert_finished();
    }

    #[test]
    fn check_client_rejects_missing_client() {
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            ANACONDA,
            &["--version"],
            Err(CommandError::Spawn {
                program: ANACONDA.to_owned(),
                source: io::Error::from(io::ErrorKind::NotFound),
            }),
        )]);
        assert!(matches!(
            check_client(&executor),
            Err(MirrorError::ClientUnavailable)
        ));
    }

    #[test]
    fn uploads_sorted_wheels_as_arguments() {
        let dest = dest_with(&["b-1.0-py3-none-any.whl", "a-1.0-py3-none-any.whl", "notes.txt"]);
        let a = dest.path().join("a-1.0-py3-none-any.whl");
        let b = dest.path().join("b-1.0-py3-none-any.whl");
        let (a, b) = (a.to_string_lossy(), b.to_string_lossy());
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            ANACONDA,
            &[
                "-t",
                "secret",
                "upload",
                a.as_ref(),
                b.as_ref(),
                "--summary= ",
                "--description= ",
            ],
            Ok(success_output()),
        )]);

        let count = upload_wheels(&executor, dest.path(), "secret").expect("upload");

        assert_eq!(count, 2);
        executor.assert_finished();
    }

    #[test]
    fn empty_destination_is_an_error() {
        let dest = dest_with(&["notes.txt"]);
        let executor = StubExecutor::new(Vec::new());

        let err = upload_wheels(&executor, dest.path(), "secret").expect_err("no wheels");

        assert!(matches!(err, MirrorError::NoWheels(_)));
    }

    #[test]
    fn failed_upload_reports_stderr() {
        let dest = dest_with(&["a-1.0-py3-none-any.whl"]);
        let wheel = dest.path().join("a-1.0-py3-none-any.whl");
        let a = wheel.to_string_lossy();
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            ANACONDA,
            &[
                "-t",
                "secret",
                "upload",
                a.as_ref(),
                "--summary= ",
                "--description= ",
            ],
            Ok(failure_output("401 Unauthorized")),
        )]);

        let err = upload_wheels(&executor, dest.path(), "secret").expect_err("upload fails");

        assert!(matches!(err, MirrorError::UploadFailed { ref stderr } if stderr == "401 Unauthorized"));
    }
}
