//! Shared test utilities for the repackager crate.

use crate::command::{CommandError, CommandExecutor};
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::process::{ExitStatus, Output};
use zip::write::SimpleFileOptions;

/// Write a wheel at `path` holding `entries` as `(name, contents)` pairs,
/// in the given order.
///
/// # Panics
///
/// Panics if the archive cannot be written.
pub fn write_wheel(path: &Path, entries: &[(&str, &str)]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create wheel directory");
    }
    let file = fs::File::create(path).expect("create wheel");
    let mut writer = zip::ZipWriter::new(file);
    for (name, contents) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("start wheel entry");
        writer
            .write_all(contents.as_bytes())
            .expect("write wheel entry");
    }
    writer.finish().expect("finish wheel");
}

/// Read every file entry of the wheel at `path` into a name-to-bytes map.
///
/// # Panics
///
/// Panics if the archive cannot be read.
pub fn read_wheel_entries(path: &Path) -> BTreeMap<String, Vec<u8>> {
    let file = fs::File::open(path).expect("open wheel");
    let mut archive = zip::ZipArchive::new(file).expect("read wheel");
    let mut entries = BTreeMap::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).expect("wheel entry");
        if entry.is_dir() {
            continue;
        }
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents).expect("read wheel entry");
        entries.insert(entry.name().to_owned(), contents);
    }
    entries
}

/// Return the entry names of the wheel at `path` in archive order.
///
/// # Panics
///
/// Panics if the archive cannot be read.
pub fn wheel_entry_names(path: &Path) -> Vec<String> {
    let file = fs::File::open(path).expect("open wheel");
    let mut archive = zip::ZipArchive::new(file).expect("read wheel");
    (0..archive.len())
        .map(|index| {
            archive
                .by_index_raw(index)
                .expect("wheel entry")
                .name()
                .to_owned()
        })
        .collect()
}

/// Return the text of a single wheel entry.
///
/// # Panics
///
/// Panics if the archive cannot be read, the entry is missing, or the
/// contents are not UTF-8.
pub fn wheel_entry_text(path: &Path, name: &str) -> String {
    let entries = read_wheel_entries(path);
    let bytes = entries
        .get(name)
        .unwrap_or_else(|| panic!("wheel entry {name} missing"));
    String::from_utf8(bytes.clone()).expect("entry is UTF-8")
}

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code.unsigned_abs())
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The program to execute (e.g., "python3").
    pub program: String,
    /// The arguments to pass to the program.
    pub args: Vec<String>,
    /// The result to return when this command is invoked.
    pub result: Result<Output, CommandError>,
}

impl ExpectedCall {
    /// Build an expected call from string slices.
    #[must_use]
    pub fn new(program: &str, args: &[&str], result: Result<Output, CommandError>) -> Self {
        Self {
            program: program.to_owned(),
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
            result,
        }
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results,
/// allowing tests to verify command execution without side effects.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<Output, CommandError> {
        let Some(call) = self.expected.borrow_mut().pop_front() else {
            return Err(CommandError::StubMismatch {
                message: format!("unexpected invocation of {program} {args:?}"),
            });
        };

        if call.program != program || call.args != args {
            return Err(CommandError::StubMismatch {
                message: format!(
                    "expected {} {:?}, got {program} {args:?}",
                    call.program, call.args
                ),
            });
        }

        call.result
    }
}
