//! External command execution.
//!
//! Every subprocess this crate starts (`pip download`, `anaconda upload`)
//! goes through [`CommandExecutor`] as a program plus an argument vector.
//! Nothing is ever handed to a shell, so package names, versions and tokens
//! cannot be reinterpreted as shell syntax.

use log::debug;
use std::io::{self, Read};
use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use wait_timeout::ChildExt;

/// Errors arising from running an external command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The program could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// The program that was invoked.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Waiting for the program or collecting its output failed.
    #[error("failed while running {program}: {source}")]
    Io {
        /// The program that was invoked.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The program did not finish within the configured timeout and was
    /// killed.
    #[error("{program} timed out after {seconds} seconds")]
    TimedOut {
        /// The program that was invoked.
        program: String,
        /// The timeout that elapsed.
        seconds: u64,
    },

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs `program` with `args` and returns the captured output.
    ///
    /// A non-zero exit status is not an error at this level; callers
    /// inspect [`Output::status`].
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] if the program cannot be started, its output
    /// cannot be collected, or it exceeds the executor's timeout.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use wheel_repackager::command::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor::default();
    /// let output = executor.run("python3", &["--version"])?;
    /// assert!(output.status.success());
    /// # Ok::<(), wheel_repackager::command::CommandError>(())
    /// ```
    fn run(&self, program: &str, args: &[&str]) -> Result<Output, CommandError>;
}

/// Executes commands on the host system.
///
/// Output pipes are drained on helper threads while the child runs, so a
/// chatty program cannot stall on a full pipe and trip the timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor {
    timeout: Option<Duration>,
}

impl SystemCommandExecutor {
    /// Create an executor that kills commands running longer than `timeout`.
    #[must_use]
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    /// Return the configured timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<Output, CommandError> {
        debug!("running {program} with {} argument(s)", args.len());
        let io_error = |source: io::Error| CommandError::Io {
            program: program.to_owned(),
            source,
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CommandError::Spawn {
                program: program.to_owned(),
                source,
            })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.timeout {
            None => child.wait().map_err(io_error)?,
            Some(limit) => match child.wait_timeout(limit).map_err(io_error)? {
                Some(status) => status,
                None => {
                    if let Err(err) = child.kill().and_then(|()| child.wait().map(drop)) {
                        debug!("failed to reap {program} after timeout: {err}");
                    }
                    return Err(CommandError::TimedOut {
                        program: program.to_owned(),
                        seconds: limit.as_secs(),
                    });
                }
            },
        };

        Ok(Output {
            status,
            stdout: collect(stdout).map_err(io_error)?,
            stderr: collect(stderr).map_err(io_error)?,
        })
    }
}

type PipeReader = JoinHandle<io::Result<Vec<u8>>>;

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<PipeReader> {
    pipe.map(|mut reader| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            reader.read_to_end(&mut buffer)?;
            Ok(buffer)
        })
    })
}

fn collect(handle: Option<PipeReader>) -> io::Result<Vec<u8>> {
    handle.map_or_else(
        || Ok(Vec::new()),
        |reader| {
            reader
                .join()
                .map_err(|_| io::Error::other("output reader thread panicked"))?
        },
    )
}

/// Returns true if the given command executes successfully.
#[must_use]
pub fn command_succeeds(executor: &dyn CommandExecutor, program: &str, args: &[&str]) -> bool {
    executor
        .run(program, args)
        .is_ok_and(|output| output.status.success())
}

/// Render a command's stderr for error messages.
#[must_use]
pub fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_owned()
}
