//! Native wheel retrieval.
//!
//! A [`NativeFetcher`] places the natively-built wheel for a package version
//! into a directory. [`fetch_native`] wraps any fetcher with a bounded retry
//! policy and confirms the result with the wheel locator, since a fetcher
//! reporting success is not proof that a matching wheel arrived.

use crate::artefact::locator::{LocateError, locate_wheel};
use crate::command::{CommandError, CommandExecutor, stderr_text};
use crate::package_name::PackageName;
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Default number of fetch attempts.
pub const DEFAULT_ATTEMPTS: u32 = 3;
/// Default delay before the first retry; doubled for each further retry.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);

/// Errors arising from native wheel retrieval.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The destination directory could not be created.
    #[error("failed to prepare {}: {source}", .path.display())]
    Io {
        /// The destination directory.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The download command could not be run or timed out.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The download command exited unsuccessfully.
    #[error("download of {name}=={version} failed: {stderr}")]
    Failed {
        /// The requested package.
        name: PackageName,
        /// The requested version.
        version: String,
        /// The command's trimmed stderr.
        stderr: String,
    },

    /// The fetcher reported success but no unique wheel is present.
    #[error("no usable wheel after fetch: {0}")]
    Missing(#[source] LocateError),

    /// Every attempt failed.
    #[error("gave up fetching {name}=={version} after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        /// The requested package.
        name: PackageName,
        /// The requested version.
        version: String,
        /// How many attempts were made.
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        last: Box<FetchError>,
    },
}

/// Places a natively-built wheel into a directory.
#[cfg_attr(test, mockall::automock)]
pub trait NativeFetcher {
    /// Fetch the wheel for `name` at `version` into `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the wheel cannot be retrieved.
    fn fetch(&self, name: &PackageName, version: &str, dest: &Path) -> Result<(), FetchError>;
}

/// Fetches binary wheels with `python -m pip download`.
pub struct PipFetcher<'a> {
    python: String,
    executor: &'a dyn CommandExecutor,
}

impl<'a> PipFetcher<'a> {
    /// Create a fetcher running `python` through `executor`.
    ///
    /// The executor's timeout bounds each download.
    #[must_use]
    pub fn new(python: impl Into<String>, executor: &'a dyn CommandExecutor) -> Self {
        Self {
            python: python.into(),
            executor,
        }
    }
}

impl NativeFetcher for PipFetcher<'_> {
    fn fetch(&self, name: &PackageName, version: &str, dest: &Path) -> Result<(), FetchError> {
        fs::create_dir_all(dest).map_err(|source| FetchError::Io {
            path: dest.to_path_buf(),
            source,
        })?;

        let requirement = format!("{name}=={version}");
        let dest_text = dest.to_string_lossy();
        let args = [
            "-m",
            "pip",
            "download",
            requirement.as_str(),
            "--no-deps",
            "--only-binary=:all:",
            "-d",
            dest_text.as_ref(),
        ];
        debug!("running {} {}", self.python, args.join(" "));

        let output = self.executor.run(&self.python, &args)?;
        if !output.status.success() {
            return Err(FetchError::Failed {
                name: name.clone(),
                version: version.to_owned(),
                stderr: stderr_text(&output),
            });
        }
        Ok(())
    }
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Total attempts, including the first; zero is treated as one.
    pub attempts: u32,
    /// Delay before the first retry.
    pub backoff: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl FetchPolicy {
    /// Delay after failed attempt `attempt` (1-based).
    #[must_use]
    pub const fn delay_after(&self, attempt: u32) -> Duration {
        let factor = match 1_u32.checked_shl(attempt.saturating_sub(1)) {
            Some(factor) => factor,
            None => u32::MAX,
        };
        self.backoff.saturating_mul(factor)
    }
}

/// Fetch the native wheel and return its location.
///
/// Each attempt runs `fetcher` and then looks for exactly one matching wheel
/// in `dest`.
///
/// # Errors
///
/// Returns [`FetchError::RetriesExhausted`] wrapping the last failure when no
/// attempt produced a unique wheel.
pub fn fetch_native(
    fetcher: &dyn NativeFetcher,
    name: &PackageName,
    version: &str,
    dest: &Path,
    policy: FetchPolicy,
) -> Result<PathBuf, FetchError> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        let result = fetcher
            .fetch(name, version, dest)
            .and_then(|()| locate_wheel(dest, name, version).map_err(FetchError::Missing));
        match result {
            Ok(wheel) => {
                info!("fetched {name} {version}: {}", wheel.display());
                return Ok(wheel);
            }
            Err(err) if attempt < attempts => {
                let delay = policy.delay_after(attempt);
                warn!(
                    "fetch attempt {attempt}/{attempts} for {name} {version} failed: {err}; retrying in {}s",
                    delay.as_secs()
                );
                thread::sleep(delay);
                attempt += 1;
            }
            Err(err) => {
                return Err(FetchError::RetriesExhausted {
                    name: name.clone(),
                    version: version.to_owned(),
                    attempts,
                    last: Box::new(err),
                });
            }
        }
    }
}
