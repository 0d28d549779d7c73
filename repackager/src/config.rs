//! Configuration for the `wheel-repackage` binary.
//!
//! Settings come from an optional TOML file; every key is optional and
//! unknown keys are rejected so typos surface immediately. Command-line
//! flags are applied on top through [`ConfigOverrides`].
//!
//! ```toml
//! recipe_dir = "packages"
//! wheel_dir = "dist"
//! output_dir = "out"
//! update_record = false
//!
//! [fetch]
//! python = "python3"
//! timeout_secs = 300
//! attempts = 3
//! backoff_secs = 2
//! ```

use crate::fetch::{DEFAULT_ATTEMPTS, DEFAULT_BACKOFF, FetchPolicy};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::fs;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors arising from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    Io {
        /// The configuration file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML or has unknown keys.
    #[error("invalid configuration {path}: {source}")]
    Parse {
        /// The configuration file.
        path: Utf8PathBuf,
        /// The underlying parse error.
        #[source]
        source: toml::de::Error,
    },
}

/// Settings for a repackaging run.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepackageConfig {
    /// Directory of package recipes.
    pub recipe_dir: Utf8PathBuf,
    /// Directory holding the cross-compiled wheels.
    pub wheel_dir: Utf8PathBuf,
    /// Directory receiving the repackaged wheels.
    pub output_dir: Utf8PathBuf,
    /// Directory for downloaded native wheels.
    ///
    /// When unset each package downloads into its own temporary directory,
    /// removed once the package is done.
    pub native_dir: Option<Utf8PathBuf>,
    /// Rewrite `RECORD` entries for replaced files.
    pub update_record: bool,
    /// Native wheel download settings.
    pub fetch: FetchConfig,
}

impl Default for RepackageConfig {
    fn default() -> Self {
        Self {
            recipe_dir: Utf8PathBuf::from("packages"),
            wheel_dir: Utf8PathBuf::from("dist"),
            output_dir: Utf8PathBuf::from("out"),
            native_dir: None,
            update_record: false,
            fetch: FetchConfig::default(),
        }
    }
}

/// Native wheel download settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Python interpreter used to run `pip download`.
    pub python: String,
    /// Per-attempt timeout in seconds; zero disables the timeout.
    pub timeout_secs: u64,
    /// Total download attempts per package.
    pub attempts: u32,
    /// Delay before the first retry in seconds, doubled for each further retry.
    pub backoff_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_owned(),
            timeout_secs: 300,
            attempts: DEFAULT_ATTEMPTS,
            backoff_secs: DEFAULT_BACKOFF.as_secs(),
        }
    }
}

impl FetchConfig {
    /// Per-attempt timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }

    /// Retry policy for [`fetch_native`](crate::fetch::fetch_native).
    #[must_use]
    pub const fn policy(&self) -> FetchPolicy {
        FetchPolicy {
            attempts: self.attempts,
            backoff: Duration::from_secs(self.backoff_secs),
        }
    }
}

/// Values supplied on the command line, each replacing the file value when
/// present.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConfigOverrides {
    /// Replaces [`RepackageConfig::recipe_dir`].
    pub recipe_dir: Option<Utf8PathBuf>,
    /// Replaces [`RepackageConfig::wheel_dir`].
    pub wheel_dir: Option<Utf8PathBuf>,
    /// Replaces [`RepackageConfig::output_dir`].
    pub output_dir: Option<Utf8PathBuf>,
    /// Replaces [`RepackageConfig::native_dir`].
    pub native_dir: Option<Utf8PathBuf>,
    /// Enables [`RepackageConfig::update_record`] when true.
    pub update_record: bool,
    /// Replaces [`FetchConfig::python`].
    pub python: Option<String>,
    /// Replaces [`FetchConfig::timeout_secs`].
    pub fetch_timeout_secs: Option<u64>,
    /// Replaces [`FetchConfig::attempts`].
    pub fetch_attempts: Option<u32>,
}

impl RepackageConfig {
    /// Load configuration from `config_path`, or the defaults when it is
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(config_path: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        let Some(path) = config_path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Apply command-line overrides.
    #[must_use]
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(dir) = overrides.recipe_dir {
            self.recipe_dir = dir;
        }
        if let Some(dir) = overrides.wheel_dir {
            self.wheel_dir = dir;
        }
        if let Some(dir) = overrides.output_dir {
            self.output_dir = dir;
        }
        if overrides.native_dir.is_some() {
            self.native_dir = overrides.native_dir;
        }
        self.update_record |= overrides.update_record;
        if let Some(python) = overrides.python {
            self.fetch.python = python;
        }
        if let Some(seconds) = overrides.fetch_timeout_secs {
            self.fetch.timeout_secs = seconds;
        }
        if let Some(attempts) = overrides.fetch_attempts {
            self.fetch.attempts = attempts;
        }
        self
    }
}
