//! CLI argument definitions for `wheel-repackage`.
//!
//! Every setting has a configuration-file equivalent; flags given here win
//! over the file (see [`crate::config`]).

use crate::config::ConfigOverrides;
use camino::Utf8PathBuf;
use clap::Parser;

/// Repackage native wheels with cross-compiled build files.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "wheel-repackage")]
#[command(version, about)]
#[command(long_about = concat!(
    "Repackage native wheels with cross-compiled build files.\n\n",
    "For every recipe that declares cross-build files, the native wheel is ",
    "downloaded with pip, the declared headers and static libraries are replaced ",
    "with their counterparts from the cross-compiled wheel, and the result is ",
    "written to the output directory under the native wheel's filename.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Repackage every recipe below ./packages using wheels from ./dist:\n",
    "    $ wheel-repackage -r packages -w dist -o out\n\n",
    "  Keep native downloads and refresh RECORD digests:\n",
    "    $ wheel-repackage --native-dir native --update-record\n",
))]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Directory of package recipes [default: packages].
    #[arg(short, long, value_name = "DIR")]
    pub recipe_dir: Option<Utf8PathBuf>,

    /// Directory holding the cross-compiled wheels [default: dist].
    #[arg(short, long, value_name = "DIR")]
    pub wheel_dir: Option<Utf8PathBuf>,

    /// Directory receiving the repackaged wheels [default: out].
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<Utf8PathBuf>,

    /// Keep native wheel downloads in this directory.
    #[arg(long, value_name = "DIR")]
    pub native_dir: Option<Utf8PathBuf>,

    /// Rewrite RECORD digests of replaced files.
    #[arg(long)]
    pub update_record: bool,

    /// Python interpreter used for `pip download` [default: python3].
    #[arg(long, value_name = "PATH")]
    pub python: Option<String>,

    /// Per-attempt download timeout in seconds; 0 disables it [default: 300].
    #[arg(long, value_name = "SECONDS")]
    pub fetch_timeout_secs: Option<u64>,

    /// Download attempts per package [default: 3].
    #[arg(long, value_name = "N")]
    pub fetch_attempts: Option<u32>,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Configuration overrides carried by the flags.
    ///
    /// # Examples
    ///
    /// ```
    /// use clap::Parser;
    /// use wheel_repackager::cli::Cli;
    ///
    /// let cli = Cli::parse_from(["wheel-repackage", "-o", "wheels"]);
    /// let overrides = cli.overrides();
    /// assert_eq!(overrides.output_dir.as_deref().map(|dir| dir.as_str()), Some("wheels"));
    /// assert!(overrides.recipe_dir.is_none());
    /// ```
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            recipe_dir: self.recipe_dir.clone(),
            wheel_dir: self.wheel_dir.clone(),
            output_dir: self.output_dir.clone(),
            native_dir: self.native_dir.clone(),
            update_record: self.update_record,
            python: self.python.clone(),
            fetch_timeout_secs: self.fetch_timeout_secs,
            fetch_attempts: self.fetch_attempts,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
