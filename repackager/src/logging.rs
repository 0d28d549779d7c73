//! Log subscriber installation for the binaries.
//!
//! Library code logs through the `log` facade; the binaries install a
//! `tracing-subscriber` formatter, which also receives `log` records, and
//! pick the level from the `-v`/`-q` flags unless `RUST_LOG` is set.

use tracing_subscriber::EnvFilter;

/// Default filter directive for the given flags.
///
/// # Examples
///
/// ```
/// use wheel_repackager::logging::default_directive;
///
/// assert_eq!(default_directive(0, false), "info");
/// assert_eq!(default_directive(3, false), "trace");
/// assert_eq!(default_directive(0, true), "error");
/// ```
#[must_use]
pub const fn default_directive(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Build the filter: `RUST_LOG` when set and valid, otherwise the flags.
#[must_use]
pub fn log_filter(verbosity: u8, quiet: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity, quiet)))
}

/// Install the stderr log subscriber.
///
/// Installing twice is harmless; the second call leaves the first
/// subscriber in place.
pub fn init_logging(verbosity: u8, quiet: bool) {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbosity, quiet))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
    if let Err(err) = installed {
        log::debug!("keeping existing log subscriber: {err}");
    }
}
