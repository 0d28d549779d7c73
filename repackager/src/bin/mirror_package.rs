//! `wheel-mirror` entrypoint.
//!
//! Mirrors the wheels of one release from a package index to an Anaconda
//! channel: `wheel-mirror numpy 2.0.2`.

use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use wheel_repackager::command::SystemCommandExecutor;
use wheel_repackager::logging::init_logging;
use wheel_repackager::mirror::download::DEFAULT_DELAY;
use wheel_repackager::mirror::error::MirrorError;
use wheel_repackager::mirror::index::{DEFAULT_INDEX_URL, DEFAULT_TIMEOUT, HttpIndexClient};
use wheel_repackager::mirror::{MirrorReport, MirrorRequest, default_dest, mirror_release};
use wheel_repackager::output::write_stderr_line;

/// Mirror a release's wheels from a package index to Anaconda.
#[derive(Parser, Debug)]
#[command(name = "wheel-mirror")]
#[command(version, about)]
struct MirrorCli {
    /// Project name on the index.
    package: String,

    /// Version to mirror.
    #[arg(id = "release", value_name = "VERSION")]
    version: String,

    /// Download directory [default: <package>-<version>].
    #[arg(long, value_name = "DIR")]
    dest: Option<PathBuf>,

    /// Index base URL.
    #[arg(long, value_name = "URL", default_value = DEFAULT_INDEX_URL)]
    index_url: String,

    /// Seconds to wait between downloads.
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_DELAY.as_secs())]
    delay_secs: u64,

    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,

    /// Download only; do not upload.
    #[arg(long)]
    skip_upload: bool,

    /// Anaconda API token.
    #[arg(long, env = "ANACONDA_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    verbosity: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbosity")]
    quiet: bool,
}

fn main() {
    let cli = MirrorCli::parse();
    init_logging(cli.verbosity, cli.quiet);
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &MirrorCli, stderr: &mut dyn Write) -> Result<(), MirrorError> {
    let dest = cli
        .dest
        .clone()
        .unwrap_or_else(|| default_dest(&cli.package, &cli.version));
    let client = HttpIndexClient::new(Duration::from_secs(cli.timeout_secs));
    let executor = SystemCommandExecutor::default();
    let request = MirrorRequest {
        package: &cli.package,
        version: &cli.version,
        index_url: &cli.index_url,
        dest: &dest,
        delay: Duration::from_secs(cli.delay_secs),
        token: cli.token.as_deref().filter(|token| !token.trim().is_empty()),
        skip_upload: cli.skip_upload,
    };

    let report = mirror_release(&client, &executor, &request)?;
    if !cli.quiet {
        write_report(stderr, cli, &dest, &report);
    }
    Ok(())
}

fn write_report(stderr: &mut dyn Write, cli: &MirrorCli, dest: &Path, report: &MirrorReport) {
    if report.selected == 0 {
        write_stderr_line(
            stderr,
            format!("No wheels found for {}=={}", cli.package, cli.version),
        );
        return;
    }
    write_stderr_line(
        stderr,
        format!(
            "Downloaded {} of {} wheel(s) to {}",
            report.downloads.downloaded.len(),
            report.selected,
            dest.display()
        ),
    );
    for url in &report.downloads.failed {
        write_stderr_line(stderr, format!("  failed: {url}"));
    }
    if let Some(count) = report.uploaded {
        write_stderr_line(stderr, format!("Uploaded {count} wheel(s) to Anaconda"));
    }
}

fn exit_code_for_run_result(result: Result<(), MirrorError>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}
