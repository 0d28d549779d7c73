//! Tests for CLI parsing and override extraction.

use super::*;
use clap::CommandFactory;
use rstest::rstest;

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn cli_parses_defaults() {
    let cli = Cli::parse_from(["wheel-repackage"]);
    assert!(cli.config.is_none());
    assert!(cli.recipe_dir.is_none());
    assert!(cli.wheel_dir.is_none());
    assert!(cli.output_dir.is_none());
    assert!(cli.native_dir.is_none());
    assert!(!cli.update_record);
    assert_eq!(cli.verbosity, 0);
    assert!(!cli.quiet);
    assert_eq!(cli.overrides(), ConfigOverrides::default());
}

#[test]
fn cli_parses_short_directory_flags() {
    let cli = Cli::parse_from([
        "wheel-repackage",
        "-r",
        "recipes",
        "-w",
        "cross",
        "-o",
        "out",
    ]);
    assert_eq!(cli.recipe_dir, Some(Utf8PathBuf::from("recipes")));
    assert_eq!(cli.wheel_dir, Some(Utf8PathBuf::from("cross")));
    assert_eq!(cli.output_dir, Some(Utf8PathBuf::from("out")));
}

#[test]
fn cli_parses_fetch_settings() {
    let cli = Cli::parse_from([
        "wheel-repackage",
        "--python",
        "/opt/python/bin/python3.12",
        "--fetch-timeout-secs",
        "60",
        "--fetch-attempts",
        "5",
    ]);
    let overrides = cli.overrides();
    assert_eq!(
        overrides.python.as_deref(),
        Some("/opt/python/bin/python3.12")
    );
    assert_eq!(overrides.fetch_timeout_secs, Some(60));
    assert_eq!(overrides.fetch_attempts, Some(5));
}

#[rstest]
#[case::short(&["wheel-repackage", "-vv"], 2)]
#[case::long(&["wheel-repackage", "--verbose"], 1)]
fn cli_counts_verbosity(#[case] args: &[&str], #[case] expected: u8) {
    let cli = Cli::parse_from(args);
    assert_eq!(cli.verbosity, expected);
}

#[test]
fn cli_rejects_quiet_with_verbose() {
    let result = Cli::try_parse_from(["wheel-repackage", "-q", "-v"]);
    assert!(result.is_err());
}

#[test]
fn cli_rejects_positional_arguments() {
    let result = Cli::try_parse_from(["wheel-repackage", "numpy"]);
    assert!(result.is_err());
}
