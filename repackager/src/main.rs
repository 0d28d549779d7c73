//! `wheel-repackage` entrypoint.
//!
//! Loads the configuration and recipes, repackages every eligible package,
//! prints one line per package plus a summary to stderr, and exits non-zero
//! when any package failed.

use camino::Utf8Path;
use clap::Parser;
use std::io::Write;
use thiserror::Error;
use wheel_repackager::batch::{BatchContext, BatchReport, run_batch};
use wheel_repackager::cli::Cli;
use wheel_repackager::command::SystemCommandExecutor;
use wheel_repackager::config::{ConfigError, RepackageConfig};
use wheel_repackager::fetch::{NativeFetcher, PipFetcher};
use wheel_repackager::logging::init_logging;
use wheel_repackager::output::{write_report, write_stderr_line};
use wheel_repackager::recipe::{RecipeError, RecipeSource, YamlRecipeSource};

/// Errors that end a run with a non-zero exit code.
#[derive(Debug, Error)]
enum RunError {
    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The recipes could not be loaded.
    #[error(transparent)]
    Recipe(#[from] RecipeError),

    /// At least one package failed.
    #[error("{failed} package(s) failed")]
    PackagesFailed {
        /// Number of failed packages.
        failed: usize,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbosity, cli.quiet);
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<(), RunError> {
    let config = RepackageConfig::load(cli.config.as_deref())?.with_overrides(cli.overrides());
    let source = YamlRecipeSource::new(config.recipe_dir.as_std_path());
    let executor = config.fetch.timeout().map_or_else(
        SystemCommandExecutor::default,
        SystemCommandExecutor::with_timeout,
    );
    let fetcher = PipFetcher::new(config.fetch.python.as_str(), &executor);

    let report = repackage_all(&config, &source, &fetcher)?;
    if !cli.quiet {
        write_report(stderr, &report);
    }
    if report.has_failures() {
        return Err(RunError::PackagesFailed {
            failed: report.failed(),
        });
    }
    Ok(())
}

fn repackage_all(
    config: &RepackageConfig,
    source: &dyn RecipeSource,
    fetcher: &dyn NativeFetcher,
) -> Result<BatchReport, RunError> {
    let recipes = source.load_all()?;
    let context = BatchContext {
        wheel_dir: config.wheel_dir.as_std_path(),
        output_dir: config.output_dir.as_std_path(),
        native_dir: config.native_dir.as_deref().map(Utf8Path::as_std_path),
        scratch_root: None,
        fetch_policy: config.fetch.policy(),
        update_record: config.update_record,
    };
    Ok(run_batch(&recipes, fetcher, &context))
}

fn exit_code_for_run_result(result: Result<(), RunError>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::collections::BTreeMap;
    use std::path::Path;
    use wheel_repackager::fetch::FetchError;
    use wheel_repackager::package_name::PackageName;
    use wheel_repackager::recipe::{PackageRecipe, PackageType};

    struct FixedRecipes(Vec<PackageRecipe>);

    impl RecipeSource for FixedRecipes {
        fn load_all(&self) -> Result<BTreeMap<String, PackageRecipe>, RecipeError> {
            Ok(self
                .0
                .iter()
                .map(|recipe| (recipe.name.as_str().to_owned(), recipe.clone()))
                .collect())
        }
    }

    struct FailingFetcher;

    impl NativeFetcher for FailingFetcher {
        fn fetch(&self, name: &PackageName, version: &str, _dest: &Path) -> Result<(), FetchError> {
            Err(FetchError::Failed {
                name: name.clone(),
                version: version.to_owned(),
                stderr: "offline".to_owned(),
            })
        }
    }

    fn config_in(root: &Path) -> RepackageConfig {
        let utf8_root = Utf8PathBuf::from_path_buf(root.to_path_buf())
            .unwrap_or_else(|path| panic!("non-UTF-8 temp path {}", path.display()));
        let mut config = RepackageConfig {
            wheel_dir: utf8_root.join("dist"),
            output_dir: utf8_root.join("out"),
            ..RepackageConfig::default()
        };
        config.fetch.attempts = 1;
        config.fetch.backoff_secs = 0;
        config
    }

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let mut stderr = Vec::new();
        let exit_code =
            exit_code_for_run_result(Err(RunError::PackagesFailed { failed: 2 }), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert_eq!(stderr_text, "error: 2 package(s) failed\n");
    }

    #[test]
    fn skipped_recipes_do_not_fail_the_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = FixedRecipes(vec![PackageRecipe {
            name: PackageName::from("six"),
            version: "1.16.0".to_owned(),
            package_type: PackageType::Package,
            cross_build_files: Vec::new(),
        }]);

        let report =
            repackage_all(&config_in(dir.path()), &source, &FailingFetcher).expect("batch runs");

        assert!(!report.has_failures());
        assert_eq!(report.skipped(), 1);
    }

    #[test]
    fn fetch_failures_are_reported_per_package() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = FixedRecipes(vec![PackageRecipe {
            name: PackageName::from("numpy"),
            version: "2.0.2".to_owned(),
            package_type: PackageType::Package,
            cross_build_files: vec!["numpy/a.h".to_owned()],
        }]);

        let report =
            repackage_all(&config_in(dir.path()), &source, &FailingFetcher).expect("batch runs");

        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let cli = Cli::parse_from(["wheel-repackage", "--config", "/nonexistent/repackage.toml"]);
        let mut stderr = Vec::new();

        let result = run(&cli, &mut stderr);

        assert!(matches!(result, Err(RunError::Config(_))));
    }
}
