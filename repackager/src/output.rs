//! Progress and summary text for stderr.

use crate::batch::{BatchReport, PackageOutcome};
use std::fmt::Display;
use std::io::Write;

/// Write `message` and a newline to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

/// One line describing a package outcome.
#[must_use]
pub fn outcome_line(outcome: &PackageOutcome) -> String {
    match outcome {
        PackageOutcome::Skipped { name, reason } => format!("skipped {name}: {reason}"),
        PackageOutcome::Repackaged {
            name,
            version,
            output,
        } => {
            let warnings = output.warnings.len();
            let suffix = match warnings {
                0 => String::new(),
                1 => " (1 warning)".to_owned(),
                count => format!(" ({count} warnings)"),
            };
            format!(
                "repackaged {name} {version} -> {}{suffix}",
                output.output_path.display()
            )
        }
        PackageOutcome::Failed {
            name,
            version,
            failure,
        } => format!("failed {name} {version}: {failure}"),
    }
}

/// Summary line for a finished batch.
///
/// # Examples
///
/// ```
/// use wheel_repackager::batch::BatchReport;
/// use wheel_repackager::output::summary_line;
///
/// let report = BatchReport::default();
/// assert_eq!(summary_line(&report), "0 repackaged, 0 skipped, 0 failed, 0 warnings");
/// ```
#[must_use]
pub fn summary_line(report: &BatchReport) -> String {
    format!(
        "{} repackaged, {} skipped, {} failed, {} warnings",
        report.repackaged(),
        report.skipped(),
        report.failed(),
        report.warnings()
    )
}

/// Write every outcome followed by the summary.
pub fn write_report(stderr: &mut dyn Write, report: &BatchReport) {
    for outcome in &report.outcomes {
        write_stderr_line(stderr, outcome_line(outcome));
    }
    write_stderr_line(stderr, summary_line(report));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{PackageFailure, SkipReason};
    use crate::error::RepackageError;
    use crate::package_name::PackageName;
    use crate::repackage::{RepackageOutput, RepackageWarning, WarningKind};
    use std::path::PathBuf;

    fn report() -> BatchReport {
        BatchReport {
            outcomes: vec![
                PackageOutcome::Skipped {
                    name: PackageName::from("six"),
                    reason: SkipReason::NoCrossBuildFiles,
                },
                PackageOutcome::Repackaged {
                    name: PackageName::from("numpy"),
                    version: "2.0.2".to_owned(),
                    output: RepackageOutput {
                        output_path: PathBuf::from("out/numpy.whl"),
                        warnings: vec![RepackageWarning {
                            kind: WarningKind::MissingSourceFile,
                            path: "numpy/a.h".to_owned(),
                        }],
                    },
                },
                PackageOutcome::Failed {
                    name: PackageName::from("scipy"),
                    version: "1.14.1".to_owned(),
                    failure: PackageFailure::Repackage(RepackageError::InvalidCrossBuildFile {
                        path: "/abs".to_owned(),
                    }),
                },
            ],
        }
    }

    #[test]
    fn write_report_lists_outcomes_then_summary() {
        let mut stderr = Vec::new();
        write_report(&mut stderr, &report());

        let text = String::from_utf8(stderr).expect("stderr is UTF-8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "skipped six: no cross-build files declared",
                "repackaged numpy 2.0.2 -> out/numpy.whl (1 warning)",
                "failed scipy 1.14.1: invalid cross-build file /abs: must be a relative path inside the wheel",
                "1 repackaged, 1 skipped, 1 failed, 1 warnings",
            ]
        );
    }
}
