//! Per-recipe orchestration.
//!
//! [`run_batch`] walks the recipes in key order. Recipes that are not plain
//! packages, or that declare no cross-build files, are skipped. For the rest
//! the native wheel is fetched and the package is repackaged. A failure is
//! recorded against its package and the batch moves on.

use crate::error::RepackageError;
use crate::fetch::{FetchError, FetchPolicy, NativeFetcher, fetch_native};
use crate::package_name::PackageName;
use crate::recipe::{PackageRecipe, PackageType};
use crate::repackage::{RepackageOutput, RepackageRequest, repackage};
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;

const NATIVE_PREFIX: &str = ".wheel-repackage-native-";

/// Shared settings for a batch run.
#[derive(Debug, Clone)]
pub struct BatchContext<'a> {
    /// Directory holding the cross-compiled wheels.
    pub wheel_dir: &'a Path,
    /// Directory receiving the repackaged wheels.
    pub output_dir: &'a Path,
    /// Directory for native downloads; a per-package temporary directory
    /// when `None`.
    pub native_dir: Option<&'a Path>,
    /// Parent for scratch and temporary native directories; the system
    /// temporary directory when `None`.
    pub scratch_root: Option<&'a Path>,
    /// Retry policy for native downloads.
    pub fetch_policy: FetchPolicy,
    /// Rewrite `RECORD` entries for replaced files.
    pub update_record: bool,
}

/// Why a recipe was not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The recipe does not build a regular package.
    NotAPackage(PackageType),
    /// The recipe declares no cross-build files.
    NoCrossBuildFiles,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAPackage(package_type) => write!(f, "package type is {package_type}"),
            Self::NoCrossBuildFiles => f.write_str("no cross-build files declared"),
        }
    }
}

/// Why a package failed.
#[derive(Debug, Error)]
pub enum PackageFailure {
    /// The temporary native download directory could not be created.
    #[error("failed to create native download directory: {0}")]
    NativeDir(#[source] io::Error),

    /// The native wheel could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The repackaging transform failed.
    #[error(transparent)]
    Repackage(#[from] RepackageError),
}

/// What happened to one recipe.
#[derive(Debug)]
pub enum PackageOutcome {
    /// The recipe was not processed.
    Skipped {
        /// Package name.
        name: PackageName,
        /// Why it was skipped.
        reason: SkipReason,
    },
    /// A repackaged wheel was written.
    Repackaged {
        /// Package name.
        name: PackageName,
        /// Package version.
        version: String,
        /// The written wheel and any warnings.
        output: RepackageOutput,
    },
    /// The package failed.
    Failed {
        /// Package name.
        name: PackageName,
        /// Package version.
        version: String,
        /// The failure.
        failure: PackageFailure,
    },
}

impl PackageOutcome {
    /// The package this outcome refers to.
    #[must_use]
    pub const fn name(&self) -> &PackageName {
        match self {
            Self::Skipped { name, .. } | Self::Repackaged { name, .. } | Self::Failed { name, .. } => {
                name
            }
        }
    }
}

/// Outcomes of a batch run, in recipe key order.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One outcome per recipe.
    pub outcomes: Vec<PackageOutcome>,
}

impl BatchReport {
    /// Whether any package failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Number of repackaged wheels.
    #[must_use]
    pub fn repackaged(&self) -> usize {
        self.count(|outcome| matches!(outcome, PackageOutcome::Repackaged { .. }))
    }

    /// Number of skipped recipes.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, PackageOutcome::Skipped { .. }))
    }

    /// Number of failed packages.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, PackageOutcome::Failed { .. }))
    }

    /// Total warnings across repackaged wheels.
    #[must_use]
    pub fn warnings(&self) -> usize {
        self.outcomes
            .iter()
            .map(|outcome| match outcome {
                PackageOutcome::Repackaged { output, .. } => output.warnings.len(),
                _ => 0,
            })
            .sum()
    }

    fn count(&self, predicate: impl Fn(&PackageOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|outcome| predicate(outcome)).count()
    }
}

/// Process every recipe and collect the outcomes.
#[must_use]
pub fn run_batch(
    recipes: &BTreeMap<String, PackageRecipe>,
    fetcher: &dyn NativeFetcher,
    context: &BatchContext<'_>,
) -> BatchReport {
    let outcomes = recipes
        .values()
        .map(|recipe| process_package(recipe, fetcher, context))
        .collect();
    BatchReport { outcomes }
}

/// Process a single recipe.
#[must_use]
pub fn process_package(
    recipe: &PackageRecipe,
    fetcher: &dyn NativeFetcher,
    context: &BatchContext<'_>,
) -> PackageOutcome {
    if let Some(reason) = skip_reason(recipe) {
        info!("skipping {}: {reason}", recipe.name);
        return PackageOutcome::Skipped {
            name: recipe.name.clone(),
            reason,
        };
    }

    match fetch_and_repackage(recipe, fetcher, context) {
        Ok(output) => {
            for warning in &output.warnings {
                warn!("{} {}: {warning}", recipe.name, recipe.version);
            }
            PackageOutcome::Repackaged {
                name: recipe.name.clone(),
                version: recipe.version.clone(),
                output,
            }
        }
        Err(failure) => {
            error!("{} {} failed: {failure}", recipe.name, recipe.version);
            PackageOutcome::Failed {
                name: recipe.name.clone(),
                version: recipe.version.clone(),
                failure,
            }
        }
    }
}

fn skip_reason(recipe: &PackageRecipe) -> Option<SkipReason> {
    if recipe.package_type != PackageType::Package {
        Some(SkipReason::NotAPackage(recipe.package_type))
    } else if recipe.cross_build_files.is_empty() {
        Some(SkipReason::NoCrossBuildFiles)
    } else {
        None
    }
}

fn fetch_and_repackage(
    recipe: &PackageRecipe,
    fetcher: &dyn NativeFetcher,
    context: &BatchContext<'_>,
) -> Result<RepackageOutput, PackageFailure> {
    // Held until repackaging finishes; dropping it removes the download.
    let temporary = if context.native_dir.is_some() {
        None
    } else {
        Some(native_tempdir(context.scratch_root).map_err(PackageFailure::NativeDir)?)
    };
    let native_dir: PathBuf = context
        .native_dir
        .or_else(|| temporary.as_ref().map(TempDir::path))
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            PackageFailure::NativeDir(io::Error::other("no native download directory"))
        })?;

    fetch_native(
        fetcher,
        &recipe.name,
        &recipe.version,
        &native_dir,
        context.fetch_policy,
    )?;

    let request = RepackageRequest {
        name: recipe.name.clone(),
        version: recipe.version.clone(),
        native_dir,
        cross_dir: context.wheel_dir.to_path_buf(),
        output_dir: context.output_dir.to_path_buf(),
        cross_build_files: recipe.cross_build_files.clone(),
        scratch_root: context.scratch_root.map(Path::to_path_buf),
        update_record: context.update_record,
    };
    let output = repackage(&request)?;
    drop(temporary);
    Ok(output)
}

fn native_tempdir(parent: Option<&Path>) -> io::Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(NATIVE_PREFIX);
    parent.map_or_else(|| builder.tempdir(), |dir| builder.tempdir_in(dir))
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
