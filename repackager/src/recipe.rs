//! Recipe loading from `meta.yaml` files.
//!
//! A recipe directory holds one subdirectory per package, each with a
//! `meta.yaml` of the form:
//!
//! ```yaml
//! package:
//!   name: numpy
//!   version: 2.0.2
//! build:
//!   type: package
//!   cross-build-files:
//!     - numpy/_core/include/numpy/numpyconfig.h
//!     - numpy/_core/lib/libnpymath.a
//! ```
//!
//! Only the keys above are read; everything else in the file is ignored.

use crate::package_name::PackageName;
use log::debug;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the recipe file inside each package directory.
pub const RECIPE_FILE: &str = "meta.yaml";

/// Errors arising from recipe loading.
#[derive(Debug, Error)]
pub enum RecipeError {
    /// A recipe directory or file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// The path being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A recipe file is not valid YAML or lacks required keys.
    #[error("invalid recipe {}: {source}", .path.display())]
    Parse {
        /// The recipe file.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_yaml::Error,
    },

    /// Two recipe files declare the same package name.
    #[error("package {name} is declared by both {} and {}", .first.display(), .second.display())]
    Duplicate {
        /// The repeated package name.
        name: String,
        /// The recipe loaded first.
        first: PathBuf,
        /// The conflicting recipe.
        second: PathBuf,
    },
}

/// Build classification of a recipe.
///
/// Only [`PackageType::Package`] recipes produce wheels that can be
/// repackaged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageType {
    /// A regular Python package built into a wheel.
    #[default]
    Package,
    /// A static library used only at build time.
    StaticLibrary,
    /// A shared library distributed alongside packages.
    SharedLibrary,
    /// A module split out of the interpreter's standard library.
    CpythonModule,
    /// Any other classification.
    #[serde(other)]
    Other,
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Package => "package",
            Self::StaticLibrary => "static_library",
            Self::SharedLibrary => "shared_library",
            Self::CpythonModule => "cpython_module",
            Self::Other => "other",
        };
        f.write_str(text)
    }
}

/// The parts of a recipe the repackager needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecipe {
    /// Package name.
    pub name: PackageName,
    /// Package version.
    pub version: String,
    /// Build classification.
    pub package_type: PackageType,
    /// Wheel-relative paths taken from the cross-compiled wheel, in order.
    pub cross_build_files: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MetaFile {
    package: MetaPackage,
    #[serde(default)]
    build: MetaBuild,
}

#[derive(Debug, Deserialize)]
struct MetaPackage {
    name: String,
    #[serde(deserialize_with = "scalar_string")]
    version: String,
}

#[derive(Debug, Default, Deserialize)]
struct MetaBuild {
    #[serde(rename = "type", default)]
    package_type: PackageType,
    #[serde(rename = "cross-build-files", default)]
    cross_build_files: Vec<String>,
}

/// Accept unquoted numeric versions (`version: 1.5`) as written.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(text) => Ok(text),
        serde_yaml::Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a version string, found {other:?}"
        ))),
    }
}

/// Parse the recipe at `path`.
///
/// # Errors
///
/// Returns [`RecipeError::Io`] if the file cannot be read and
/// [`RecipeError::Parse`] if it is malformed.
pub fn load_recipe(path: &Path) -> Result<PackageRecipe, RecipeError> {
    let text = fs::read_to_string(path).map_err(|source| RecipeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let meta: MetaFile = serde_yaml::from_str(&text).map_err(|source| RecipeError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(PackageRecipe {
        name: PackageName::new(meta.package.name),
        version: meta.package.version,
        package_type: meta.build.package_type,
        cross_build_files: meta.build.cross_build_files,
    })
}

/// Load every `<directory>/<package>/meta.yaml`, keyed by package name.
///
/// Subdirectories without a recipe file are skipped.
///
/// # Errors
///
/// Returns [`RecipeError`] if the directory cannot be listed, a recipe is
/// malformed, or two recipes declare the same name.
pub fn load_all_recipes(directory: &Path) -> Result<BTreeMap<String, PackageRecipe>, RecipeError> {
    let io_error = |source: io::Error| RecipeError::Io {
        path: directory.to_path_buf(),
        source,
    };

    let mut recipe_paths = Vec::new();
    for entry in fs::read_dir(directory).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        if !entry.file_type().map_err(io_error)?.is_dir() {
            continue;
        }
        let path = entry.path().join(RECIPE_FILE);
        if path.is_file() {
            recipe_paths.push(path);
        } else {
            debug!("skipping {}: no {RECIPE_FILE}", entry.path().display());
        }
    }
    recipe_paths.sort();

    let mut recipes = BTreeMap::new();
    let mut origins: BTreeMap<String, PathBuf> = BTreeMap::new();
    for path in recipe_paths {
        let recipe = load_recipe(&path)?;
        let key = recipe.name.as_str().to_owned();
        if let Some(first) = origins.get(&key) {
            return Err(RecipeError::Duplicate {
                name: key,
                first: first.clone(),
                second: path,
            });
        }
        origins.insert(key.clone(), path);
        recipes.insert(key, recipe);
    }

    debug!(
        "loaded {} recipe(s) from {}",
        recipes.len(),
        directory.display()
    );
    Ok(recipes)
}

/// A source of package recipes.
#[cfg_attr(test, mockall::automock)]
pub trait RecipeSource {
    /// Load every recipe, keyed by package name.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError`] if any recipe cannot be loaded.
    fn load_all(&self) -> Result<BTreeMap<String, PackageRecipe>, RecipeError>;
}

/// Recipes read from a directory of `meta.yaml` files.
#[derive(Debug, Clone)]
pub struct YamlRecipeSource {
    root: PathBuf,
}

impl YamlRecipeSource {
    /// Read recipes below `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl RecipeSource for YamlRecipeSource {
    fn load_all(&self) -> Result<BTreeMap<String, PackageRecipe>, RecipeError> {
        load_all_recipes(&self.root)
    }
}
