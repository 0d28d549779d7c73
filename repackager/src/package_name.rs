//! Semantic wrapper for package names.
//!
//! Recipes name packages the way the package index does (`scikit-learn`),
//! while wheel filenames escape the separator (`scikit_learn-1.5.2-...`).
//! [`PackageName`] keeps the original spelling and derives the filename form
//! on demand.

use std::fmt;

/// A package name as declared by a recipe.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageName(String);

impl PackageName {
    /// Create a new package name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the package name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the name as it appears in wheel filenames.
    ///
    /// Wheel filenames cannot contain `-` inside the distribution name, so
    /// every `-` is replaced with `_`.
    ///
    /// # Examples
    ///
    /// ```
    /// use wheel_repackager::package_name::PackageName;
    ///
    /// let name = PackageName::from("scikit-learn");
    /// assert_eq!(name.normalized(), "scikit_learn");
    /// ```
    #[must_use]
    pub fn normalized(&self) -> String {
        self.0.replace('-', "_")
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for PackageName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
