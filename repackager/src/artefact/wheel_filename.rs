//! Wheel filename parsing.
//!
//! A wheel filename is `{name}-{version}(-{build})?-{python}-{abi}-{platform}.whl`.
//! Each of the three tag components may be a compressed set joined by `.`
//! (`manylinux_2_17_x86_64.manylinux2014_x86_64`), which [`WheelFilename::tags`]
//! expands into individual triples.

use super::WHEEL_EXTENSION;
use std::fmt;
use thiserror::Error;

/// Errors arising from wheel filename parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WheelFilenameError {
    /// The filename does not end in `.whl`.
    #[error("{filename} is not a wheel filename")]
    NotAWheel {
        /// The rejected filename.
        filename: String,
    },

    /// The filename does not split into five or six `-`-separated parts.
    #[error("{filename} has {count} components; expected 5 or 6")]
    ComponentCount {
        /// The rejected filename.
        filename: String,
        /// The number of components found.
        count: usize,
    },

    /// A component is empty, or the build tag does not start with a digit.
    #[error("{filename} has an invalid {component} component")]
    InvalidComponent {
        /// The rejected filename.
        filename: String,
        /// Which component failed validation.
        component: &'static str,
    },
}

/// A single `(python, abi, platform)` compatibility tag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WheelTag {
    /// Python implementation and version tag, e.g. `cp312`.
    pub python: String,
    /// ABI tag, e.g. `cp312` or `none`.
    pub abi: String,
    /// Platform tag, e.g. `manylinux_2_17_x86_64`.
    pub platform: String,
}

impl fmt::Display for WheelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.python, self.abi, self.platform)
    }
}

/// The parsed components of a wheel filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelFilename {
    name: String,
    version: String,
    build: Option<String>,
    python: String,
    abi: String,
    platform: String,
}

impl WheelFilename {
    /// Parse a wheel filename.
    ///
    /// # Errors
    ///
    /// Returns [`WheelFilenameError`] if the name lacks the `.whl`
    /// extension, has the wrong number of components, or has an empty
    /// component.
    ///
    /// # Examples
    ///
    /// ```
    /// use wheel_repackager::artefact::wheel_filename::WheelFilename;
    ///
    /// let wheel = WheelFilename::parse("numpy-2.0.2-cp312-cp312-win_amd64.whl")?;
    /// assert_eq!(wheel.name(), "numpy");
    /// assert_eq!(wheel.version(), "2.0.2");
    /// # Ok::<(), wheel_repackager::artefact::wheel_filename::WheelFilenameError>(())
    /// ```
    pub fn parse(filename: &str) -> Result<Self, WheelFilenameError> {
        let stem = filename
            .strip_suffix(WHEEL_EXTENSION)
            .and_then(|rest| rest.strip_suffix('.'))
            .ok_or_else(|| WheelFilenameError::NotAWheel {
                filename: filename.to_owned(),
            })?;

        let parts: Vec<&str> = stem.split('-').collect();
        let (name, version, build, python, abi, platform) = match parts.as_slice() {
            [name, version, python, abi, platform] => (*name, *version, None, *python, *abi, *platform),
            [name, version, build, python, abi, platform] => {
                (*name, *version, Some(*build), *python, *abi, *platform)
            }
            other => {
                return Err(WheelFilenameError::ComponentCount {
                    filename: filename.to_owned(),
                    count: other.len(),
                });
            }
        };

        let invalid = |component| WheelFilenameError::InvalidComponent {
            filename: filename.to_owned(),
            component,
        };
        for (component, value) in [
            ("name", name),
            ("version", version),
            ("python tag", python),
            ("abi tag", abi),
            ("platform tag", platform),
        ] {
            if value.is_empty() {
                return Err(invalid(component));
            }
        }
        if build.is_some_and(|tag| !tag.starts_with(|c: char| c.is_ascii_digit())) {
            return Err(invalid("build tag"));
        }

        Ok(Self {
            name: name.to_owned(),
            version: version.to_owned(),
            build: build.map(str::to_owned),
            python: python.to_owned(),
            abi: abi.to_owned(),
            platform: platform.to_owned(),
        })
    }

    /// The distribution name as written in the filename.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The version as written in the filename.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The optional build tag.
    #[must_use]
    pub fn build(&self) -> Option<&str> {
        self.build.as_deref()
    }

    /// Expand the compressed tag sets into every `(python, abi, platform)`
    /// combination, in filename order.
    #[must_use]
    pub fn tags(&self) -> Vec<WheelTag> {
        let mut tags = Vec::new();
        for python in self.python.split('.') {
            for abi in self.abi.split('.') {
                for platform in self.platform.split('.') {
                    tags.push(WheelTag {
                        python: python.to_owned(),
                        abi: abi.to_owned(),
                        platform: platform.to_owned(),
                    });
                }
            }
        }
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_five_component_name() {
        let wheel = WheelFilename::parse("numpy-2.0.2-cp312-cp312-manylinux_2_17_x86_64.whl")
            .expect("valid wheel");
        assert_eq!(wheel.name(), "numpy");
        assert_eq!(wheel.version(), "2.0.2");
        assert_eq!(wheel.build(), None);
        assert_eq!(
            wheel.tags(),
            vec![WheelTag {
                python: "cp312".to_owned(),
                abi: "cp312".to_owned(),
                platform: "manylinux_2_17_x86_64".to_owned(),
            }]
        );
    }

    #[test]
    fn parses_build_tag() {
        let wheel = WheelFilename::parse("demo-1.0-1-py3-none-any.whl").expect("valid wheel");
        assert_eq!(wheel.build(), Some("1"));
    }

    #[test]
    fn expands_compressed_tag_sets() {
        let wheel = WheelFilename::parse(
            "numpy-2.0.2-cp312-cp312-manylinux_2_17_x86_64.manylinux2014_x86_64.whl",
        )
        .expect("valid wheel");
        let platforms: Vec<String> = wheel.tags().into_iter().map(|tag| tag.platform).collect();
        assert_eq!(
            platforms,
            vec!["manylinux_2_17_x86_64", "manylinux2014_x86_64"]
        );
    }

    #[rstest]
    #[case::sdist("numpy-2.0.2.tar.gz")]
    #[case::bare("numpy.whl.txt")]
    fn rejects_non_wheels(#[case] filename: &str) {
        assert!(matches!(
            WheelFilename::parse(filename),
            Err(WheelFilenameError::NotAWheel { .. })
        ));
    }

    #[rstest]
    #[case::too_few("numpy-2.0.2-cp312.whl")]
    #[case::too_many("a-b-1-c-d-e-f.whl")]
    fn rejects_wrong_component_count(#[case] filename: &str) {
        assert!(matches!(
            WheelFilename::parse(filename),
            Err(WheelFilenameError::ComponentCount { .. })
        ));
    }

    #[test]
    fn rejects_non_numeric_build_tag() {
        assert!(matches!(
            WheelFilename::parse("demo-1.0-beta-py3-none-any.whl"),
            Err(WheelFilenameError::InvalidComponent {
                component: "build tag",
                ..
            })
        ));
    }
}
