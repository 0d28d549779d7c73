//! Wheel selection by version and compatibility tag.

use super::index::{IndexFile, ProjectPage};
use crate::artefact::wheel_filename::{WheelFilename, WheelTag};
use log::{debug, warn};

/// Platforms never mirrored.
pub const EXCLUDED_PLATFORMS: &[&str] = &["win32", "win_amd64"];

/// Architecture suffixes never mirrored.
pub const EXCLUDED_ARCH_SUFFIXES: &[&str] =
    &["i686", "i386", "armv6l", "armv7l", "s390x", "ppc64le"];

/// ABIs that are mirrored.
pub const SUPPORTED_ABIS: &[&str] = &["none", "cp312", "cp313", "cp314"];

/// Decides which compatibility tags are worth mirroring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    excluded_platforms: Vec<String>,
    excluded_arch_suffixes: Vec<String>,
    supported_abis: Vec<String>,
}

impl Default for TagFilter {
    fn default() -> Self {
        let owned = |items: &[&str]| -> Vec<String> {
            items.iter().map(|item| (*item).to_owned()).collect()
        };
        Self {
            excluded_platforms: owned(EXCLUDED_PLATFORMS),
            excluded_arch_suffixes: owned(EXCLUDED_ARCH_SUFFIXES),
            supported_abis: owned(SUPPORTED_ABIS),
        }
    }
}

impl TagFilter {
    /// Whether `tag` passes the filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use wheel_repackager::artefact::wheel_filename::WheelTag;
    /// use wheel_repackager::mirror::filter::TagFilter;
    ///
    /// let tag = |abi: &str, platform: &str| WheelTag {
    ///     python: "cp312".to_owned(),
    ///     abi: abi.to_owned(),
    ///     platform: platform.to_owned(),
    /// };
    /// let filter = TagFilter::default();
    /// assert!(filter.accepts(&tag("cp312", "manylinux_2_17_x86_64")));
    /// assert!(!filter.accepts(&tag("cp312", "win_amd64")));
    /// assert!(!filter.accepts(&tag("cp311", "manylinux_2_17_x86_64")));
    /// ```
    #[must_use]
    pub fn accepts(&self, tag: &WheelTag) -> bool {
        if self.excluded_platforms.iter().any(|platform| *platform == tag.platform) {
            return false;
        }
        if self
            .excluded_arch_suffixes
            .iter()
            .any(|suffix| tag.platform.ends_with(suffix.as_str()))
        {
            return false;
        }
        self.supported_abis.iter().any(|abi| *abi == tag.abi)
    }
}

/// Pick the wheels of `version` that carry at least one accepted tag,
/// newest upload first.
///
/// The version in each filename decides; the page's `versions` list is only
/// checked to warn about a version the index does not advertise.
#[must_use]
pub fn select_wheels(project: &ProjectPage, version: &str, filter: &TagFilter) -> Vec<IndexFile> {
    if !project.versions.iter().any(|listed| listed == version) {
        warn!("version {version} is not listed by the index; matching filenames anyway");
    }

    project
        .files
        .iter()
        .rev()
        .filter(|file| wanted(file, version, filter))
        .cloned()
        .collect()
}

fn wanted(file: &IndexFile, version: &str, filter: &TagFilter) -> bool {
    if file.filename.contains(['/', '\\']) {
        warn!("skipping {}: not a plain filename", file.filename);
        return false;
    }
    if !file.filename.ends_with(".whl") {
        return false;
    }
    let wheel = match WheelFilename::parse(&file.filename) {
        Ok(wheel) => wheel,
        Err(err) => {
            warn!("skipping {}: {err}", file.filename);
            return false;
        }
    };
    if wheel.version() != version {
        return false;
    }
    let accepted = wheel.tags().iter().any(|tag| filter.accepts(tag));
    if !accepted {
        debug!("skipping {}: no supported tag", file.filename);
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn file(filename: &str) -> IndexFile {
        IndexFile {
            filename: filename.to_owned(),
            url: format!("https://files.test/{filename}"),
        }
    }

    fn filenames(files: &[IndexFile]) -> Vec<&str> {
        files.iter().map(|file| file.filename.as_str()).collect()
    }

    #[rstest]
    #[case::linux("numpy-2.0.2-cp312-cp312-manylinux_2_17_x86_64.whl", true)]
    #[case::macos("numpy-2.0.2-cp313-cp313-macosx_14_0_arm64.whl", true)]
    #[case::pure("six-1.0-py3-none-any.whl", true)]
    #[case::windows("numpy-2.0.2-cp312-cp312-win_amd64.whl", false)]
    #[case::win32("numpy-2.0.2-cp312-cp312-win32.whl", false)]
    #[case::i686("numpy-2.0.2-cp312-cp312-manylinux_2_17_i686.whl", false)]
    #[case::s390x("numpy-2.0.2-cp312-cp312-manylinux_2_17_s390x.whl", false)]
    #[case::old_abi("numpy-2.0.2-cp311-cp311-manylinux_2_17_x86_64.whl", false)]
    #[case::stable_abi("demo-1.0-cp39-abi3-manylinux_2_17_x86_64.whl", false)]
    fn default_filter_decisions(#[case] filename: &str, #[case] expected: bool) {
        let wheel = WheelFilename::parse(filename).expect("valid wheel");
        let filter = TagFilter::default();
        assert_eq!(
            wheel.tags().iter().any(|tag| filter.accepts(tag)),
            expected
        );
    }

    #[test]
    fn selects_matching_wheels_newest_first() {
        let project = ProjectPage {
            versions: vec!["2.0.1".to_owned(), "2.0.2".to_owned()],
            files: vec![
                file("numpy-2.0.1-cp312-cp312-manylinux_2_17_x86_64.whl"),
                file("numpy-2.0.2.tar.gz"),
                file("numpy-2.0.2-cp312-cp312-manylinux_2_17_x86_64.manylinux2014_x86_64.whl"),
                file("numpy-2.0.2-cp312-cp312-win_amd64.whl"),
                file("numpy-2.0.2-cp313-cp313-macosx_14_0_arm64.whl"),
            ],
        };

        let selected = select_wheels(&project, "2.0.2", &TagFilter::default());

        assert_eq!(
            filenames(&selected),
            vec![
                "numpy-2.0.2-cp313-cp313-macosx_14_0_arm64.whl",
                "numpy-2.0.2-cp312-cp312-manylinux_2_17_x86_64.manylinux2014_x86_64.whl",
            ]
        );
    }

    #[test]
    fn unlisted_version_still_matches_by_filename() {
        let project = ProjectPage {
            versions: vec!["1.0".to_owned()],
            files: vec![file("demo-1.1-py3-none-any.whl")],
        };

        let selected = select_wheels(&project, "1.1", &TagFilter::default());

        assert_eq!(filenames(&selected), vec!["demo-1.1-py3-none-any.whl"]);
    }

    #[test]
    fn skips_unparseable_and_unsafe_filenames() {
        let project = ProjectPage {
            versions: vec!["1.0".to_owned()],
            files: vec![
                file("demo-1.0.whl"),
                IndexFile {
                    filename: "../demo-1.0-py3-none-any.whl".to_owned(),
                    url: "https://files.test/x.whl".to_owned(),
                },
                file("demo-1.0-py3-none-any.whl"),
            ],
        };

        let selected = select_wheels(&project, "1.0", &TagFilter::default());

        assert_eq!(filenames(&selected), vec!["demo-1.0-py3-none-any.whl"]);
    }
}
