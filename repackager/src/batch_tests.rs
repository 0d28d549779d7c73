//! Unit tests for batch orchestration.

use super::*;
use crate::fetch::MockNativeFetcher;
use crate::test_utils::{wheel_entry_text, write_wheel};
use rstest::{fixture, rstest};
use std::fs;
use std::time::Duration;

const NATIVE_WHEEL: &str = "demo-1.0-cp312-cp312-linux_x86_64.whl";
const CROSS_WHEEL: &str = "demo-1.0-cp312-cp312-emscripten_3_1_58_wasm32.whl";

struct Dirs {
    root: TempDir,
}

impl Dirs {
    fn path(&self, name: &str) -> PathBuf {
        let path = self.root.path().join(name);
        fs::create_dir_all(&path).expect("mkdir");
        path
    }

    fn is_empty(&self, name: &str) -> bool {
        fs::read_dir(self.path(name)).expect("read_dir").next().is_none()
    }
}

#[fixture]
fn dirs() -> Dirs {
    Dirs {
        root: TempDir::new().expect("temp dir creation succeeds"),
    }
}

fn recipe(name: &str, package_type: PackageType, files: &[&str]) -> PackageRecipe {
    PackageRecipe {
        name: PackageName::from(name),
        version: "1.0".to_owned(),
        package_type,
        cross_build_files: files.iter().map(|file| (*file).to_owned()).collect(),
    }
}

fn recipes(items: Vec<PackageRecipe>) -> BTreeMap<String, PackageRecipe> {
    items
        .into_iter()
        .map(|item| (item.name.as_str().to_owned(), item))
        .collect()
}

fn no_backoff() -> FetchPolicy {
    FetchPolicy {
        attempts: 2,
        backoff: Duration::ZERO,
    }
}

/// A fetcher that writes a native wheel for `demo` and fails for anything
/// else.
fn demo_fetcher() -> MockNativeFetcher {
    let mut fetcher = MockNativeFetcher::new();
    fetcher.expect_fetch().returning(|name, version, dest| {
        if name.as_str() != "demo" {
            return Err(FetchError::Failed {
                name: name.clone(),
                version: version.to_owned(),
                stderr: "no such package".to_owned(),
            });
        }
        write_wheel(
            &dest.join(NATIVE_WHEEL),
            &[("include/foo.h", "A"), ("lib/libfoo.a", "B")],
        );
        Ok(())
    });
    fetcher
}

#[rstest]
fn skips_non_packages_and_empty_file_lists(dirs: Dirs) {
    let mut fetcher = MockNativeFetcher::new();
    fetcher.expect_fetch().never();
    let (wheel_dir, output_dir) = (dirs.path("wheels"), dirs.path("out"));
    let context = BatchContext {
        wheel_dir: &wheel_dir,
        output_dir: &output_dir,
        native_dir: None,
        scratch_root: None,
        fetch_policy: no_backoff(),
        update_record: false,
    };

    let report = run_batch(
        &recipes(vec![
            recipe("libffi", PackageType::StaticLibrary, &["include/ffi.h"]),
            recipe("six", PackageType::Package, &[]),
        ]),
        &fetcher,
        &context,
    );

    assert_eq!(report.skipped(), 2);
    assert!(!report.has_failures());
    assert!(matches!(
        report.outcomes.as_slice(),
        [
            PackageOutcome::Skipped {
                reason: SkipReason::NotAPackage(PackageType::StaticLibrary),
                ..
            },
            PackageOutcome::Skipped {
                reason: SkipReason::NoCrossBuildFiles,
                ..
            },
        ]
    ));
}

#[rstest]
fn failure_does_not_stop_the_batch(dirs: Dirs) {
    let wheel_dir = dirs.path("wheels");
    write_wheel(&wheel_dir.join(CROSS_WHEEL), &[("include/foo.h", "C")]);
    let (output_dir, scratch) = (dirs.path("out"), dirs.path("scratch"));
    let fetcher = demo_fetcher();
    let context = BatchContext {
        wheel_dir: &wheel_dir,
        output_dir: &output_dir,
        native_dir: None,
        scratch_root: Some(&scratch),
        fetch_policy: no_backoff(),
        update_record: false,
    };

    let report = run_batch(
        &recipes(vec![
            recipe("broken", PackageType::Package, &["include/foo.h"]),
            recipe("demo", PackageType::Package, &["include/foo.h", "include/none.h"]),
        ]),
        &fetcher,
        &context,
    );

    assert!(report.has_failures());
    assert_eq!(report.failed(), 1);
    assert_eq!(report.repackaged(), 1);
    assert_eq!(report.warnings(), 1);
    let [broken, demo] = report.outcomes.as_slice() else {
        panic!("expected two outcomes");
    };
    assert!(matches!(
        broken,
        PackageOutcome::Failed {
            failure: PackageFailure::Fetch(FetchError::RetriesExhausted { .. }),
            ..
        }
    ));
    assert_eq!(demo.name().as_str(), "demo");
    assert_eq!(
        wheel_entry_text(&output_dir.join(NATIVE_WHEEL), "include/foo.h"),
        "C"
    );
    assert!(dirs.is_empty("scratch"));
}

#[rstest]
fn configured_native_dir_keeps_downloads(dirs: Dirs) {
    let wheel_dir = dirs.path("wheels");
    write_wheel(&wheel_dir.join(CROSS_WHEEL), &[("include/foo.h", "C")]);
    let (output_dir, native_dir) = (dirs.path("out"), dirs.path("native"));
    let fetcher = demo_fetcher();
    let context = BatchContext {
        wheel_dir: &wheel_dir,
        output_dir: &output_dir,
        native_dir: Some(&native_dir),
        scratch_root: None,
        fetch_policy: no_backoff(),
        update_record: false,
    };

    let outcome = process_package(
        &recipe("demo", PackageType::Package, &["include/foo.h"]),
        &fetcher,
        &context,
    );

    assert!(matches!(outcome, PackageOutcome::Repackaged { .. }));
    assert!(native_dir.join(NATIVE_WHEEL).is_file());
}

#[rstest]
fn missing_cross_wheel_is_a_package_failure(dirs: Dirs) {
    let (wheel_dir, output_dir, scratch) =
        (dirs.path("wheels"), dirs.path("out"), dirs.path("scratch"));
    let fetcher = demo_fetcher();
    let context = BatchContext {
        wheel_dir: &wheel_dir,
        output_dir: &output_dir,
        native_dir: None,
        scratch_root: Some(&scratch),
        fetch_policy: no_backoff(),
        update_record: false,
    };

    let outcome = process_package(
        &recipe("demo", PackageType::Package, &["include/foo.h"]),
        &fetcher,
        &context,
    );

    assert!(matches!(
        outcome,
        PackageOutcome::Failed {
            failure: PackageFailure::Repackage(RepackageError::Locate { .. }),
            ..
        }
    ));
    assert!(dirs.is_empty("scratch"));
    assert!(dirs.is_empty("out"));
}

#[test]
fn skip_reasons_render_for_logs() {
    assert_eq!(
        SkipReason::NotAPackage(PackageType::SharedLibrary).to_string(),
        "package type is shared_library"
    );
    assert_eq!(
        SkipReason::NoCrossBuildFiles.to_string(),
        "no cross-build files declared"
    );
}
