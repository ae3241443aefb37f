//! Build artifact discovery.
//!
//! After a platform build completes, the installable package lands under one
//! of a small set of well-known output directories. This module scans them in
//! priority order and returns the first match.
//!
//! Android prefers the app bundle (`.aab`) over the APK because distribution
//! stores require the bundle format; the plain APK directories are kept as
//! fallbacks for older toolchain configurations.

use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{BuildArtifact, Platform};

/// One candidate output directory and the artifact extension expected in it.
struct Candidate {
    dir: &'static str,
    extension: &'static str,
}

/// Priority-ordered candidate directories for a platform.
fn candidates(platform: Platform) -> &'static [Candidate] {
    match platform {
        Platform::Android => &[
            Candidate {
                dir: "build/app/outputs/bundle/release",
                extension: "aab",
            },
            Candidate {
                dir: "build/app/outputs/flutter-apk",
                extension: "apk",
            },
            Candidate {
                dir: "build/app/outputs/apk/release",
                extension: "apk",
            },
        ],
        Platform::Ios => &[Candidate {
            dir: "build/ios/ipa",
            extension: "ipa",
        }],
    }
}

/// Returns the directories `find` would search, relative to `app_dir`.
///
/// Used by the controller to produce a descriptive not-found error.
pub fn search_dirs(app_dir: &Path, platform: Platform) -> Vec<PathBuf> {
    candidates(platform)
        .iter()
        .map(|c| app_dir.join(c.dir))
        .collect()
}

/// Finds the build artifact for `platform` under `app_dir`.
///
/// Scans each candidate directory in priority order and returns the first
/// file whose name ends in the expected extension. Entries within a directory
/// are visited in sorted order, so the result is deterministic regardless of
/// filesystem enumeration order or unrelated files sitting next to the
/// artifact.
///
/// Returns `None` when no candidate matches; not finding an artifact is a
/// normal outcome here, the caller decides whether it is fatal.
pub fn find(app_dir: &Path, platform: Platform) -> Option<BuildArtifact> {
    for candidate in candidates(platform) {
        let dir = app_dir.join(candidate.dir);
        if let Some(path) = first_with_extension(&dir, candidate.extension) {
            return Some(BuildArtifact { path, platform });
        }
    }
    None
}

fn first_with_extension(dir: &Path, extension: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext == extension)
        })
        .collect();
    files.sort();
    files.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"artifact").unwrap();
    }

    #[test]
    fn prefers_app_bundle_over_apk() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("build/app/outputs/bundle/release/app-release.aab"));
        touch(&root.join("build/app/outputs/flutter-apk/app-release.apk"));

        let artifact = find(root, Platform::Android).unwrap();
        assert_eq!(
            artifact.path,
            root.join("build/app/outputs/bundle/release/app-release.aab")
        );
        assert_eq!(artifact.platform, Platform::Android);
    }

    #[test]
    fn falls_back_to_flutter_apk_then_release_apk() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("build/app/outputs/apk/release/app-release.apk"));

        let artifact = find(root, Platform::Android).unwrap();
        assert_eq!(
            artifact.path,
            root.join("build/app/outputs/apk/release/app-release.apk")
        );

        touch(&root.join("build/app/outputs/flutter-apk/app-release.apk"));
        let artifact = find(root, Platform::Android).unwrap();
        assert_eq!(
            artifact.path,
            root.join("build/app/outputs/flutter-apk/app-release.apk")
        );
    }

    #[test]
    fn ignores_files_with_other_extensions() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("build/app/outputs/bundle/release/app-release.aab.sha1"));
        touch(&root.join("build/app/outputs/bundle/release/output-metadata.json"));
        touch(&root.join("build/app/outputs/bundle/release/app-release.aab"));

        let artifact = find(root, Platform::Android).unwrap();
        assert!(artifact.path.ends_with("app-release.aab"));
    }

    #[test]
    fn match_is_deterministic_with_multiple_files() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("build/ios/ipa/zeta.ipa"));
        touch(&root.join("build/ios/ipa/alpha.ipa"));

        let artifact = find(root, Platform::Ios).unwrap();
        assert!(artifact.path.ends_with("alpha.ipa"));
    }

    #[test]
    fn returns_none_when_nothing_matches() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(find(tmp.path(), Platform::Android).is_none());
        assert!(find(tmp.path(), Platform::Ios).is_none());
    }

    #[test]
    fn search_dirs_are_ordered_bundle_first() {
        let dirs = search_dirs(Path::new("/app"), Platform::Android);
        assert_eq!(dirs.len(), 3);
        assert_eq!(dirs[0], Path::new("/app/build/app/outputs/bundle/release"));
        assert_eq!(dirs[1], Path::new("/app/build/app/outputs/flutter-apk"));
        assert_eq!(dirs[2], Path::new("/app/build/app/outputs/apk/release"));
    }
}
