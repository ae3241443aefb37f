//! Android build automation.
//!
//! Drives the Flutter toolchain to produce a release app bundle. The bundle
//! format (`.aab`) is built rather than a plain APK because the distribution
//! stores require it; the artifact locator still accepts APKs produced by
//! older configurations.

use std::path::PathBuf;
use std::process::Command;

use crate::types::ReleaseError;
use super::common::run_command;

/// Android builder that invokes the platform build toolchain.
pub struct AndroidBuilder {
    /// Root directory of the app project
    app_dir: PathBuf,
    /// Whether to use verbose toolchain output
    verbose: bool,
}

impl AndroidBuilder {
    /// Creates a new Android builder rooted at the app project directory.
    pub fn new(app_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_dir: app_dir.into(),
            verbose: false,
        }
    }

    /// Enables verbose toolchain output.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Builds the release app bundle.
    ///
    /// A non-zero toolchain exit is fatal for the whole pipeline; the
    /// returned error carries the captured build output.
    pub fn build(&self) -> Result<(), ReleaseError> {
        println!("Building Android app bundle...");
        let mut cmd = Command::new("flutter");
        cmd.args(["build", "appbundle", "--release"]);
        if self.verbose {
            cmd.arg("--verbose");
        }
        cmd.current_dir(&self.app_dir);
        run_command(cmd, "flutter build appbundle")
    }
}
