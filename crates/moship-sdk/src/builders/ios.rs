//! iOS build automation.
//!
//! Drives the Flutter toolchain to produce an installable archive (`.ipa`).
//! Export options are supplied only when `ios/ExportOptions.plist` exists in
//! the project; without it the toolchain falls back to its default export,
//! which may still succeed for unsigned or automatically signed builds, so
//! absence is a warning rather than a failure.

use std::path::PathBuf;
use std::process::Command;

use crate::types::ReleaseError;
use super::common::run_command;

/// Relative path of the export options file consulted before an iOS build.
pub const EXPORT_OPTIONS: &str = "ios/ExportOptions.plist";

/// iOS builder that invokes the platform build toolchain.
pub struct IosBuilder {
    /// Root directory of the app project
    app_dir: PathBuf,
    /// Whether to use verbose toolchain output
    verbose: bool,
}

impl IosBuilder {
    /// Creates a new iOS builder rooted at the app project directory.
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

    /// Builds the release archive.
    ///
    /// A non-zero toolchain exit is fatal for the whole pipeline; the
    /// returned error carries the captured build output.
    pub fn build(&self) -> Result<(), ReleaseError> {
        println!("Building iOS archive...");
        let mut cmd = Command::new("flutter");
        cmd.args(["build", "ipa", "--release"]);

        if self.app_dir.join(EXPORT_OPTIONS).exists() {
            cmd.arg(format!("--export-options-plist={}", EXPORT_OPTIONS));
        } else {
            eprintln!(
                "Warning: {} not found; exporting with toolchain defaults",
                EXPORT_OPTIONS
            );
        }

        if self.verbose {
            cmd.arg("--verbose");
        }
        cmd.current_dir(&self.app_dir);
        run_command(cmd, "flutter build ipa")
    }
}
