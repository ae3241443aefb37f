//! Core types for moship-sdk.
//!
//! This module defines the fundamental types used throughout the SDK:
//!
//! - [`ReleaseError`] - Error taxonomy for the whole release pipeline
//! - [`Platform`] - Target platform selection (iOS or Android)
//! - [`RunMode`] - Whether a run builds before uploading or uploads only
//! - [`PipelineConfig`] - Immutable per-run configuration
//! - [`BuildArtifact`] - A located, uploadable build output

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Error taxonomy for moship operations.
///
/// Every fatal pipeline failure maps to one of these variants; the CLI prints
/// the message and exits non-zero. Notification failures deliberately never
/// appear here - they are logged warnings, not errors.
#[derive(Debug, thiserror::Error)]
pub enum ReleaseError {
    /// Invalid or missing configuration.
    ///
    /// Covers a missing app directory, an undeterminable target platform,
    /// incomplete distribution credentials, and malformed project metadata.
    #[error("configuration error: {0}")]
    Config(String),

    /// The native build toolchain failed.
    ///
    /// Carries the captured output of the failing subprocess so the user can
    /// diagnose the build without re-running it.
    #[error("build failed: {0}")]
    Build(String),

    /// No build artifact was found for the target platform.
    ///
    /// Usually means the build produced no output, or produced it somewhere
    /// outside the known output directories.
    #[error("no {platform} artifact found; searched:\n{}", format_searched(.searched))]
    ArtifactNotFound {
        platform: Platform,
        searched: Vec<PathBuf>,
    },

    /// The distribution service returned something the protocol does not
    /// recognize (malformed upload URL, unparsable install-URL response).
    #[error("distribution protocol error: {0}")]
    Protocol(String),

    /// The artifact transfer itself failed (non-success HTTP status or a
    /// transport error during the PUT).
    #[error("artifact upload failed: {0}")]
    Upload(String),

    /// An I/O error occurred reading project files or the artifact.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_searched(searched: &[PathBuf]) -> String {
    searched
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Target mobile platform for a release run.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    /// Returns the platform name as used in protocol query parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline run mode.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RunMode {
    /// Build the app (optionally after a source sync), then upload.
    BuildAndUpload,
    /// Skip sync and build; upload an artifact that already exists on disk.
    UploadOnly,
}

/// Immutable per-run pipeline configuration.
///
/// Created once at startup from CLI arguments and directory probing, then
/// threaded explicitly through every stage - no ambient global state.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Absolute path to the app project directory.
    pub app_dir: PathBuf,
    /// Target platform for this run.
    pub platform: Platform,
    /// Run the pre-build source sync (pull, submodules, dependency fetch).
    pub update_before_build: bool,
    /// Build-and-upload or upload-only.
    pub mode: RunMode,
}

/// A build output located under the known output directories.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BuildArtifact {
    pub path: PathBuf,
    pub platform: Platform,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_strings_match_protocol_values() {
        assert_eq!(Platform::Ios.as_str(), "ios");
        assert_eq!(Platform::Android.as_str(), "android");
        assert_eq!(format!("{}", Platform::Android), "android");
    }

    #[test]
    fn artifact_not_found_lists_searched_directories() {
        let err = ReleaseError::ArtifactNotFound {
            platform: Platform::Android,
            searched: vec![
                PathBuf::from("build/app/outputs/bundle/release"),
                PathBuf::from("build/app/outputs/flutter-apk"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("no android artifact found"));
        assert!(msg.contains("build/app/outputs/bundle/release"));
        assert!(msg.contains("build/app/outputs/flutter-apk"));
    }

    #[test]
    fn platform_deserializes_lowercase() {
        let p: Platform = serde_json::from_str("\"ios\"").unwrap();
        assert_eq!(p, Platform::Ios);
    }
}
