//! Configuration resolution for moship.
//!
//! Three on-disk records feed a release run, all rooted in the app project
//! directory:
//!
//! 1. `pubspec.yaml` - project metadata (app name, `major.minor.patch[+build]`
//!    version line); consumed, not owned, by moship
//! 2. `moship.toml` - distribution credentials and the platform bundle
//!    identifiers
//! 3. `telegram.env` - optional notification credentials (see
//!    [`crate::telegram`])
//!
//! ## Example `moship.toml`
//!
//! ```toml
//! [distribution]
//! user_id = "u-1234"
//! app_id = "a-5678"
//! key = "s3cret"
//!
//! [ios]
//! bundle_identifier = "com.example.app"
//!
//! [android]
//! package_name = "com.example.app"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use moship_sdk::{Platform, ReleaseError};
use serde::{Deserialize, Serialize};

/// The credential/config file name, looked up in the app directory.
pub const CONFIG_FILE_NAME: &str = "moship.toml";

/// The project metadata file name.
pub const PUBSPEC_FILE_NAME: &str = "pubspec.yaml";

/// Resolves the app project directory.
///
/// An explicit `--app-dir` takes precedence over the current directory. The
/// resolved path must exist and be a directory.
pub fn resolve_app_dir(flag: Option<PathBuf>) -> Result<PathBuf, ReleaseError> {
    let dir = match flag {
        Some(path) => path,
        None => env::current_dir()?,
    };
    if !dir.is_dir() {
        return Err(ReleaseError::Config(format!(
            "app directory does not exist: {}",
            dir.display()
        )));
    }
    dir.canonicalize().map_err(|e| {
        ReleaseError::Config(format!(
            "cannot resolve app directory {}: {}",
            dir.display(),
            e
        ))
    })
}

/// Resolves the target platform.
///
/// An explicit `--platform` flag wins. Otherwise the platform is
/// auto-detected from the project layout: exactly one of `ios/` or `android/`
/// must exist. Both present is ambiguous; neither present means this is not a
/// recognizable mobile project. Both cases are fatal.
pub fn detect_platform(
    app_dir: &Path,
    explicit: Option<Platform>,
) -> Result<Platform, ReleaseError> {
    if let Some(platform) = explicit {
        return Ok(platform);
    }
    let has_ios = app_dir.join("ios").is_dir();
    let has_android = app_dir.join("android").is_dir();
    match (has_ios, has_android) {
        (true, false) => Ok(Platform::Ios),
        (false, true) => Ok(Platform::Android),
        (true, true) => Err(ReleaseError::Config(
            "ambiguous platform: both ios/ and android/ exist; pass --platform".to_string(),
        )),
        (false, false) => Err(ReleaseError::Config(
            "unable to determine platform: neither ios/ nor android/ exists; pass --platform"
                .to_string(),
        )),
    }
}

/// Distribution service credentials from `moship.toml`.
///
/// All three fields must be present and non-empty before any network call is
/// attempted.
#[derive(Clone, Debug)]
pub struct DistributionCredentials {
    pub user_id: String,
    pub app_id: String,
    pub key: String,
}

/// Root structure of `moship.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Distribution service account and endpoint.
    pub distribution: DistributionSection,
    /// iOS-specific identifiers.
    pub ios: IosSection,
    /// Android-specific identifiers.
    pub android: AndroidSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionSection {
    pub user_id: Option<String>,
    pub app_id: Option<String>,
    pub key: Option<String>,
    /// Optional override of the compiled-in service base URL.
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IosSection {
    pub bundle_identifier: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AndroidSection {
    pub package_name: Option<String>,
}

impl ProjectConfig {
    /// Loads `moship.toml` from the app directory.
    pub fn load(app_dir: &Path) -> Result<Self, ReleaseError> {
        let path = app_dir.join(CONFIG_FILE_NAME);
        let contents = fs::read_to_string(&path).map_err(|e| {
            ReleaseError::Config(format!(
                "cannot read {}: {} (run `moship init` to scaffold one)",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&contents)
            .map_err(|e| ReleaseError::Config(format!("cannot parse {}: {}", path.display(), e)))
    }

    /// Validates and returns the distribution credentials.
    ///
    /// Fails listing every missing field, so the user fixes the file in one
    /// pass instead of one error at a time.
    pub fn credentials(&self) -> Result<DistributionCredentials, ReleaseError> {
        let mut missing = Vec::new();
        let user_id = required(&self.distribution.user_id, "distribution.user_id", &mut missing);
        let app_id = required(&self.distribution.app_id, "distribution.app_id", &mut missing);
        let key = required(&self.distribution.key, "distribution.key", &mut missing);
        if !missing.is_empty() {
            return Err(ReleaseError::Config(format!(
                "incomplete distribution credentials in {}: missing {}",
                CONFIG_FILE_NAME,
                missing.join(", ")
            )));
        }
        Ok(DistributionCredentials {
            user_id,
            app_id,
            key,
        })
    }

    /// Returns the platform bundle identifier for this run.
    pub fn bundle_id(&self, platform: Platform) -> Result<String, ReleaseError> {
        let (value, field) = match platform {
            Platform::Ios => (&self.ios.bundle_identifier, "ios.bundle_identifier"),
            Platform::Android => (&self.android.package_name, "android.package_name"),
        };
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                ReleaseError::Config(format!("missing {} in {}", field, CONFIG_FILE_NAME))
            })
    }

    /// Returns the configured endpoint override, if any.
    pub fn endpoint(&self) -> Option<&str> {
        self.distribution
            .endpoint
            .as_deref()
            .filter(|v| !v.is_empty())
    }
}

fn required(value: &Option<String>, field: &'static str, missing: &mut Vec<&'static str>) -> String {
    match value.as_deref().filter(|v| !v.is_empty()) {
        Some(v) => v.to_string(),
        None => {
            missing.push(field);
            String::new()
        }
    }
}

/// Read-only snapshot of the app's identity for one run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AppIdentity {
    /// Semantic version name, e.g. "1.2.3".
    pub version_name: String,
    /// Positive build number; defaults to 1 when the metadata omits it.
    pub build_number: u32,
    /// Human-readable app name from the project metadata.
    pub app_name: String,
    /// Platform bundle identifier routing the upload.
    pub bundle_id: String,
}

#[derive(Debug, Deserialize)]
struct Pubspec {
    name: String,
    version: String,
}

impl AppIdentity {
    /// Loads the app identity from the project metadata file.
    pub fn load(app_dir: &Path, bundle_id: String) -> Result<Self, ReleaseError> {
        let path = app_dir.join(PUBSPEC_FILE_NAME);
        let contents = fs::read_to_string(&path).map_err(|e| {
            ReleaseError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let pubspec: Pubspec = serde_yaml::from_str(&contents).map_err(|e| {
            ReleaseError::Config(format!("cannot parse {}: {}", path.display(), e))
        })?;
        let (version_name, build_number) = parse_version(&pubspec.version)?;
        Ok(Self {
            version_name,
            build_number,
            app_name: pubspec.name,
            bundle_id,
        })
    }
}

/// Parses a `major.minor.patch[+build]` version string.
fn parse_version(raw: &str) -> Result<(String, u32), ReleaseError> {
    let raw = raw.trim();
    let (name, build) = match raw.split_once('+') {
        Some((name, build)) => (name, Some(build)),
        None => (raw, None),
    };

    let parts: Vec<&str> = name.split('.').collect();
    let well_formed = parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
    if !well_formed {
        return Err(ReleaseError::Config(format!(
            "invalid version '{}': expected major.minor.patch[+build]",
            raw
        )));
    }

    let build_number = match build {
        Some(b) => b
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ReleaseError::Config(format!(
                    "invalid build number '{}' in version '{}': expected a positive integer",
                    b, raw
                ))
            })?,
        None => 1,
    };

    Ok((name.to_string(), build_number))
}
