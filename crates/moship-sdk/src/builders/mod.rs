//! Build automation for mobile platforms.
//!
//! The builders wrap the platform build toolchain as an opaque subprocess:
//! they invoke it, block until its exit status is available, and translate a
//! non-zero exit into a fatal [`ReleaseError::Build`]. What the toolchain
//! does internally is not this crate's concern.
//!
//! | Builder | Platform | Output |
//! |---------|----------|--------|
//! | [`AndroidBuilder`] | Android | release app bundle (`.aab`) |
//! | [`IosBuilder`] | iOS | installable archive (`.ipa`) |
//!
//! [`sync_sources`] optionally precedes a build: it pulls the source tree,
//! updates submodules, and fetches dependencies. Only the dependency fetch is
//! fatal - the two VCS steps degrade to warnings, since an intermittent
//! network or remote problem should not block a build that can still succeed
//! from the checked-out sources.

use std::path::Path;
use std::process::Command;

use crate::types::ReleaseError;

pub mod android;
pub mod common;
pub mod ios;

pub use android::AndroidBuilder;
pub use common::{run_command, run_command_best_effort};
pub use ios::IosBuilder;

/// Synchronizes the source tree before a build.
///
/// Runs three steps in sequence:
/// 1. `git pull` - best effort
/// 2. `git submodule update --init --recursive` - best effort
/// 3. `flutter pub get` - fatal on failure
pub fn sync_sources(app_dir: &Path) -> Result<(), ReleaseError> {
    println!("Syncing sources...");

    let mut pull = Command::new("git");
    pull.arg("pull").current_dir(app_dir);
    run_command_best_effort(pull, "git pull");

    let mut submodules = Command::new("git");
    submodules
        .args(["submodule", "update", "--init", "--recursive"])
        .current_dir(app_dir);
    run_command_best_effort(submodules, "git submodule update");

    let mut pub_get = Command::new("flutter");
    pub_get.args(["pub", "get"]).current_dir(app_dir);
    run_command(pub_get, "flutter pub get")
}
