//! Common subprocess plumbing shared between the Android and iOS builders.
//!
//! All builder steps shell out to external tools (`flutter`, `git`). Commands
//! are run to completion with both output streams captured; the standard
//! library drains stdout and stderr concurrently, so a chatty toolchain cannot
//! deadlock the pipeline. The caller always blocks until the exit status is
//! available - there is no pipeline-level concurrency here.

use std::process::Command;

use crate::types::ReleaseError;

/// Runs an external command to completion, treating failure as fatal.
///
/// On a non-zero exit the returned [`ReleaseError::Build`] carries the
/// captured stdout and stderr so the user can diagnose the failure without
/// re-running the tool.
pub fn run_command(mut cmd: Command, description: &str) -> Result<(), ReleaseError> {
    let output = cmd.output().map_err(|e| {
        ReleaseError::Build(format!(
            "failed to start {}: {}\n\nEnsure the tool is installed and on PATH.",
            description, e
        ))
    })?;

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ReleaseError::Build(format!(
            "{} failed (exit status: {})\n\nStdout:\n{}\n\nStderr:\n{}",
            description, output.status, stdout, stderr
        )));
    }
    Ok(())
}

/// Runs a best-effort command, degrading failure to a logged warning.
///
/// Used for the VCS sync steps: an intermittent network or remote problem
/// should not block a build that might still succeed from the checked-out
/// sources.
pub fn run_command_best_effort(cmd: Command, description: &str) {
    if let Err(err) = run_command(cmd, description) {
        eprintln!("Warning: {} (continuing)", err);
    }
}
