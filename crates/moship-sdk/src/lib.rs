//! Mobile Release SDK
//!
//! `moship-sdk` is the library half of the moship release pipeline. It owns
//! the pieces that do not touch the network:
//!
//! - **Types**: the [`Platform`]/[`RunMode`] enums, the immutable
//!   [`PipelineConfig`] threaded through every stage, and the
//!   [`ReleaseError`] taxonomy every fatal pipeline failure maps to
//! - **Builders**: subprocess drivers for the platform build toolchain plus
//!   the optional pre-build source sync
//! - **Artifact discovery**: priority-ordered scanning of the known build
//!   output directories
//!
//! The CLI crate (`moship`) layers the distribution protocol client, the
//! Telegram notifier, and the pipeline controller on top.
//!
//! # Example
//!
//! ```ignore
//! use moship_sdk::builders::AndroidBuilder;
//! use moship_sdk::{artifact, Platform};
//!
//! AndroidBuilder::new(".").build()?;
//! let found = artifact::find(std::path::Path::new("."), Platform::Android);
//! # Ok::<(), moship_sdk::ReleaseError>(())
//! ```

pub mod artifact;
pub mod builders;
pub mod types;

pub use types::{BuildArtifact, PipelineConfig, Platform, ReleaseError, RunMode};
