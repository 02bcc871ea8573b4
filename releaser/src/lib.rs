//! Meili build and release library.
//!
//! This crate drives cargo across the supported target platforms, publishes
//! the results to an internal share on the distribution host, and uploads
//! release binaries to GitHub. It is used by the `meili-releaser` CLI binary
//! and can be consumed programmatically for testing.
//!
//! # Modules
//!
//! - [`builder`] - Sequential cargo release builds per target
//! - [`cli`] - Command-line argument definitions
//! - [`deps`] - Command execution seam and pre-flight dependency check
//! - [`distributor`] - Publishing build outputs on the distribution host
//! - [`error`] - Semantic error types
//! - [`host`] - Distribution host detection
//! - [`output`] - Progress and summary formatting
//! - [`pipeline`] - Build pipeline orchestration
//! - [`release`] - Release pipeline orchestration
//! - [`secrets`] - Secrets file loading
//! - [`target`] - Target catalogue and output naming
//! - [`upload`] - Release asset upload
//! - [`version`] - Release version extraction
//! - [`workspace`] - Project root discovery

pub mod builder;
pub mod cli;
pub mod deps;
pub mod distributor;
pub mod error;
pub mod host;
pub mod output;
pub mod pipeline;
pub mod release;
pub mod secrets;
pub mod target;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod upload;
pub mod version;
pub mod workspace;
