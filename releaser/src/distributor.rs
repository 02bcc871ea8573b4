//! Post-build publishing of binaries to an internal share.
//!
//! On the distribution host each build output is copied into a shared
//! directory under a fixed per-platform name so other machines can pick it up
//! for testing. Everywhere else the step is skipped.

use crate::builder::BuildResult;
use crate::error::{ReleaseError, Result};
use crate::host::HostRole;
use camino::Utf8PathBuf;
use log::{debug, info};
use std::fs;

/// Default publishing directory on the distribution host.
pub const DEFAULT_PUBLISH_DIR: &str = "/j/public";

/// What the distribution step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DistributionOutcome {
    /// Not a distribution host; nothing was copied.
    Skipped,
    /// Build outputs were copied to these paths.
    Published(Vec<Utf8PathBuf>),
}

/// Copies build outputs to the publishing directory.
pub struct Distributor {
    publish_dir: Utf8PathBuf,
}

impl Distributor {
    /// Create a distributor publishing into `publish_dir`.
    #[must_use]
    pub fn new(publish_dir: Utf8PathBuf) -> Self {
        Self { publish_dir }
    }

    /// Destination path for a build result.
    #[must_use]
    pub fn destination(&self, build_result: &BuildResult) -> Utf8PathBuf {
        self.publish_dir
            .join(build_result.target.distribution_filename())
    }

    /// Publish a single build output.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::CopyFailed`] if the copy fails.
    pub fn publish(&self, build_result: &BuildResult) -> Result<Utf8PathBuf> {
        let dest = self.destination(build_result);

        fs::copy(&build_result.artifact_path, &dest).map_err(|e| ReleaseError::CopyFailed {
            source_path: build_result.artifact_path.clone(),
            dest: dest.clone(),
            reason: e.to_string(),
        })?;

        debug!("copied {} to {dest}", build_result.artifact_path);
        Ok(dest)
    }

    /// Publish every build output when running on the distribution host.
    ///
    /// On an ordinary host this returns [`DistributionOutcome::Skipped`]
    /// without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns the first copy failure; no retries are attempted.
    pub fn distribute(
        &self,
        role: HostRole,
        build_results: &[BuildResult],
    ) -> Result<DistributionOutcome> {
        if !role.is_distribution() {
            debug!("not a distribution host; skipping publishing");
            return Ok(DistributionOutcome::Skipped);
        }

        info!(
            "distribution host detected; publishing {} build(s) to {}",
            build_results.len(),
            self.publish_dir
        );

        build_results
            .iter()
            .map(|r| self.publish(r))
            .collect::<Result<Vec<_>>>()
            .map(DistributionOutcome::Published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::TargetSpec;
    use camino::Utf8Path;
    use tempfile::TempDir;

    fn utf8_dir(temp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("temp dir is UTF-8")
    }

    fn built(dir: &Utf8Path, triple: &str) -> BuildResult {
        let target = TargetSpec::new(triple, "meili").expect("supported");
        let artifact_path = target.output_path(dir);
        let parent = artifact_path.parent().expect("output path has a parent");
        fs::create_dir_all(parent).expect("create output dir");
        fs::write(&artifact_path, triple).expect("write fake binary");
        BuildResult {
            target,
            artifact_path,
        }
    }

    #[test]
    fn ordinary_host_copies_nothing() {
        let temp = TempDir::new().expect("temp dir");
        let root = utf8_dir(&temp);
        let publish = root.join("public");
        fs::create_dir_all(&publish).expect("publish dir");
        let results = vec![built(&root, "x86_64-unknown-linux-gnu")];

        let outcome = Distributor::new(publish.clone())
            .distribute(HostRole::Ordinary, &results)
            .expect("skip is not an error");

        assert_eq!(outcome, DistributionOutcome::Skipped);
        let entries = fs::read_dir(&publish).expect("read publish dir").count();
        assert_eq!(entries, 0);
    }

    #[test]
    fn distribution_host_publishes_renamed_outputs() {
        let temp = TempDir::new().expect("temp dir");
        let root = utf8_dir(&temp);
        let publish = root.join("public");
        fs::create_dir_all(&publish).expect("publish dir");
        let results = vec![
            built(&root, "x86_64-unknown-linux-gnu"),
            built(&root, "x86_64-pc-windows-gnu"),
            built(&root, "x86_64-apple-darwin"),
        ];

        let outcome = Distributor::new(publish.clone())
            .distribute(HostRole::Distribution, &results)
            .expect("publishing succeeds");

        assert_eq!(
            outcome,
            DistributionOutcome::Published(vec![
                publish.join("meili_linux"),
                publish.join("meili_win.exe"),
                publish.join("meili_macos"),
            ])
        );
        let contents = fs::read_to_string(publish.join("meili_macos")).expect("published file");
        assert_eq!(contents, "x86_64-apple-darwin");
    }

    #[test]
    fn missing_publish_dir_is_a_copy_failure() {
        let temp = TempDir::new().expect("temp dir");
        let root = utf8_dir(&temp);
        let results = vec![built(&root, "x86_64-unknown-linux-gnu")];

        let err = Distributor::new(root.join("does-not-exist"))
            .distribute(HostRole::Distribution, &results)
            .expect_err("copy into a missing directory fails");

        assert!(matches!(err, ReleaseError::CopyFailed { .. }));
    }
}
