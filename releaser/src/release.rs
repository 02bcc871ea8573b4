//! Release orchestration.
//!
//! A release run walks a fixed sequence of stages:
//!
//! 1. the full build pipeline (any failure aborts the release),
//! 2. secrets are loaded from the local secrets file,
//! 3. the version is resolved from the manifest,
//! 4. every release artefact is uploaded, one at a time.
//!
//! Upload failures are recorded per artefact and never stop the loop. The
//! artefact list is derived from the build results, so the set of built
//! targets and the set of uploaded files cannot drift apart.

use crate::builder::BuildResult;
use crate::error::{ReleaseError, Result};
use crate::output::{release_summary, write_stderr_line};
use crate::pipeline::{BuildServices, PipelineContext, run_build_pipeline};
use crate::secrets::load_secrets;
use crate::target::TargetSpec;
use crate::upload::{ReleaseUploader, UploadOutcome};
use crate::version::{ReleaseVersion, resolve_version};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, warn};
use std::fmt;
use std::io::Write;

/// A built binary expected to exist after a successful build pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseArtifact {
    /// Target the artefact was built for.
    pub target: TargetSpec,
    /// Local path of the built binary.
    pub path: Utf8PathBuf,
}

impl ReleaseArtifact {
    /// Name the artefact is published under.
    #[must_use]
    pub fn asset_name(&self) -> String {
        self.target.asset_name()
    }
}

/// The release artefacts produced by a build pass, in build order.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use meili_releaser::builder::BuildResult;
/// use meili_releaser::release::release_artifacts;
/// use meili_releaser::target::catalog;
///
/// let results: Vec<BuildResult> = catalog("meili")
///     .expect("catalogue is valid")
///     .into_iter()
///     .map(|target| BuildResult {
///         artifact_path: target.output_path(Utf8Path::new("target")),
///         target,
///     })
///     .collect();
/// let artifacts = release_artifacts(&results);
/// assert_eq!(artifacts.len(), 3);
/// assert_eq!(artifacts[1].path, "target/x86_64-pc-windows-gnu/release/meili.exe");
/// ```
#[must_use]
pub fn release_artifacts(results: &[BuildResult]) -> Vec<ReleaseArtifact> {
    results
        .iter()
        .map(|result| ReleaseArtifact {
            target: result.target.clone(),
            path: result.artifact_path.clone(),
        })
        .collect()
}

/// Stage reached by a release run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStage {
    /// Building every target.
    Build,
    /// Secrets have been loaded.
    SecretsLoaded,
    /// The version has been read from the manifest.
    VersionResolved,
    /// Uploading artefact `index` (one-based) of `total`.
    Uploading {
        /// One-based artefact position.
        index: usize,
        /// Number of artefacts in the release.
        total: usize,
    },
    /// Every artefact has been attempted.
    Done,
}

impl fmt::Display for ReleaseStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build => f.write_str("building release targets"),
            Self::SecretsLoaded => f.write_str("secrets loaded"),
            Self::VersionResolved => f.write_str("version resolved"),
            Self::Uploading { index, total } => write!(f, "uploading artefact {index}/{total}"),
            Self::Done => f.write_str("release complete"),
        }
    }
}

/// Upload result for one artefact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactUpload {
    /// The artefact that was attempted.
    pub artifact: ReleaseArtifact,
    /// What happened.
    pub outcome: UploadOutcome,
}

/// Summary of a finished release run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseReport {
    /// Version that was released.
    pub version: ReleaseVersion,
    /// One entry per artefact, in catalogue order.
    pub uploads: Vec<ArtifactUpload>,
}

impl ReleaseReport {
    /// Number of artefacts uploaded in this run.
    #[must_use]
    pub fn uploaded(&self) -> usize {
        self.count(|outcome| matches!(outcome, UploadOutcome::Uploaded { .. }))
    }

    /// Number of artefacts the release already carried.
    #[must_use]
    pub fn duplicates(&self) -> usize {
        self.count(|outcome| matches!(outcome, UploadOutcome::Duplicate))
    }

    /// Number of artefacts that failed to upload.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.count(UploadOutcome::is_failure)
    }

    fn count(&self, predicate: impl Fn(&UploadOutcome) -> bool) -> usize {
        self.uploads
            .iter()
            .filter(|upload| predicate(&upload.outcome))
            .count()
    }
}

/// Context for a release run.
pub struct ReleaseContext<'a> {
    /// Build pipeline settings.
    pub pipeline: PipelineContext<'a>,
    /// Secrets file to load.
    pub secrets_path: &'a Utf8Path,
    /// Manifest holding the version declaration.
    pub manifest_path: &'a Utf8Path,
    /// Fail the run when any upload fails.
    pub strict_uploads: bool,
}

/// Collaborators used by a release run.
pub struct ReleaseServices<'a> {
    /// Build pipeline collaborators.
    pub build: BuildServices<'a>,
    /// Publishes artefacts.
    pub uploader: &'a dyn ReleaseUploader,
}

/// Run the release pipeline.
///
/// # Errors
///
/// Returns an error if the build pipeline fails, the secrets file is missing
/// or malformed, or the manifest is missing. With `strict_uploads`, returns
/// [`ReleaseError::UploadsFailed`] once every artefact has been attempted
/// and at least one failed.
pub fn run_release(
    context: &ReleaseContext<'_>,
    services: &ReleaseServices<'_>,
    stderr: &mut dyn Write,
) -> Result<ReleaseReport> {
    let quiet = context.pipeline.quiet;

    report_stage(stderr, quiet, ReleaseStage::Build);
    let summary = run_build_pipeline(&context.pipeline, &services.build, stderr)?;
    debug!("built {} target(s)", summary.results.len());

    let secrets = load_secrets(context.secrets_path)?;
    report_stage(stderr, quiet, ReleaseStage::SecretsLoaded);

    let version = resolve_version(context.manifest_path)?;
    report_stage(stderr, quiet, ReleaseStage::VersionResolved);
    info!("releasing version {version}");

    let artifacts = release_artifacts(&summary.results);
    let total = artifacts.len();
    let mut uploads = Vec::with_capacity(total);

    for (index, artifact) in artifacts.into_iter().enumerate() {
        report_stage(
            stderr,
            quiet,
            ReleaseStage::Uploading {
                index: index + 1,
                total,
            },
        );

        let outcome = if artifact.path.is_file() {
            services.uploader.upload(&version, &artifact, &secrets)
        } else {
            warn!("artefact {} is missing; skipping upload", artifact.path);
            UploadOutcome::Failed {
                reason: format!("artefact not found: {}", artifact.path),
            }
        };
        uploads.push(ArtifactUpload { artifact, outcome });
    }
    report_stage(stderr, quiet, ReleaseStage::Done);

    let report = ReleaseReport { version, uploads };
    if !quiet {
        write_stderr_line(stderr, release_summary(&report));
    }

    let failed = report.failures();
    if context.strict_uploads && failed > 0 {
        return Err(ReleaseError::UploadsFailed { failed, total });
    }

    Ok(report)
}

fn report_stage(stderr: &mut dyn Write, quiet: bool, stage: ReleaseStage) {
    debug!("release stage: {stage}");
    if !quiet {
        write_stderr_line(stderr, format!("==> {stage}"));
    }
}
