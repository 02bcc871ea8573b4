//! Error types for the meili release tool.
//!
//! Every fatal condition in the build and release pipelines is a variant of
//! [`ReleaseError`]. Per-artefact upload failures are reported through
//! [`crate::upload::UploadOutcome`] instead and only become fatal, as
//! [`ReleaseError::UploadsFailed`], when strict uploads are requested.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that halt a build or release run.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// The build tool exited unsuccessfully for a target.
    #[error("cargo build failed for {target} ({status}): {stderr}")]
    ToolInvocation {
        /// Target triple whose build failed.
        target: String,
        /// Exit status reported by the build tool.
        status: String,
        /// Trimmed standard error captured from the build tool.
        stderr: String,
    },

    /// A required input file does not exist.
    #[error("{kind} file not found at {path}")]
    FileNotFound {
        /// Which input was missing (`manifest`, `secrets`, ...).
        kind: &'static str,
        /// Path where the file was expected.
        path: Utf8PathBuf,
    },

    /// Copying a build output to the publishing directory failed.
    #[error("failed to copy {source_path} to {dest}: {reason}")]
    CopyFailed {
        /// Build output being copied.
        source_path: Utf8PathBuf,
        /// Destination inside the publishing directory.
        dest: Utf8PathBuf,
        /// Description of the underlying I/O error.
        reason: String,
    },

    /// The pre-flight dependency check reported a missing tool.
    #[error("required tool {tool} is missing; {hint}")]
    DependencyMissing {
        /// Name of the missing tool.
        tool: String,
        /// Suggested remedy.
        hint: String,
    },

    /// A target triple outside the supported catalogue was requested.
    #[error("unsupported target triple {value}; expected one of: {expected}")]
    UnsupportedTarget {
        /// The rejected triple.
        value: String,
        /// Comma-separated list of supported triples.
        expected: String,
    },

    /// A line in the secrets file is not a `KEY=VALUE` pair.
    #[error("invalid secrets entry at {path}:{line}; expected KEY=VALUE")]
    InvalidSecretLine {
        /// Secrets file being parsed.
        path: Utf8PathBuf,
        /// One-based line number of the offending entry.
        line: usize,
    },

    /// A secret needed by the release was not present in the secrets file.
    #[error("secret {name} is not set in the secrets file")]
    MissingSecret {
        /// Name of the missing secret.
        name: String,
    },

    /// The project root could not be located.
    #[error("project not found: {reason}")]
    ProjectNotFound {
        /// Description of why discovery failed.
        reason: String,
    },

    /// Cargo could not report the project's metadata.
    #[error("failed to retrieve Cargo metadata for {manifest}: {message}")]
    MetadataFailed {
        /// Manifest cargo was asked about.
        manifest: Utf8PathBuf,
        /// Error emitted while loading metadata.
        message: String,
    },

    /// Strict uploads were requested and at least one artefact failed.
    #[error("{failed} of {total} release artefact upload(s) failed")]
    UploadsFailed {
        /// Number of failed uploads.
        failed: usize,
        /// Number of artefacts attempted.
        total: usize,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

impl ReleaseError {
    /// Map an I/O error from opening `path` into [`ReleaseError::FileNotFound`]
    /// when the file is absent, or [`ReleaseError::Io`] otherwise.
    pub(crate) fn from_read(kind: &'static str, path: &camino::Utf8Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound {
                kind,
                path: path.to_owned(),
            }
        } else {
            Self::Io(err)
        }
    }
}

/// Result type alias using [`ReleaseError`].
pub type Result<T> = std::result::Result<T, ReleaseError>;
