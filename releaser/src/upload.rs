//! Uploading release artefacts to a hosting service.
//!
//! [`ReleaseUploader`] is the seam the release orchestrator calls once per
//! artefact. [`GithubReleaseUploader`] implements it against the GitHub
//! releases API using `ureq`.

use crate::error::ReleaseError;
use crate::release::ReleaseArtifact;
use crate::secrets::SecretSet;
use crate::version::ReleaseVersion;
use camino::Utf8PathBuf;
use log::{debug, warn};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

/// Secret holding the GitHub API token.
pub const TOKEN_SECRET: &str = "GITHUB_TOKEN";

/// Secret naming the `owner/name` repository when none is configured.
pub const REPOSITORY_SECRET: &str = "GITHUB_REPOSITORY";

const API_BASE: &str = "https://api.github.com";
const UPLOADS_BASE: &str = "https://uploads.github.com";

/// Network timeout for a single API call or asset upload.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Result of uploading one artefact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The artefact was uploaded.
    Uploaded {
        /// Download URL reported by the hosting service.
        url: String,
    },
    /// The release already carries an asset with this name.
    Duplicate,
    /// The upload failed; remaining artefacts are still attempted.
    Failed {
        /// Human-readable failure description.
        reason: String,
    },
}

impl UploadOutcome {
    /// Returns true for [`UploadOutcome::Failed`].
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Uploads a built artefact to a hosted release.
#[cfg_attr(test, mockall::automock)]
pub trait ReleaseUploader {
    /// Upload `artifact` to the release for `version`.
    ///
    /// Implementations never fail the run; problems are reported as
    /// [`UploadOutcome::Failed`].
    fn upload(
        &self,
        version: &ReleaseVersion,
        artifact: &ReleaseArtifact,
        secrets: &SecretSet,
    ) -> UploadOutcome;
}

/// Errors arising inside the GitHub uploader.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// A secret the upload cannot proceed without is not set.
    #[error(transparent)]
    Secret(#[from] ReleaseError),

    /// No repository was configured and the repository secret is not set.
    #[error("no release repository configured and secret {REPOSITORY_SECRET} is not set")]
    MissingRepository,

    /// The artefact could not be read from disk.
    #[error("cannot read artefact {path}: {reason}")]
    ArtifactUnreadable {
        /// Local artefact path.
        path: Utf8PathBuf,
        /// Description of the I/O error.
        reason: String,
    },

    /// The HTTP request failed.
    #[error("request to {url} failed: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The service answered with a body that could not be decoded.
    #[error("unexpected response from {url}: {reason}")]
    InvalidResponse {
        /// The URL that was requested.
        url: String,
        /// Decoding error.
        reason: String,
    },
}

#[derive(Debug, Serialize)]
struct CreateRelease<'a> {
    tag_name: &'a str,
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct AssetResponse {
    browser_download_url: String,
}

/// Uploads artefacts to GitHub releases.
///
/// The release tagged `v<version>` is looked up first and created when it
/// does not exist yet. The repository comes from configuration or, failing
/// that, from the [`REPOSITORY_SECRET`] secret.
#[derive(Debug, Clone, Default)]
pub struct GithubReleaseUploader {
    repo: Option<String>,
}

impl GithubReleaseUploader {
    /// Create an uploader, optionally pinned to an `owner/name` repository.
    #[must_use]
    pub fn new(repo: Option<String>) -> Self {
        Self { repo }
    }

    /// Resolve the `owner/name` repository for this run.
    fn repository<'s>(&'s self, secrets: &'s SecretSet) -> Result<&'s str, UploadError> {
        if let Some(repo) = self.repo.as_deref() {
            return Ok(repo);
        }
        secrets
            .require(REPOSITORY_SECRET)
            .map(|repo| repo.expose_secret())
            .map_err(|_| UploadError::MissingRepository)
    }

    fn try_upload(
        &self,
        version: &ReleaseVersion,
        artifact: &ReleaseArtifact,
        secrets: &SecretSet,
    ) -> Result<UploadOutcome, UploadError> {
        let token = secrets.require(TOKEN_SECRET)?.expose_secret();

        let body = std::fs::read(&artifact.path).map_err(|e| UploadError::ArtifactUnreadable {
            path: artifact.path.clone(),
            reason: e.to_string(),
        })?;

        let repo = self.repository(secrets)?;
        let release_id = ensure_release(repo, &version.tag(), token)?;
        let url = asset_upload_url(repo, release_id, &artifact.asset_name());
        debug!("uploading {} ({} bytes) to {url}", artifact.path, body.len());

        let response = http_agent()
            .post(&url)
            .header("Authorization", format!("Bearer {token}"))
            .header("Accept", "application/vnd.github+json")
            .header("Content-Type", "application/octet-stream")
            .send(body);

        match response {
            Ok(response) => {
                let asset: AssetResponse = read_json(&url, response)?;
                Ok(UploadOutcome::Uploaded {
                    url: asset.browser_download_url,
                })
            }
            Err(ureq::Error::StatusCode(422)) => Ok(UploadOutcome::Duplicate),
            Err(err) => Err(http_error(&url, &err)),
        }
    }
}

impl ReleaseUploader for GithubReleaseUploader {
    fn upload(
        &self,
        version: &ReleaseVersion,
        artifact: &ReleaseArtifact,
        secrets: &SecretSet,
    ) -> UploadOutcome {
        self.try_upload(version, artifact, secrets)
            .unwrap_or_else(|err| {
                warn!("upload of {} failed: {err}", artifact.path);
                UploadOutcome::Failed {
                    reason: err.to_string(),
                }
            })
    }
}

/// API URL of the release tagged `tag` in `repo`.
///
/// # Examples
///
/// ```
/// use meili_releaser::upload::release_by_tag_url;
///
/// assert_eq!(
///     release_by_tag_url("owner/meili", "v1.0.0"),
///     "https://api.github.com/repos/owner/meili/releases/tags/v1.0.0"
/// );
/// ```
#[must_use]
pub fn release_by_tag_url(repo: &str, tag: &str) -> String {
    format!("{API_BASE}/repos/{repo}/releases/tags/{tag}")
}

/// API URL for creating releases in `repo`.
#[must_use]
pub fn releases_url(repo: &str) -> String {
    format!("{API_BASE}/repos/{repo}/releases")
}

/// Upload URL for an asset named `name` on release `release_id`.
#[must_use]
pub fn asset_upload_url(repo: &str, release_id: u64, name: &str) -> String {
    format!("{UPLOADS_BASE}/repos/{repo}/releases/{release_id}/assets?name={name}")
}

/// Return the id of the release tagged `tag`, creating it if missing.
fn ensure_release(repo: &str, tag: &str, token: &str) -> Result<u64, UploadError> {
    let url = release_by_tag_url(repo, tag);
    let lookup = http_agent()
        .get(&url)
        .header("Authorization", format!("Bearer {token}"))
        .header("Accept", "application/vnd.github+json")
        .call();

    match lookup {
        Ok(response) => read_json::<ReleaseResponse>(&url, response).map(|r| r.id),
        Err(ureq::Error::StatusCode(404)) => create_release(repo, tag, token),
        Err(err) => Err(http_error(&url, &err)),
    }
}

fn create_release(repo: &str, tag: &str, token: &str) -> Result<u64, UploadError> {
    let url = releases_url(repo);
    let payload = serde_json::to_string(&CreateRelease {
        tag_name: tag,
        name: tag,
    })
    .map_err(|e| UploadError::InvalidResponse {
        url: url.clone(),
        reason: e.to_string(),
    })?;

    debug!("creating release {tag} in {repo}");
    let response = http_agent()
        .post(&url)
        .header("Authorization", format!("Bearer {token}"))
        .header("Accept", "application/vnd.github+json")
        .header("Content-Type", "application/json")
        .send(payload)
        .map_err(|e| http_error(&url, &e))?;

    read_json::<ReleaseResponse>(&url, response).map(|r| r.id)
}

/// Shared `ureq` agent with request timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(UPLOAD_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

fn read_json<T: serde::de::DeserializeOwned>(
    url: &str,
    response: ureq::http::Response<ureq::Body>,
) -> Result<T, UploadError> {
    let text = response
        .into_body()
        .read_to_string()
        .map_err(|e| http_error(url, &e))?;
    serde_json::from_str(&text).map_err(|e| UploadError::InvalidResponse {
        url: url.to_owned(),
        reason: e.to_string(),
    })
}

/// Map a ureq error to an [`UploadError`].
fn http_error(url: &str, err: &ureq::Error) -> UploadError {
    UploadError::Http {
        url: url.to_owned(),
        reason: err.to_string(),
    }
}
