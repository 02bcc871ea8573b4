//! Release version extraction from the project manifest.
//!
//! The manifest is scanned line by line for the first `version = "X.Y.Z"`
//! declaration. A manifest without one yields the `0.0.0` sentinel so local
//! test releases still work; a missing manifest is an error.

use crate::error::{ReleaseError, Result};
use camino::Utf8Path;
use log::{debug, warn};
use std::fmt;
use std::fs;

/// Version used when the manifest declares none.
pub const SENTINEL_VERSION: &str = "0.0.0";

/// A version string read from the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseVersion(String);

impl ReleaseVersion {
    /// Wrap a version string.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// The `0.0.0` sentinel.
    #[must_use]
    pub fn sentinel() -> Self {
        Self::new(SENTINEL_VERSION)
    }

    /// Returns true for the `0.0.0` sentinel.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.0 == SENTINEL_VERSION
    }

    /// The version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Git tag naming the release, e.g. `v1.2.3`.
    ///
    /// # Examples
    ///
    /// ```
    /// use meili_releaser::version::ReleaseVersion;
    ///
    /// assert_eq!(ReleaseVersion::new("1.2.3").tag(), "v1.2.3");
    /// ```
    #[must_use]
    pub fn tag(&self) -> String {
        format!("v{}", self.0)
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read the release version from the manifest at `path`.
///
/// # Errors
///
/// Returns [`ReleaseError::FileNotFound`] if the manifest does not exist, or
/// an I/O error if it cannot be read.
pub fn resolve_version(path: &Utf8Path) -> Result<ReleaseVersion> {
    let contents =
        fs::read_to_string(path).map_err(|e| ReleaseError::from_read("manifest", path, e))?;

    let version = parse_version(&contents);
    if version.is_sentinel() {
        warn!("no version declared in {path}; releasing as {version}");
    } else {
        debug!("resolved version {version} from {path}");
    }
    Ok(version)
}

/// Extract the first `version` declaration from manifest text.
///
/// # Examples
///
/// ```
/// use meili_releaser::version::parse_version;
///
/// let manifest = "[package]\nname = \"meili\"\nversion = \"2.3.1\"\n";
/// assert_eq!(parse_version(manifest).as_str(), "2.3.1");
/// assert!(parse_version("[package]\nname = \"meili\"\n").is_sentinel());
/// ```
#[must_use]
pub fn parse_version(contents: &str) -> ReleaseVersion {
    contents
        .lines()
        .find_map(version_value)
        .map_or_else(ReleaseVersion::sentinel, ReleaseVersion::new)
}

/// Return the value of a `version = ...` line, if this is one.
///
/// A quoted value ends at its closing quote; an unquoted one at the first
/// `#`. An unterminated quote does not count as a declaration.
fn version_value(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("version")?;
    let value = rest.trim_start().strip_prefix('=')?.trim_start();
    let value = match value.chars().next() {
        Some(quote @ ('"' | '\'')) => value.strip_prefix(quote)?.split_once(quote)?.0,
        _ => value.split_once('#').map_or(value, |(unquoted, _)| unquoted),
    };
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}
