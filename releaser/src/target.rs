//! Target catalogue for cross-compiled release builds.
//!
//! The catalogue is the single source of truth for which platforms are built,
//! where each build output lands, what it is called on the publishing share,
//! and which asset name it is uploaded under.

use crate::error::{ReleaseError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;

/// The target triples built for every release, in build order.
pub const TARGET_CATALOG: &[&str] = &[
    "x86_64-unknown-linux-gnu",
    "x86_64-pc-windows-gnu",
    "x86_64-apple-darwin",
];

/// Default name of the application binary.
pub const DEFAULT_BINARY_NAME: &str = "meili";

/// Operating system family of a target triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// GNU/Linux.
    Linux,
    /// Microsoft Windows.
    Windows,
    /// Apple macOS.
    MacOs,
}

impl Platform {
    /// Infer the platform from a target triple.
    ///
    /// Returns `None` when the triple names none of the supported families.
    ///
    /// # Examples
    ///
    /// ```
    /// use meili_releaser::target::Platform;
    ///
    /// assert_eq!(Platform::from_triple("x86_64-apple-darwin"), Some(Platform::MacOs));
    /// assert_eq!(Platform::from_triple("wasm32-unknown-unknown"), None);
    /// ```
    #[must_use]
    pub fn from_triple(triple: &str) -> Option<Self> {
        if triple.contains("windows") {
            Some(Self::Windows)
        } else if triple.contains("darwin") {
            Some(Self::MacOs)
        } else if triple.contains("linux") {
            Some(Self::Linux)
        } else {
            None
        }
    }

    /// Executable filename suffix, including the dot where one applies.
    #[must_use]
    pub const fn executable_suffix(self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            Self::Linux | Self::MacOs => "",
        }
    }

    /// Short tag used in published filenames.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "win",
            Self::MacOs => "macos",
        }
    }
}

/// A single entry of the build matrix.
///
/// # Examples
///
/// ```
/// use meili_releaser::target::TargetSpec;
///
/// let spec = TargetSpec::new("x86_64-pc-windows-gnu", "meili").expect("supported");
/// assert_eq!(spec.output_filename(), "meili.exe");
/// assert_eq!(spec.distribution_filename(), "meili_win.exe");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetSpec {
    triple: String,
    platform: Platform,
    binary_name: String,
}

impl TargetSpec {
    /// Create a target entry for `triple` producing `binary_name`.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::UnsupportedTarget`] when the triple does not
    /// name a supported platform family.
    pub fn new(triple: &str, binary_name: &str) -> Result<Self> {
        let platform =
            Platform::from_triple(triple).ok_or_else(|| ReleaseError::UnsupportedTarget {
                value: triple.to_owned(),
                expected: TARGET_CATALOG.join(", "),
            })?;

        Ok(Self {
            triple: triple.to_owned(),
            platform,
            binary_name: binary_name.to_owned(),
        })
    }

    /// The target triple.
    #[must_use]
    pub fn triple(&self) -> &str {
        &self.triple
    }

    /// The base binary name, without any suffix.
    #[must_use]
    pub fn binary_name(&self) -> &str {
        &self.binary_name
    }

    /// Filename cargo writes for this target.
    #[must_use]
    pub fn output_filename(&self) -> String {
        output_filename(&self.binary_name, self.platform)
    }

    /// Path of the release-mode build output below `target_dir`.
    #[must_use]
    pub fn output_path(&self, target_dir: &Utf8Path) -> Utf8PathBuf {
        target_dir
            .join(&self.triple)
            .join("release")
            .join(self.output_filename())
    }

    /// Filename used on the internal publishing share.
    #[must_use]
    pub fn distribution_filename(&self) -> String {
        format!(
            "{}_{}{}",
            self.binary_name,
            self.platform.tag(),
            self.platform.executable_suffix()
        )
    }

    /// Asset name used when uploading to a hosted release.
    #[must_use]
    pub fn asset_name(&self) -> String {
        format!(
            "{}-{}{}",
            self.binary_name,
            self.triple,
            self.platform.executable_suffix()
        )
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.triple)
    }
}

/// Derive the output filename for `binary_name` on `platform`.
///
/// # Examples
///
/// ```
/// use meili_releaser::target::{Platform, output_filename};
///
/// assert_eq!(output_filename("meili", Platform::Windows), "meili.exe");
/// assert_eq!(output_filename("meili", Platform::Linux), "meili");
/// ```
#[must_use]
pub fn output_filename(binary_name: &str, platform: Platform) -> String {
    format!("{binary_name}{}", platform.executable_suffix())
}

/// Build the ordered target catalogue for `binary_name`.
///
/// # Errors
///
/// Returns an error only if [`TARGET_CATALOG`] contains an unsupported triple.
pub fn catalog(binary_name: &str) -> Result<Vec<TargetSpec>> {
    TARGET_CATALOG
        .iter()
        .map(|triple| TargetSpec::new(triple, binary_name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::linux("x86_64-unknown-linux-gnu", "meili", "meili_linux")]
    #[case::windows("x86_64-pc-windows-gnu", "meili.exe", "meili_win.exe")]
    #[case::macos("x86_64-apple-darwin", "meili", "meili_macos")]
    fn filenames_for_catalog_targets(
        #[case] triple: &str,
        #[case] output: &str,
        #[case] distributed: &str,
    ) {
        let spec = TargetSpec::new(triple, DEFAULT_BINARY_NAME).expect("supported triple");
        assert_eq!(spec.output_filename(), output);
        assert_eq!(spec.distribution_filename(), distributed);
    }

    #[test]
    fn output_filename_is_deterministic() {
        for triple in TARGET_CATALOG {
            let first = TargetSpec::new(triple, "meili").expect("supported");
            let second = TargetSpec::new(triple, "meili").expect("supported");
            assert_eq!(first.output_filename(), second.output_filename());
        }
    }

    #[test]
    fn catalog_preserves_build_order() {
        let specs = catalog(DEFAULT_BINARY_NAME).expect("catalogue is valid");
        let triples: Vec<&str> = specs.iter().map(TargetSpec::triple).collect();
        assert_eq!(triples, TARGET_CATALOG);
    }

    #[test]
    fn output_path_follows_cargo_layout() {
        let spec = TargetSpec::new("x86_64-pc-windows-gnu", "meili").expect("supported");
        let path = spec.output_path(Utf8Path::new("/work/meili/target"));
        assert_eq!(
            path,
            Utf8PathBuf::from("/work/meili/target/x86_64-pc-windows-gnu/release/meili.exe")
        );
    }

    #[test]
    fn other_windows_triples_get_exe_suffix() {
        let spec = TargetSpec::new("aarch64-pc-windows-msvc", "meili").expect("windows family");
        assert_eq!(spec.output_filename(), "meili.exe");
    }

    #[test]
    fn asset_names_are_unique_per_target() {
        let specs = catalog("meili").expect("catalogue is valid");
        let mut names: Vec<String> = specs.iter().map(TargetSpec::asset_name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), TARGET_CATALOG.len());
    }

    #[test]
    fn rejects_unknown_platform() {
        let err = TargetSpec::new("wasm32-unknown-unknown", "meili")
            .expect_err("wasm is not a supported platform");
        assert!(matches!(err, ReleaseError::UnsupportedTarget { .. }));
    }
}
