//! Project root discovery.
//!
//! The release tool operates on the nearest ancestor directory whose
//! `Cargo.toml` declares a `[package]` table. Workspace-only manifests are
//! skipped so that running from inside a member crate still finds it.
//! Where cargo writes build outputs is a separate question, answered by
//! cargo itself through [`resolve_target_dir`].

use crate::error::{ReleaseError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use cargo_metadata::MetadataCommand;
use log::debug;
use std::fs;

/// Search `start` and its ancestors for a package manifest.
///
/// # Errors
///
/// Returns [`ReleaseError::ProjectNotFound`] if no ancestor holds a
/// `Cargo.toml` with a `[package]` table.
pub fn find_project_root(start: &Utf8Path) -> Result<Utf8PathBuf> {
    for dir in start.ancestors() {
        let manifest = dir.join("Cargo.toml");
        if !manifest.is_file() {
            continue;
        }

        if declares_package(&manifest)? {
            debug!("project root resolved to {dir}");
            return Ok(dir.to_owned());
        }
        debug!("{manifest} has no [package] table; continuing upwards");
    }

    Err(ReleaseError::ProjectNotFound {
        reason: format!("no Cargo.toml with a [package] table above {start}"),
    })
}

/// Resolve the project root from the current working directory.
///
/// # Errors
///
/// Returns an error if the working directory is not valid UTF-8 or no
/// package manifest is found above it.
pub fn current_project_root() -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir()?;
    let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| ReleaseError::ProjectNotFound {
        reason: format!("working directory is not valid UTF-8: {e}"),
    })?;
    find_project_root(&cwd)
}

/// Ask cargo for the target directory used when building `project_root`.
///
/// Cargo places a member crate's outputs under its workspace root and
/// honours `CARGO_TARGET_DIR` and `build.target-dir`, so the answer is not
/// always `<project_root>/target`.
///
/// # Errors
///
/// Returns [`ReleaseError::MetadataFailed`] if `cargo metadata` cannot be
/// run or rejects the manifest.
pub fn resolve_target_dir(project_root: &Utf8Path) -> Result<Utf8PathBuf> {
    let manifest = project_root.join("Cargo.toml");
    let metadata = MetadataCommand::new()
        .manifest_path(manifest.as_std_path())
        .current_dir(project_root.as_std_path())
        .no_deps()
        .exec()
        .map_err(|error| ReleaseError::MetadataFailed {
            manifest: manifest.clone(),
            message: error.to_string(),
        })?;
    debug!("cargo target directory is {}", metadata.target_directory);
    Ok(metadata.target_directory)
}

fn declares_package(manifest: &Utf8Path) -> Result<bool> {
    let contents =
        fs::read_to_string(manifest).map_err(|e| ReleaseError::from_read("manifest", manifest, e))?;
    let table: toml::Table = toml::from_str(&contents).map_err(|e| ReleaseError::ProjectNotFound {
        reason: format!("cannot parse {manifest}: {e}"),
    })?;
    Ok(table.get("package").is_some_and(toml::Value::is_table))
}
