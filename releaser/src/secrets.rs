//! Loading deployment secrets from a local dotenv-style file.
//!
//! The file holds one `KEY=VALUE` pair per line. Lines starting with `#` are
//! comments and blank lines are ignored. There is no quoting, escaping or
//! multi-line support. Parsed values are returned as a [`SecretSet`] and
//! passed explicitly to the uploader; the process environment is left
//! untouched.

use crate::error::{ReleaseError, Result};
use camino::Utf8Path;
use log::debug;
use secrecy::SecretString;
use std::collections::BTreeMap;
use std::fs;

/// Default secrets filename, relative to the project root.
pub const DEFAULT_SECRETS_FILE: &str = ".secret_env";

/// Named secrets loaded for a release run.
///
/// Values are held as [`SecretString`] so they are redacted from `Debug`
/// output.
#[derive(Debug, Default)]
pub struct SecretSet {
    entries: BTreeMap<String, SecretString>,
}

impl SecretSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a secret.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries
            .insert(name.into(), SecretString::from(value.into()));
    }

    /// Look up a secret by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SecretString> {
        self.entries.get(name)
    }

    /// Look up a secret that the caller cannot proceed without.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::MissingSecret`] if `name` is not set.
    pub fn require(&self, name: &str) -> Result<&SecretString> {
        self.get(name).ok_or_else(|| ReleaseError::MissingSecret {
            name: name.to_owned(),
        })
    }

    /// Names of every loaded secret, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of loaded secrets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no secrets are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Load secrets from the file at `path`.
///
/// # Errors
///
/// Returns [`ReleaseError::FileNotFound`] if the file does not exist, and
/// [`ReleaseError::InvalidSecretLine`] for a line that is not `KEY=VALUE`.
pub fn load_secrets(path: &Utf8Path) -> Result<SecretSet> {
    let contents =
        fs::read_to_string(path).map_err(|e| ReleaseError::from_read("secrets", path, e))?;

    let secrets = parse_secrets(&contents).map_err(|line| ReleaseError::InvalidSecretLine {
        path: path.to_owned(),
        line,
    })?;

    debug!(
        "loaded {} secret(s) from {path}: {}",
        secrets.len(),
        secrets.names().collect::<Vec<_>>().join(", ")
    );
    Ok(secrets)
}

/// Parse secrets file contents.
///
/// Returns the one-based number of the first malformed line on failure.
///
/// # Errors
///
/// Fails on a non-comment, non-blank line without `=` or with an empty key.
///
/// # Examples
///
/// ```
/// use meili_releaser::secrets::parse_secrets;
/// use secrecy::ExposeSecret;
///
/// let secrets = parse_secrets("# comment\nAPI_KEY=abc123\n").expect("valid file");
/// let value = secrets.get("API_KEY").expect("key present");
/// assert_eq!(value.expose_secret(), "abc123");
/// ```
pub fn parse_secrets(contents: &str) -> std::result::Result<SecretSet, usize> {
    let mut secrets = SecretSet::new();

    for (index, line) in contents.lines().enumerate() {
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }

        let (key, value) = line.split_once('=').ok_or(index + 1)?;
        let key = key.trim();
        if key.is_empty() {
            return Err(index + 1);
        }
        secrets.insert(key, value.trim());
    }

    Ok(secrets)
}
