//! Distribution host detection.
//!
//! Whether this machine publishes builds to the internal share is decided
//! once at startup and handed to the distributor as a [`HostRole`].

use log::debug;

/// Hostname fragment that identifies the distribution host.
pub const DISTRIBUTION_HOST_MARKER: &str = "azure-angel";

/// Whether the executing machine publishes build outputs internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRole {
    /// Copy build outputs to the publishing directory after a build.
    Distribution,
    /// Leave build outputs where cargo put them.
    Ordinary,
}

impl HostRole {
    /// Returns true for [`HostRole::Distribution`].
    #[must_use]
    pub const fn is_distribution(self) -> bool {
        matches!(self, Self::Distribution)
    }
}

impl From<bool> for HostRole {
    fn from(is_distribution: bool) -> Self {
        if is_distribution {
            Self::Distribution
        } else {
            Self::Ordinary
        }
    }
}

/// Resolve the host role from an explicit setting or, failing that, the
/// machine's hostname.
///
/// # Examples
///
/// ```
/// use meili_releaser::host::{HostRole, resolve_host_role};
///
/// assert_eq!(resolve_host_role(Some(false), Some("azure-angel")), HostRole::Ordinary);
/// assert_eq!(resolve_host_role(None, Some("azure-angel.lan")), HostRole::Distribution);
/// assert_eq!(resolve_host_role(None, None), HostRole::Ordinary);
/// ```
#[must_use]
pub fn resolve_host_role(explicit: Option<bool>, hostname: Option<&str>) -> HostRole {
    if let Some(flag) = explicit {
        return HostRole::from(flag);
    }

    let role = HostRole::from(hostname.is_some_and(|name| name.contains(DISTRIBUTION_HOST_MARKER)));
    debug!("host {hostname:?} resolved as {role:?}");
    role
}

/// Resolve the host role, reading the hostname from the operating system
/// only when no explicit setting is given.
#[must_use]
pub fn detect_host_role(explicit: Option<bool>) -> HostRole {
    if explicit.is_some() {
        return resolve_host_role(explicit, None);
    }

    let hostname = hostname::get()
        .ok()
        .map(|name| name.to_string_lossy().into_owned());
    resolve_host_role(None, hostname.as_deref())
}
