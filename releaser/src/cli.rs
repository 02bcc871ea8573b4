//! CLI argument definitions for the meili release tool.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::distributor::DEFAULT_PUBLISH_DIR;
use crate::host::{HostRole, detect_host_role};
use crate::secrets::DEFAULT_SECRETS_FILE;
use crate::target::DEFAULT_BINARY_NAME;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};

/// Build and release meili for every supported platform.
#[derive(Parser, Debug)]
#[command(name = "meili-releaser")]
#[command(version, about)]
#[command(long_about = concat!(
    "Build and release meili for every supported platform.\n\n",
    "The build command compiles a release binary for each target triple in ",
    "turn and, on the distribution host, copies the results to a shared ",
    "directory for testing.\n\n",
    "The release command runs the build, loads upload credentials from the ",
    "secrets file, reads the version from the manifest, and uploads every ",
    "binary to the GitHub release for that version.",
))]
#[command(after_help = concat!(
    "TARGETS:\n",
    "  x86_64-unknown-linux-gnu\n",
    "  x86_64-pc-windows-gnu\n",
    "  x86_64-apple-darwin\n\n",
    "EXAMPLES:\n",
    "  Build every target:\n",
    "    $ meili-releaser build\n\n",
    "  Build and publish to the testing share:\n",
    "    $ meili-releaser build --distribution-host true\n\n",
    "  Publish a release, failing if any upload fails:\n",
    "    $ meili-releaser release --repo owner/meili --strict-uploads",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build every target and publish on the distribution host.
    Build(BuildArgs),

    /// Build every target and upload the binaries to a release.
    Release(ReleaseArgs),
}

/// Arguments shared by every command.
#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    /// Project directory [default: nearest ancestor with a package manifest].
    #[arg(long, value_name = "DIR")]
    pub project_dir: Option<Utf8PathBuf>,

    /// Name of the binary produced by the project.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_BINARY_NAME)]
    pub binary_name: String,

    /// Increase cargo output verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,

    /// Treat this machine as the distribution host [default: detect from hostname].
    #[arg(
        long,
        value_name = "BOOL",
        env = "MEILI_DISTRIBUTION_HOST",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub distribution_host: Option<bool>,

    /// Directory the distribution host publishes builds into.
    #[arg(
        long,
        value_name = "DIR",
        env = "MEILI_PUBLISH_DIR",
        default_value = DEFAULT_PUBLISH_DIR
    )]
    pub publish_dir: Utf8PathBuf,
}

/// Arguments for the release command.
#[derive(Parser, Debug, Clone)]
pub struct ReleaseArgs {
    /// Shared build arguments.
    #[command(flatten)]
    pub build: BuildArgs,

    /// Secrets file, relative to the project directory.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_SECRETS_FILE)]
    pub secrets_file: Utf8PathBuf,

    /// Manifest holding the release version, relative to the project directory.
    #[arg(long, value_name = "PATH", default_value = "Cargo.toml")]
    pub manifest: Utf8PathBuf,

    /// GitHub repository as OWNER/NAME [default: GITHUB_REPOSITORY secret].
    #[arg(long, value_name = "OWNER/NAME", env = "MEILI_RELEASE_REPO")]
    pub repo: Option<String>,

    /// Exit with an error if any upload fails.
    #[arg(long)]
    pub strict_uploads: bool,
}

impl BuildArgs {
    /// Resolve whether this machine publishes builds.
    ///
    /// An explicit `--distribution-host` value wins; otherwise the hostname
    /// is inspected.
    #[must_use]
    pub fn host_role(&self) -> HostRole {
        detect_host_role(self.distribution_host)
    }
}

impl ReleaseArgs {
    /// Secrets file resolved against `project_root`.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use meili_releaser::cli::ReleaseArgs;
    ///
    /// let args = ReleaseArgs::default();
    /// assert_eq!(
    ///     args.secrets_path(Utf8Path::new("/work/meili")),
    ///     "/work/meili/.secret_env"
    /// );
    /// ```
    #[must_use]
    pub fn secrets_path(&self, project_root: &Utf8Path) -> Utf8PathBuf {
        project_root.join(&self.secrets_file)
    }

    /// Manifest path resolved against `project_root`.
    #[must_use]
    pub fn manifest_path(&self, project_root: &Utf8Path) -> Utf8PathBuf {
        project_root.join(&self.manifest)
    }
}

impl Default for BuildArgs {
    /// Creates a `BuildArgs` instance matching the command-line defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use meili_releaser::cli::BuildArgs;
    ///
    /// let args = BuildArgs::default();
    /// assert_eq!(args.binary_name, "meili");
    /// assert!(args.distribution_host.is_none());
    /// ```
    fn default() -> Self {
        Self {
            project_dir: None,
            binary_name: DEFAULT_BINARY_NAME.to_owned(),
            verbosity: 0,
            quiet: false,
            distribution_host: None,
            publish_dir: Utf8PathBuf::from(DEFAULT_PUBLISH_DIR),
        }
    }
}

impl Default for ReleaseArgs {
    fn default() -> Self {
        Self {
            build: BuildArgs::default(),
            secrets_file: Utf8PathBuf::from(DEFAULT_SECRETS_FILE),
            manifest: Utf8PathBuf::from("Cargo.toml"),
            repo: None,
            strict_uploads: false,
        }
    }
}

impl Cli {
    /// Returns the arguments shared by every command.
    #[must_use]
    pub fn build_args(&self) -> &BuildArgs {
        match &self.command {
            Command::Build(args) => args,
            Command::Release(args) => &args.build,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
