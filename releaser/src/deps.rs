//! External command execution and the pre-flight dependency check.
//!
//! [`CommandExecutor`] is the seam through which every build-tool invocation
//! passes, so the build runner can be exercised without spawning cargo.
//! [`DependencyCheck`] is the hook that runs once before any target is built.

use crate::error::{ReleaseError, Result};
use log::debug;
use std::process::{Command, Output};

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs a command with arguments, blocking until it exits, and returns
    /// the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use meili_releaser::deps::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("cargo", &["--version"])?;
    /// assert!(output.status.success());
    /// # Ok::<(), meili_releaser::error::ReleaseError>(())
    /// ```
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        debug!("running {cmd} {}", args.join(" "));
        Command::new(cmd)
            .args(args)
            .output()
            .map_err(ReleaseError::from)
    }
}

/// Outcome of the pre-flight dependency check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyOutcome {
    /// Everything the build needs is available.
    Ready,
    /// A required tool is unavailable.
    Missing {
        /// Name of the missing tool.
        tool: String,
        /// Suggested remedy shown to the user.
        hint: String,
    },
}

impl DependencyOutcome {
    /// Convert the outcome into a result, failing on [`Self::Missing`].
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::DependencyMissing`] for a missing tool.
    ///
    /// # Examples
    ///
    /// ```
    /// use meili_releaser::deps::DependencyOutcome;
    ///
    /// assert!(DependencyOutcome::Ready.into_result().is_ok());
    ///
    /// let missing = DependencyOutcome::Missing {
    ///     tool: "x86_64-w64-mingw32-gcc".to_owned(),
    ///     hint: "install mingw-w64".to_owned(),
    /// };
    /// assert!(missing.into_result().is_err());
    /// ```
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Ready => Ok(()),
            Self::Missing { tool, hint } => Err(ReleaseError::DependencyMissing { tool, hint }),
        }
    }
}

/// Pre-flight verification of the build environment.
pub trait DependencyCheck {
    /// Inspect the environment and report whether the build can proceed.
    fn check(&self, executor: &dyn CommandExecutor) -> DependencyOutcome;
}

/// Dependency check with no configured tool checks; always reports
/// [`DependencyOutcome::Ready`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderDependencyCheck;

impl DependencyCheck for PlaceholderDependencyCheck {
    fn check(&self, _executor: &dyn CommandExecutor) -> DependencyOutcome {
        debug!("no dependency checks configured; assuming the build environment is ready");
        DependencyOutcome::Ready
    }
}

/// Run `check` once and convert its outcome into a result.
///
/// # Errors
///
/// Returns [`ReleaseError::DependencyMissing`] when the check reports a
/// missing tool.
pub fn check_dependencies(
    check: &dyn DependencyCheck,
    executor: &dyn CommandExecutor,
) -> Result<()> {
    check.check(executor).into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StubExecutor;

    struct MissingLinker;

    impl DependencyCheck for MissingLinker {
        fn check(&self, _executor: &dyn CommandExecutor) -> DependencyOutcome {
            DependencyOutcome::Missing {
                tool: "x86_64-w64-mingw32-gcc".to_owned(),
                hint: "install the mingw-w64 cross toolchain".to_owned(),
            }
        }
    }

    #[test]
    fn placeholder_check_runs_no_commands() {
        let executor = StubExecutor::new(Vec::new());

        let outcome = PlaceholderDependencyCheck.check(&executor);

        assert_eq!(outcome, DependencyOutcome::Ready);
        assert!(executor.invocations().is_empty());
    }

    #[test]
    fn check_dependencies_succeeds_for_placeholder() {
        let executor = StubExecutor::new(Vec::new());
        assert!(check_dependencies(&PlaceholderDependencyCheck, &executor).is_ok());
    }

    #[test]
    fn check_dependencies_reports_missing_tool() {
        let executor = StubExecutor::new(Vec::new());

        let err = check_dependencies(&MissingLinker, &executor)
            .expect_err("missing linker should fail the check");

        match err {
            ReleaseError::DependencyMissing { tool, hint } => {
                assert_eq!(tool, "x86_64-w64-mingw32-gcc");
                assert!(hint.contains("mingw-w64"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
