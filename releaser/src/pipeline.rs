//! Build pipeline orchestration.
//!
//! A build run checks dependencies once, builds every catalogue target in
//! order, and then publishes the outputs when running on the distribution
//! host.

use crate::builder::{BuildConfig, BuildResult, Builder};
use crate::deps::{CommandExecutor, DependencyCheck, check_dependencies};
use crate::distributor::{DistributionOutcome, Distributor};
use crate::error::Result;
use crate::host::HostRole;
use crate::output::{distribution_message, write_stderr_line};
use crate::target::{TargetSpec, catalog};
use camino::Utf8Path;
use std::io::Write;

/// Context for a build pipeline run.
pub struct PipelineContext<'a> {
    /// Project root directory.
    pub project_root: &'a Utf8Path,
    /// Directory cargo writes build outputs to.
    pub target_dir: &'a Utf8Path,
    /// Name of the binary being built.
    pub binary_name: &'a str,
    /// Cargo verbosity level.
    pub verbosity: u8,
    /// Whether this machine publishes builds internally.
    pub host_role: HostRole,
    /// Publishing directory used on the distribution host.
    pub publish_dir: &'a Utf8Path,
    /// Suppress progress output.
    pub quiet: bool,
}

impl PipelineContext<'_> {
    /// The ordered target catalogue for this run.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalogue holds an unsupported triple.
    pub fn targets(&self) -> Result<Vec<TargetSpec>> {
        catalog(self.binary_name)
    }

    fn build_config(&self) -> BuildConfig {
        BuildConfig {
            project_root: self.project_root.to_owned(),
            target_dir: self.target_dir.to_owned(),
            verbosity: self.verbosity,
        }
    }
}

/// Collaborators used by the build pipeline.
pub struct BuildServices<'a> {
    /// Runs cargo.
    pub executor: &'a dyn CommandExecutor,
    /// Pre-flight environment check.
    pub dependency_check: &'a dyn DependencyCheck,
}

/// What a successful build pipeline run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    /// One entry per target, in build order.
    pub results: Vec<BuildResult>,
    /// What the distribution step did.
    pub distribution: DistributionOutcome,
}

/// Run the build pipeline.
///
/// # Errors
///
/// Returns an error if the dependency check fails, any target fails to
/// build, or publishing fails on the distribution host.
pub fn run_build_pipeline(
    context: &PipelineContext<'_>,
    services: &BuildServices<'_>,
    stderr: &mut dyn Write,
) -> Result<BuildSummary> {
    check_dependencies(services.dependency_check, services.executor)?;

    let targets = context.targets()?;
    let results = perform_build(context, services.executor, &targets, stderr)?;

    let distributor = Distributor::new(context.publish_dir.to_owned());
    let distribution = distributor.distribute(context.host_role, &results)?;

    if !context.quiet
        && let Some(message) = distribution_message(&distribution)
    {
        write_stderr_line(stderr, message);
    }

    Ok(BuildSummary {
        results,
        distribution,
    })
}

/// Builds every target, printing progress unless quiet.
///
/// # Errors
///
/// Returns the first build failure.
pub fn perform_build(
    context: &PipelineContext<'_>,
    executor: &dyn CommandExecutor,
    targets: &[TargetSpec],
    stderr: &mut dyn Write,
) -> Result<Vec<BuildResult>> {
    if !context.quiet {
        write_stderr_line(
            stderr,
            format!(
                "Building {} for {} target(s)...",
                context.binary_name,
                targets.len()
            ),
        );
        for target in targets {
            write_stderr_line(stderr, format!("  - {target}"));
        }
    }

    let results = Builder::new(context.build_config(), executor).build_all(targets)?;

    if !context.quiet {
        write_stderr_line(stderr, format!("Built {} target(s).", results.len()));
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::DependencyOutcome;
    use crate::error::ReleaseError;
    use crate::test_utils::{StubExecutor, expect_cargo_build, success_output};
    use rstest::rstest;
    use std::cell::Cell;

    struct CountingCheck {
        calls: Cell<usize>,
        outcome: DependencyOutcome,
    }

    impl CountingCheck {
        fn new(outcome: DependencyOutcome) -> Self {
            Self {
                calls: Cell::new(0),
                outcome,
            }
        }
    }

    impl DependencyCheck for CountingCheck {
        fn check(&self, _executor: &dyn CommandExecutor) -> DependencyOutcome {
            self.calls.set(self.calls.get() + 1);
            self.outcome.clone()
        }
    }

    fn context(quiet: bool) -> PipelineContext<'static> {
        PipelineContext {
            project_root: Utf8Path::new("/work/meili"),
            target_dir: Utf8Path::new("/work/target"),
            binary_name: "meili",
            verbosity: 0,
            host_role: HostRole::Ordinary,
            publish_dir: Utf8Path::new("/j/public"),
            quiet,
        }
    }

    fn succeeding_builds() -> StubExecutor {
        let calls = catalog("meili")
            .expect("catalogue is valid")
            .iter()
            .map(|target| {
                expect_cargo_build(target.triple(), "/work/meili/Cargo.toml", Ok(success_output()))
            })
            .collect();
        StubExecutor::new(calls)
    }

    #[test]
    fn dependency_check_runs_once_before_builds() {
        let check = CountingCheck::new(DependencyOutcome::Ready);
        let executor = succeeding_builds();
        let services = BuildServices {
            executor: &executor,
            dependency_check: &check,
        };

        let summary = run_build_pipeline(&context(true), &services, &mut Vec::new())
            .expect("pipeline succeeds");

        assert_eq!(check.calls.get(), 1);
        executor.assert_finished();
        assert_eq!(summary.results.len(), 3);
        assert_eq!(summary.distribution, DistributionOutcome::Skipped);
    }

    #[test]
    fn missing_dependency_prevents_any_build() {
        let check = CountingCheck::new(DependencyOutcome::Missing {
            tool: "cargo".to_owned(),
            hint: "install rustup".to_owned(),
        });
        let executor = StubExecutor::new(Vec::new());
        let services = BuildServices {
            executor: &executor,
            dependency_check: &check,
        };

        let err = run_build_pipeline(&context(true), &services, &mut Vec::new())
            .expect_err("missing dependency is fatal");

        assert!(matches!(err, ReleaseError::DependencyMissing { .. }));
        assert!(executor.invocations().is_empty());
    }

    #[rstest]
    #[case::quiet_mode(true)]
    #[case::progress_mode(false)]
    fn perform_build_respects_quiet_flag(#[case] quiet: bool) {
        let executor = succeeding_builds();
        let context = context(quiet);
        let targets = context.targets().expect("catalogue is valid");
        let mut stderr = Vec::new();

        perform_build(&context, &executor, &targets, &mut stderr).expect("builds succeed");

        let output = String::from_utf8_lossy(&stderr);
        if quiet {
            assert!(output.is_empty(), "expected no output in quiet mode");
        } else {
            assert!(output.contains("Building meili for 3 target(s)"));
            assert!(output.contains("x86_64-apple-darwin"));
        }
    }

    #[test]
    fn outputs_are_read_from_the_resolved_target_dir() {
        let check = CountingCheck::new(DependencyOutcome::Ready);
        let executor = succeeding_builds();
        let services = BuildServices {
            executor: &executor,
            dependency_check: &check,
        };

        let summary = run_build_pipeline(&context(true), &services, &mut Vec::new())
            .expect("pipeline succeeds");

        let paths: Vec<&str> = summary
            .results
            .iter()
            .map(|r| r.artifact_path.as_str())
            .collect();
        assert_eq!(
            paths,
            [
                "/work/target/x86_64-unknown-linux-gnu/release/meili",
                "/work/target/x86_64-pc-windows-gnu/release/meili.exe",
                "/work/target/x86_64-apple-darwin/release/meili",
            ]
        );
    }
}
