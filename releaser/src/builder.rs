//! Cargo build orchestration across the target catalogue.
//!
//! Targets are built one after another in catalogue order. Cargo shares its
//! lock file and target directory between invocations, so builds are never
//! run concurrently. The first failing target aborts the run.

use crate::deps::CommandExecutor;
use crate::error::{ReleaseError, Result};
use crate::target::TargetSpec;
use camino::Utf8PathBuf;
use log::{debug, info};

/// Configuration for the build process.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Root of the project being built (directory holding `Cargo.toml`).
    pub project_root: Utf8PathBuf,
    /// Directory cargo writes build outputs to, as reported by
    /// [`crate::workspace::resolve_target_dir`].
    pub target_dir: Utf8PathBuf,
    /// Cargo output verbosity; each level adds one `-v`.
    pub verbosity: u8,
}

impl BuildConfig {
    fn manifest_path(&self) -> Utf8PathBuf {
        self.project_root.join("Cargo.toml")
    }
}

/// Result of building a single target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    /// Target that was built.
    pub target: TargetSpec,
    /// Path where cargo wrote the release binary.
    pub artifact_path: Utf8PathBuf,
}

/// Builder for compiling the application for each catalogue target.
pub struct Builder<'a> {
    config: BuildConfig,
    executor: &'a dyn CommandExecutor,
}

impl<'a> Builder<'a> {
    /// Create a new builder with the given configuration and executor.
    #[must_use]
    pub fn new(config: BuildConfig, executor: &'a dyn CommandExecutor) -> Self {
        Self { config, executor }
    }

    /// Build a single target in release mode.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::ToolInvocation`] if cargo exits unsuccessfully,
    /// or an I/O error if cargo cannot be spawned.
    pub fn build_target(&self, target: &TargetSpec) -> Result<BuildResult> {
        info!("building {} for {target}", target.binary_name());

        let args = self.cargo_args(target);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.executor.run("cargo", &args)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReleaseError::ToolInvocation {
                target: target.triple().to_owned(),
                status: output.status.to_string(),
                stderr: stderr.trim().to_owned(),
            });
        }

        let artifact_path = target.output_path(&self.config.target_dir);
        debug!("{target} built at {artifact_path}");

        Ok(BuildResult {
            target: target.clone(),
            artifact_path,
        })
    }

    /// Build every target in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the error of the first target that fails; later targets are
    /// not attempted.
    pub fn build_all(&self, targets: &[TargetSpec]) -> Result<Vec<BuildResult>> {
        let mut results = Vec::with_capacity(targets.len());

        for target in targets {
            let result = self.build_target(target)?;
            results.push(result);
        }

        Ok(results)
    }

    /// Arguments passed to cargo for `target`.
    fn cargo_args(&self, target: &TargetSpec) -> Vec<String> {
        let mut args = vec![
            "build".to_owned(),
            "--release".to_owned(),
            format!("--target={}", target.triple()),
            "--manifest-path".to_owned(),
            self.config.manifest_path().into_string(),
        ];
        args.extend((0..self.config.verbosity).map(|_| "-v".to_owned()));
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::catalog;
    use crate::test_utils::{
        ExpectedCall, StubExecutor, expect_cargo_build, failure_output, success_output,
    };
    use rstest::rstest;

    const ROOT: &str = "/work/meili";
    const MANIFEST: &str = "/work/meili/Cargo.toml";
    const TARGET_DIR: &str = "/work/target";

    fn config() -> BuildConfig {
        BuildConfig {
            project_root: Utf8PathBuf::from(ROOT),
            target_dir: Utf8PathBuf::from(TARGET_DIR),
            verbosity: 0,
        }
    }

    fn expect_build(triple: &str, result: Result<std::process::Output>) -> ExpectedCall {
        expect_cargo_build(triple, MANIFEST, result)
    }

    #[test]
    fn build_all_attempts_every_target_in_order() {
        let targets = catalog("meili").expect("catalogue is valid");
        let executor = StubExecutor::new(vec![
            expect_build("x86_64-unknown-linux-gnu", Ok(success_output())),
            expect_build("x86_64-pc-windows-gnu", Ok(success_output())),
            expect_build("x86_64-apple-darwin", Ok(success_output())),
        ]);

        let results = Builder::new(config(), &executor)
            .build_all(&targets)
            .expect("all builds succeed");

        executor.assert_finished();
        assert_eq!(results.len(), 3);
        let built: Vec<&TargetSpec> = results.iter().map(|r| &r.target).collect();
        assert_eq!(built, targets.iter().collect::<Vec<_>>());
    }

    #[rstest]
    #[case::first(1)]
    #[case::second(2)]
    #[case::third(3)]
    fn build_all_stops_at_first_failure(#[case] failing: usize) {
        let targets = catalog("meili").expect("catalogue is valid");
        let calls = targets
            .iter()
            .take(failing)
            .enumerate()
            .map(|(index, target)| {
                let result = if index + 1 == failing {
                    Ok(failure_output("error: could not compile `meili`"))
                } else {
                    Ok(success_output())
                };
                expect_build(target.triple(), result)
            })
            .collect();
        let executor = StubExecutor::new(calls);

        let err = Builder::new(config(), &executor)
            .build_all(&targets)
            .expect_err("build should fail");

        assert_eq!(executor.invocations().len(), failing);
        let failing_triple = targets
            .get(failing - 1)
            .map(TargetSpec::triple)
            .expect("failing index is within the catalogue");
        match err {
            ReleaseError::ToolInvocation { target, stderr, .. } => {
                assert_eq!(target, failing_triple);
                assert!(stderr.contains("could not compile"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn build_target_reports_artifact_path() {
        let target = TargetSpec::new("x86_64-pc-windows-gnu", "meili").expect("supported");
        let executor = StubExecutor::new(vec![expect_build(
            "x86_64-pc-windows-gnu",
            Ok(success_output()),
        )]);

        let result = Builder::new(config(), &executor)
            .build_target(&target)
            .expect("build succeeds");

        assert_eq!(
            result.artifact_path,
            Utf8PathBuf::from("/work/target/x86_64-pc-windows-gnu/release/meili.exe")
        );
    }

    #[test]
    fn verbosity_adds_cargo_verbose_flags() {
        let target = TargetSpec::new("x86_64-apple-darwin", "meili").expect("supported");
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            "cargo",
            &[
                "build",
                "--release",
                "--target=x86_64-apple-darwin",
                "--manifest-path",
                MANIFEST,
                "-v",
                "-v",
            ],
            Ok(success_output()),
        )]);
        let config = BuildConfig {
            verbosity: 2,
            ..config()
        };

        assert!(Builder::new(config, &executor).build_target(&target).is_ok());
        executor.assert_finished();
    }

    #[test]
    fn spawn_failure_propagates_as_io_error() {
        let target = TargetSpec::new("x86_64-unknown-linux-gnu", "meili").expect("supported");
        let executor = StubExecutor::new(vec![expect_build(
            "x86_64-unknown-linux-gnu",
            Err(std::io::Error::from(std::io::ErrorKind::NotFound).into()),
        )]);

        let err = Builder::new(config(), &executor)
            .build_target(&target)
            .expect_err("spawn failure is fatal");

        assert!(matches!(err, ReleaseError::Io(_)));
    }
}
