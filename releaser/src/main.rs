//! Meili release tool CLI entrypoint.
//!
//! `build` compiles every target and publishes the outputs on the
//! distribution host. `release` additionally uploads the binaries to the
//! GitHub release for the manifest version.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use meili_releaser::cli::{Cli, Command, ReleaseArgs};
use meili_releaser::deps::{PlaceholderDependencyCheck, SystemCommandExecutor};
use meili_releaser::error::Result;
use meili_releaser::output::write_stderr_line;
use meili_releaser::pipeline::{BuildServices, PipelineContext, run_build_pipeline};
use meili_releaser::release::{ReleaseContext, ReleaseServices, run_release};
use meili_releaser::upload::GithubReleaseUploader;
use meili_releaser::workspace::{current_project_root, resolve_target_dir};
use std::io::Write;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Installs the log subscriber; `RUST_LOG` overrides the flag-derived level.
fn init_logging(cli: &Cli) {
    let args = cli.build_args();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(args.verbosity, args.quiet)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn default_log_filter(verbosity: u8, quiet: bool) -> &'static str {
    match (quiet, verbosity) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let args = cli.build_args();
    let project_root = resolve_project_root(args.project_dir.as_deref())?;
    let target_dir = resolve_target_dir(&project_root)?;

    let pipeline = PipelineContext {
        project_root: &project_root,
        target_dir: &target_dir,
        binary_name: &args.binary_name,
        verbosity: args.verbosity,
        host_role: args.host_role(),
        publish_dir: &args.publish_dir,
        quiet: args.quiet,
    };

    let executor = SystemCommandExecutor;
    let dependency_check = PlaceholderDependencyCheck;
    let build = BuildServices {
        executor: &executor,
        dependency_check: &dependency_check,
    };

    match &cli.command {
        Command::Build(_) => {
            run_build_pipeline(&pipeline, &build, stderr)?;
        }
        Command::Release(release) => {
            run_release_command(release, pipeline, build, stderr)?;
        }
    }

    Ok(())
}

fn run_release_command(
    args: &ReleaseArgs,
    pipeline: PipelineContext<'_>,
    build: BuildServices<'_>,
    stderr: &mut dyn Write,
) -> Result<()> {
    let secrets_path = args.secrets_path(pipeline.project_root);
    let manifest_path = args.manifest_path(pipeline.project_root);
    let uploader = GithubReleaseUploader::new(args.repo.clone());

    let context = ReleaseContext {
        pipeline,
        secrets_path: &secrets_path,
        manifest_path: &manifest_path,
        strict_uploads: args.strict_uploads,
    };
    let services = ReleaseServices {
        build,
        uploader: &uploader,
    };

    run_release(&context, &services, stderr)?;
    Ok(())
}

/// Uses the explicit project directory when given, otherwise searches
/// upwards from the working directory.
fn resolve_project_root(explicit: Option<&Utf8Path>) -> Result<Utf8PathBuf> {
    match explicit {
        Some(dir) => Ok(dir.to_owned()),
        None => current_project_root(),
    }
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meili_releaser::error::ReleaseError;
    use rstest::rstest;

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = ReleaseError::ToolInvocation {
            target: "x86_64-pc-windows-gnu".to_owned(),
            status: "exit status: 101".to_owned(),
            stderr: "linker `x86_64-w64-mingw32-gcc` not found".to_owned(),
        };

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.contains("x86_64-pc-windows-gnu"));
    }

    #[rstest]
    #[case::default_level(0, false, "warn")]
    #[case::single_verbose(1, false, "info")]
    #[case::very_verbose(3, false, "debug")]
    #[case::quiet(0, true, "error")]
    fn default_log_filter_follows_flags(
        #[case] verbosity: u8,
        #[case] quiet: bool,
        #[case] expected: &str,
    ) {
        assert_eq!(default_log_filter(verbosity, quiet), expected);
    }

    #[test]
    fn explicit_project_dir_is_used_verbatim() {
        let root = resolve_project_root(Some(Utf8Path::new("/work/meili")))
            .expect("explicit root always resolves");
        assert_eq!(root, Utf8PathBuf::from("/work/meili"));
    }
}
