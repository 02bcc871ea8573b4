//! Shared test utilities for the release tool.

use crate::deps::CommandExecutor;
use crate::error::{ReleaseError, Result};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(101),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "cargo").
    pub cmd: String,
    /// The arguments to pass to the command.
    pub args: Vec<String>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

impl ExpectedCall {
    /// Expect `cmd` with `args`, answering with `result`.
    #[must_use]
    pub fn new(cmd: &str, args: &[&str], result: Result<Output>) -> Self {
        Self {
            cmd: cmd.to_owned(),
            args: args.iter().map(|&a| a.to_owned()).collect(),
            result,
        }
    }
}

/// Expect `cargo build --release` for `triple` against `manifest`, with no
/// verbosity flags.
#[must_use]
pub fn expect_cargo_build(triple: &str, manifest: &str, result: Result<Output>) -> ExpectedCall {
    let target_flag = format!("--target={triple}");
    ExpectedCall::new(
        "cargo",
        &["build", "--release", &target_flag, "--manifest-path", manifest],
        result,
    )
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records every invocation and answers from an ordered queue of expected
/// calls. A call that does not match the head of the queue, or arrives after
/// the queue is drained, yields [`ReleaseError::StubMismatch`].
#[derive(Debug, Default)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
    invocations: RefCell<Vec<Vec<String>>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
            invocations: RefCell::new(Vec::new()),
        }
    }

    /// Returns every invocation seen so far as `[cmd, args...]`.
    #[must_use]
    pub fn invocations(&self) -> Vec<Vec<String>> {
        self.invocations.borrow().clone()
    }

    /// Returns true if all expected command invocations have been consumed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.expected.borrow().is_empty()
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.is_finished(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        let mut seen = vec![cmd.to_owned()];
        seen.extend(args.iter().map(|&a| a.to_owned()));
        self.invocations.borrow_mut().push(seen);

        let Some(call) = self.expected.borrow_mut().pop_front() else {
            return Err(ReleaseError::StubMismatch {
                message: format!("unexpected invocation: {cmd} {}", args.join(" ")),
            });
        };

        if call.cmd != cmd || call.args != args {
            return Err(ReleaseError::StubMismatch {
                message: format!(
                    "expected {} {}, got {cmd} {}",
                    call.cmd,
                    call.args.join(" "),
                    args.join(" ")
                ),
            });
        }

        call.result
    }
}
