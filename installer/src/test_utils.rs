//! Shared test utilities for the setup crate.

use crate::dirs::BaseDirs;
use crate::error::{Result, SetupError};
use crate::exec::{CommandExecutor, display_command};
use camino::Utf8PathBuf;
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

    ExitStatus::from_raw(code.cast_unsigned())
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    stdout_output("")
}

/// Creates a successful command `Output` with the given stdout.
#[must_use]
pub fn stdout_output(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "bash").
    pub cmd: &'static str,
    /// The arguments to pass to the command.
    pub args: Vec<String>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

impl ExpectedCall {
    /// Expects `bash` to be run with `args`, returning `output`.
    #[must_use]
    pub fn bash(args: &[&str], output: Output) -> Self {
        Self {
            cmd: "bash",
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
            result: Ok(output),
        }
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results,
/// allowing tests to verify command execution without side effects. An
/// unexpected or mismatched invocation yields [`SetupError::StubMismatch`].
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        let remaining = self.expected.borrow();
        assert!(
            remaining.is_empty(),
            "expected no further command invocations, {} remain",
            remaining.len()
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[String]) -> Result<Output> {
        let received = display_command(cmd, args);
        let Some(call) = self.expected.borrow_mut().pop_front() else {
            return Err(SetupError::StubMismatch {
                message: format!("unexpected command invocation: {received}"),
            });
        };

        if call.cmd != cmd || call.args.as_slice() != args {
            return Err(SetupError::StubMismatch {
                message: format!(
                    "expected `{}`, got `{received}`",
                    display_command(call.cmd, &call.args)
                ),
            });
        }

        call.result
    }
}

/// Base directories pinned to a fixed home, for tests.
#[derive(Debug, Clone, Default)]
pub struct FixedBaseDirs {
    home: Option<Utf8PathBuf>,
}

impl FixedBaseDirs {
    /// Uses `home` as the home directory.
    #[must_use]
    pub fn new(home: impl Into<Utf8PathBuf>) -> Self {
        Self {
            home: Some(home.into()),
        }
    }

    /// Reports no home directory.
    #[must_use]
    pub fn homeless() -> Self {
        Self::default()
    }
}

impl BaseDirs for FixedBaseDirs {
    fn home_dir(&self) -> Option<Utf8PathBuf> {
        self.home.clone()
    }
}
