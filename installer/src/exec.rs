//! Process execution seam.
//!
//! Workflows that spawn shells take a [`CommandExecutor`] so tests can
//! substitute canned output for real processes.

use crate::error::{Result, SetupError};
use std::process::{Command, Output};

/// Abstraction for running external commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    /// Runs a command with arguments and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ddt_setup::exec::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("bash", &["-c".to_owned(), "echo $PATH".to_owned()])?;
    /// assert!(output.status.success());
    /// # Ok::<(), ddt_setup::error::SetupError>(())
    /// ```
    fn run(&self, cmd: &str, args: &[String]) -> Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[String]) -> Result<Output> {
        Command::new(cmd)
            .args(args)
            .output()
            .map_err(SetupError::from)
    }
}

/// Renders a command line for log and error messages.
#[must_use]
pub fn display_command(cmd: &str, args: &[String]) -> String {
    std::iter::once(cmd)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns stdout when the command succeeded, otherwise a subprocess error
/// carrying the trimmed stderr.
///
/// # Errors
///
/// Returns [`SetupError::Subprocess`] when the command exited unsuccessfully.
pub fn require_success(cmd: &str, args: &[String], output: &Output) -> Result<String> {
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
    let message = if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr
    };
    Err(SetupError::Subprocess {
        command: display_command(cmd, args),
        message,
    })
}
