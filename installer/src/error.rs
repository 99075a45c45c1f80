//! Error types for the ddt setup workflows.
//!
//! This module defines semantic error variants that tell the user what went
//! wrong and, where possible, what the installer expected to find.

use crate::backup::BackupError;
use crate::shell_file::ShellFileError;
use camino::Utf8PathBuf;
use ddt_common::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while installing, uninstalling, or testing the
/// toolset.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The target directory exists but does not hold the toolset layout.
    #[error(
        "sanity checks for {path} failed, the following items are required: folder {path}/bin, file {path}/bin/{launcher}"
    )]
    InvalidInstallTarget {
        /// Directory that was checked.
        path: Utf8PathBuf,
        /// Launcher file name expected under `bin/`.
        launcher: String,
    },

    /// The target path is an existing regular file.
    #[error("the path '{path}' given was not a directory, cannot continue")]
    PathIsFile {
        /// Path that collided with a file.
        path: Utf8PathBuf,
    },

    /// The system configuration could not be loaded or written.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A shell file could not be read for backup, so nothing was edited.
    #[error(transparent)]
    Backup(#[from] BackupError),

    /// One or more shell files could not be rewritten.
    #[error("failed to update {} shell file(s): {}", .failures.len(), summarise(.failures))]
    ShellFiles {
        /// Per-file failures, in processing order.
        failures: Vec<ShellFileError>,
    },

    /// A spawned shell or launcher exited unsuccessfully or failed to start.
    #[error("{command} failed: {message}")]
    Subprocess {
        /// Command line that was run.
        command: String,
        /// Captured stderr or spawn error.
        message: String,
    },

    /// The home directory could not be determined.
    #[error("could not determine home directory")]
    HomeDirectoryUnavailable,

    /// A path could not be represented as UTF-8.
    #[error("path is not valid UTF-8: {}", .path.display())]
    NonUtf8Path {
        /// The offending path.
        path: PathBuf,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

fn summarise(failures: &[ShellFileError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias using [`SetupError`].
pub type Result<T> = std::result::Result<T, SetupError>;
