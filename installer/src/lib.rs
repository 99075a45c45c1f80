//! ddt setup library.
//!
//! This crate installs the ddt developer toolset by keeping the `PATH`
//! assignments in the user's shell profiles in sync with the toolset's
//! location, and records that location in the shared system configuration.
//!
//! # Modules
//!
//! - [`backup`] - Deduplicated snapshots of shell files
//! - [`cli`] - Command-line interface definitions
//! - [`dirs`] - Home directory lookup
//! - [`error`] - Error types for setup operations
//! - [`exec`] - Process execution seam
//! - [`logging`] - Terminal logger initialisation
//! - [`profiles`] - Shell profile discovery
//! - [`setup`] - Install, uninstall, test, and set-path workflows
//! - [`shell_file`] - Idempotent `PATH` assignment editing

pub mod backup;
pub mod cli;
pub mod dirs;
pub mod error;
pub mod exec;
pub mod logging;
pub mod profiles;
pub mod setup;
pub mod shell_file;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
