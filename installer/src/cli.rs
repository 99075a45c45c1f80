//! CLI argument definitions for the ddt setup tool.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::backup::DEFAULT_MAX_BACKUPS;
use crate::setup::DEFAULT_LAUNCHER;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

/// Install the ddt toolset and keep your shell PATH in sync.
#[derive(Parser, Debug)]
#[command(name = "ddt-setup")]
#[command(version, about)]
#[command(long_about = concat!(
    "Install the ddt toolset and keep your shell PATH in sync.\n\n",
    "The installer adds <path>/bin to the PATH assignments in ~/.bash_profile, ",
    "~/.bashrc and ~/.zshrc (only those that already exist), taking a backup of ",
    "each file first. The install location is recorded in ~/.ddt-system.json.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Install the toolset from the current directory:\n",
    "    $ ddt-setup install\n\n",
    "  Install into a new directory:\n",
    "    $ ddt-setup install ~/ddt\n\n",
    "  Check that a login shell can find the launcher:\n",
    "    $ ddt-setup test\n\n",
    "  Point the configuration at a different location:\n",
    "    $ ddt-setup set-path /opt/ddt\n",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Settings shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add the toolset to your shell PATH and record its location.
    Install(PathArgs),

    /// Remove the toolset from your shell PATH.
    Uninstall(PathArgs),

    /// Check that a login shell can find and run the launcher.
    Test,

    /// Record the toolset location without editing shell files.
    SetPath(SetPathArgs),
}

/// Arguments for install and uninstall.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct PathArgs {
    /// Toolset root [default: current directory].
    #[arg(value_name = "PATH")]
    pub path: Option<Utf8PathBuf>,
}

/// Arguments for set-path.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct SetPathArgs {
    /// Toolset root to record.
    #[arg(value_name = "PATH")]
    pub path: Utf8PathBuf,
}

/// Flags accepted by every subcommand.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct GlobalArgs {
    /// Configuration file [default: ~/.ddt-system.json].
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        global = true,
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only report errors.
    #[arg(short, long, global = true, conflicts_with = "verbosity")]
    pub quiet: bool,

    /// Warn when a shell file has more than this many backups.
    #[arg(long, global = true, value_name = "N", default_value_t = DEFAULT_MAX_BACKUPS)]
    pub max_backups: usize,

    /// Launcher expected under <path>/bin.
    #[arg(long, global = true, value_name = "NAME", default_value = DEFAULT_LAUNCHER)]
    pub launcher: String,
}

impl Default for GlobalArgs {
    fn default() -> Self {
        Self {
            config: None,
            verbosity: 0,
            quiet: false,
            max_backups: DEFAULT_MAX_BACKUPS,
            launcher: DEFAULT_LAUNCHER.to_owned(),
        }
    }
}

impl GlobalArgs {
    /// Maps `-q` and `-v` to a log level.
    ///
    /// # Examples
    ///
    /// ```
    /// use ddt_setup::cli::GlobalArgs;
    /// use log::LevelFilter;
    ///
    /// let args = GlobalArgs { verbosity: 1, ..GlobalArgs::default() };
    /// assert_eq!(args.level_filter(), LevelFilter::Debug);
    /// ```
    #[must_use]
    pub fn level_filter(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbosity {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
