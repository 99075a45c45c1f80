//! Install, uninstall, verify, and relocate the ddt toolset.
//!
//! [`Setup`] ties the pieces together: it discovers the user's shell
//! profiles, snapshots them with [`BackupManager`], rewrites their `PATH`
//! assignments, and records the toolset location in the [`SystemConfig`].
//!
//! Preconditions are checked before anything is touched. Once editing has
//! started, a failure on one shell file does not stop the others; the failures
//! are collected and returned as [`SetupError::ShellFiles`] at the end.

use crate::backup::{BackupError, BackupManager, BackupOutcome, BackupPolicy, Snapshotter};
use crate::error::{Result, SetupError};
use crate::exec::{CommandExecutor, require_success};
use crate::profiles::discover_shell_files;
use crate::shell_file::{self, EditReport, FileEdit};
use camino::{Utf8Path, Utf8PathBuf};
use ddt_common::SystemConfig;
use log::{debug, info, warn};

/// Launcher expected under `<tools>/bin` when none is configured.
pub const DEFAULT_LAUNCHER: &str = "ddt";

const BIN_DIR: &str = "bin";

/// Settings shared by every workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupOptions {
    /// File name of the launcher script under `<tools>/bin`.
    pub launcher: String,
    /// Retention policy for shell file backups.
    pub backup: BackupPolicy,
}

impl Default for SetupOptions {
    fn default() -> Self {
        Self {
            launcher: DEFAULT_LAUNCHER.to_owned(),
            backup: BackupPolicy::default(),
        }
    }
}

/// What an install or uninstall did to the shell profiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowReport {
    /// Resolved toolset root.
    pub root: Utf8PathBuf,
    /// Segment that was added or removed.
    pub segment: Utf8PathBuf,
    /// Backups taken, one per profile that could be snapshotted.
    pub backups: Vec<BackupOutcome>,
    /// Profiles that were rewritten.
    pub edits: Vec<FileEdit>,
}

impl WorkflowReport {
    /// Number of profiles whose bytes changed.
    #[must_use]
    pub fn changed_count(&self) -> usize {
        self.edits.iter().filter(|edit| edit.changed).count()
    }
}

/// Result of verifying the installation through a login shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    /// The toolset is on `PATH` and the launcher runs.
    Passed,
    /// No tools path has been recorded in the configuration.
    NotConfigured,
    /// The login shell's `PATH` does not contain the toolset's `bin`.
    NotOnPath {
        /// Segment that was looked for.
        segment: Utf8PathBuf,
    },
    /// A shell or launcher invocation failed.
    Failed {
        /// Description of the failure.
        message: String,
    },
}

impl TestOutcome {
    /// Returns true if the installation was verified.
    #[must_use]
    pub fn passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Drives the setup workflows against one configuration and home directory.
pub struct Setup {
    config: SystemConfig,
    home: Utf8PathBuf,
    options: SetupOptions,
    backups: Box<dyn Snapshotter>,
}

impl std::fmt::Debug for Setup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Setup")
            .field("config", &self.config)
            .field("home", &self.home)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Setup {
    /// Creates a controller editing profiles under `home`.
    ///
    /// Profiles are snapshotted by a [`BackupManager`] following
    /// `options.backup`.
    #[must_use]
    pub fn new(config: SystemConfig, home: impl Into<Utf8PathBuf>, options: SetupOptions) -> Self {
        let backups = Box::new(BackupManager::new(options.backup));
        Self {
            config,
            home: home.into(),
            options,
            backups,
        }
    }

    /// Replaces the component that snapshots profiles before they are edited.
    #[must_use]
    pub fn with_backups(mut self, backups: impl Snapshotter + 'static) -> Self {
        self.backups = Box::new(backups);
        self
    }

    /// Returns the configuration, including any unwritten changes.
    #[must_use]
    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Returns the workflow settings.
    #[must_use]
    pub fn options(&self) -> &SetupOptions {
        &self.options
    }

    /// Shell profiles that currently exist under the home directory.
    #[must_use]
    pub fn shell_files(&self) -> Vec<Utf8PathBuf> {
        discover_shell_files(&self.home)
    }

    /// Installs the toolset rooted at `path`.
    ///
    /// An existing directory must already contain `bin/<launcher>`. A missing
    /// directory is created. Every shell profile is backed up before
    /// `<root>/bin` is added to it, and the root is then recorded as
    /// `path.tools`.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::PathIsFile`] or
    /// [`SetupError::InvalidInstallTarget`] before anything is modified,
    /// [`SetupError::Backup`] when a profile cannot be read,
    /// [`SetupError::Config`] when the configuration cannot be written, and
    /// [`SetupError::ShellFiles`] when some profiles could not be rewritten.
    /// The configuration is written before the last of these is reported.
    pub fn install(&mut self, path: &Utf8Path) -> Result<WorkflowReport> {
        let root = self.prepare_install_target(path)?;
        info!("installing the toolset from '{root}'");

        let (report, edits) = self.apply(root, shell_file::add_segment)?;

        info!("recording tools path '{}'", report.root);
        self.config.set_tools_path(&report.root);
        self.config.write()?;

        finish(report, edits)
    }

    /// Removes `<path>/bin` from every shell profile.
    ///
    /// The recorded `path.tools` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::Backup`] when a profile cannot be read and
    /// [`SetupError::ShellFiles`] when some profiles could not be rewritten.
    pub fn uninstall(&mut self, path: &Utf8Path) -> Result<WorkflowReport> {
        let root = resolve_existing_or_absolute(path)?;
        info!("uninstalling the toolset from '{root}'");

        let (report, edits) = self.apply(root, shell_file::remove_segment)?;
        finish(report, edits)
    }

    /// Records `path` as the toolset location without touching the
    /// filesystem or the shell profiles.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::Config`] when the configuration cannot be
    /// written.
    pub fn set_path(&mut self, path: &Utf8Path) -> Result<()> {
        info!("updating configuration with tools path '{path}'");
        self.config.set_tools_path(path);
        self.config.write()?;
        Ok(())
    }

    /// Verifies the installation through a login shell.
    ///
    /// The login shell's `PATH` must contain `<tools>/bin`, and the launcher
    /// must run both by name from a login shell and by absolute path. Every
    /// failure is reported through the outcome rather than as an error.
    pub fn test(&self, executor: &dyn CommandExecutor) -> TestOutcome {
        let Some(tools) = self.config.tools_path() else {
            warn!("no tools path is configured, run install or set-path first");
            return TestOutcome::NotConfigured;
        };
        let bin = tools.join(BIN_DIR);

        let path = match run_bash(executor, &["--login", "-c", "echo $PATH"]) {
            Ok(stdout) => stdout,
            Err(e) => return failed(&e),
        };
        if !path.trim().split(':').any(|segment| segment == bin.as_str()) {
            info!("'{bin}' is not on the login shell's PATH");
            return TestOutcome::NotOnPath { segment: bin };
        }

        let launcher = &self.options.launcher;
        let by_name = format!("{launcher} --help");
        let by_path = format!("{bin}/{launcher} --help");
        let checks = run_bash(executor, &["--login", "-c", &by_name])
            .and_then(|_| run_bash(executor, &["-c", &by_path]));
        match checks {
            Ok(_) => {
                info!(
                    "the path was successfully installed, you might need to open a new terminal to see the effects"
                );
                TestOutcome::Passed
            }
            Err(e) => failed(&e),
        }
    }

    fn prepare_install_target(&self, path: &Utf8Path) -> Result<Utf8PathBuf> {
        if path.is_dir() {
            let root = path.canonicalize_utf8()?;
            let bin = root.join(BIN_DIR);
            if !bin.is_dir() || !bin.join(&self.options.launcher).is_file() {
                return Err(SetupError::InvalidInstallTarget {
                    path: root,
                    launcher: self.options.launcher.clone(),
                });
            }
            return Ok(root);
        }

        if path.exists() {
            return Err(SetupError::PathIsFile {
                path: path.to_owned(),
            });
        }

        info!("creating install directory '{path}'");
        std::fs::create_dir_all(path)?;
        Ok(path.canonicalize_utf8()?)
    }

    fn apply<F>(&self, root: Utf8PathBuf, edit: F) -> Result<(WorkflowReport, EditReport)>
    where
        F: FnOnce(&[Utf8PathBuf], &str) -> EditReport,
    {
        let files = self.shell_files();
        if files.is_empty() {
            warn!("no shell profiles found under '{}'", self.home);
        }

        let backups = self.backup_all(&files)?;
        let segment = root.join(BIN_DIR);
        let edits = edit(&files, segment.as_str());
        debug!(
            "{} of {} shell file(s) changed",
            edits.changed_count(),
            edits.edits.len()
        );

        let report = WorkflowReport {
            root,
            segment,
            backups,
            edits: Vec::new(),
        };
        Ok((report, edits))
    }

    fn backup_all(&self, files: &[Utf8PathBuf]) -> Result<Vec<BackupOutcome>> {
        let mut outcomes = Vec::with_capacity(files.len());
        for file in files {
            match self.backups.snapshot(file) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e @ BackupError::ReadSource { .. }) => return Err(e.into()),
                Err(e) => warn!("{e}, editing '{file}' without a fresh backup"),
            }
        }
        Ok(outcomes)
    }
}

fn finish(mut report: WorkflowReport, edits: EditReport) -> Result<WorkflowReport> {
    if !edits.is_success() {
        return Err(SetupError::ShellFiles {
            failures: edits.failures,
        });
    }
    report.edits = edits.edits;
    Ok(report)
}

fn resolve_existing_or_absolute(path: &Utf8Path) -> Result<Utf8PathBuf> {
    if path.exists() {
        return Ok(path.canonicalize_utf8()?);
    }
    let absolute = std::path::absolute(path)?;
    Utf8PathBuf::from_path_buf(absolute).map_err(|path| SetupError::NonUtf8Path { path })
}

fn run_bash(executor: &dyn CommandExecutor, args: &[&str]) -> Result<String> {
    let args: Vec<String> = args.iter().map(|arg| (*arg).to_owned()).collect();
    debug!("running bash {args:?}");
    let output = executor.run("bash", &args)?;
    require_success("bash", &args, &output)
}

fn failed(error: &SetupError) -> TestOutcome {
    warn!("{error}");
    warn!("the shell path could not be verified, please report this error");
    TestOutcome::Failed {
        message: error.to_string(),
    }
}
