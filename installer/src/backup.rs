//! Snapshots of shell files taken before they are edited.
//!
//! A backup is a sibling file named
//! `<original>_<YYYYMMDD>_T<HHMMSS>_<8 hex chars>` holding the exact bytes of
//! the original. A new snapshot is only written when no existing backup of the
//! same file already holds identical content.
//!
//! When more than [`BackupPolicy::max_backups`] snapshots exist a warning is
//! logged. Old snapshots are never deleted; pruning has not been implemented.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Local;
use log::{debug, info, warn};
use std::io::Write;
use thiserror::Error;
use uuid::Uuid;

/// Number of backups per file above which a warning is logged.
pub const DEFAULT_MAX_BACKUPS: usize = 10;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_T%H%M%S";
const SUFFIX_BYTES: usize = 4;

/// Errors raised while taking a backup.
#[derive(Debug, Error)]
pub enum BackupError {
    /// The file to back up could not be read.
    #[error("failed to read {path} for backup: {source}")]
    ReadSource {
        /// File that could not be read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The backup search pattern was rejected by `glob`.
    #[error("invalid backup pattern {pattern}: {source}")]
    Pattern {
        /// Pattern that failed to compile.
        pattern: String,
        /// Underlying pattern error.
        #[source]
        source: glob::PatternError,
    },

    /// The snapshot could not be written.
    #[error("failed to write backup {path}: {source}")]
    WriteBackup {
        /// Backup file that could not be written.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Backup retention settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupPolicy {
    /// Backup count above which a warning is logged.
    pub max_backups: usize,
}

impl Default for BackupPolicy {
    fn default() -> Self {
        Self {
            max_backups: DEFAULT_MAX_BACKUPS,
        }
    }
}

/// Result of a successful [`BackupManager::backup`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    /// A new snapshot was written.
    Created(Utf8PathBuf),
    /// An existing snapshot already held identical content.
    AlreadyBackedUp(Utf8PathBuf),
}

impl BackupOutcome {
    /// Path of the snapshot holding the file's current content.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        match self {
            Self::Created(path) | Self::AlreadyBackedUp(path) => path,
        }
    }
}

/// Takes deduplicated snapshots of files.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackupManager {
    policy: BackupPolicy,
}

impl BackupManager {
    /// Creates a manager with the given retention policy.
    #[must_use]
    pub fn new(policy: BackupPolicy) -> Self {
        Self { policy }
    }

    /// Returns the retention policy.
    #[must_use]
    pub fn policy(&self) -> BackupPolicy {
        self.policy
    }

    /// Snapshots `file` unless an identical snapshot already exists.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::ReadSource`] when `file` cannot be read, and
    /// [`BackupError::WriteBackup`] when the new snapshot cannot be written.
    pub fn backup(&self, file: &Utf8Path) -> Result<BackupOutcome, BackupError> {
        let contents = std::fs::read(file).map_err(|source| BackupError::ReadSource {
            path: file.to_path_buf(),
            source,
        })?;

        let existing = existing_backups(file)?;
        if existing.len() > self.policy.max_backups {
            if let Some(oldest) = existing.first() {
                warn!(
                    "there are too many backup files for '{file}' ({} > {}), delete the oldest one '{oldest}'",
                    existing.len(),
                    self.policy.max_backups
                );
            }
            warn!("automatic backup cleanup is not implemented yet");
        }

        if let Some(matching) = find_identical(&existing, &contents) {
            debug!("the contents of '{file}' were already backed up in '{matching}'");
            return Ok(BackupOutcome::AlreadyBackedUp(matching));
        }

        let backup = backup_path(file);
        info!("backing up file '{file}' to '{backup}'");
        write_new(&backup, &contents).map_err(|source| BackupError::WriteBackup {
            path: backup.clone(),
            source,
        })?;

        Ok(BackupOutcome::Created(backup))
    }
}

/// Takes a snapshot of a shell file before it is edited.
#[cfg_attr(test, mockall::automock)]
pub trait Snapshotter {
    /// Snapshots `file`.
    ///
    /// # Errors
    ///
    /// Returns a [`BackupError`] when the snapshot cannot be taken.
    fn snapshot(&self, file: &Utf8Path) -> Result<BackupOutcome, BackupError>;
}

impl Snapshotter for BackupManager {
    fn snapshot(&self, file: &Utf8Path) -> Result<BackupOutcome, BackupError> {
        self.backup(file)
    }
}

/// Lists the existing backups of `file`, oldest first.
///
/// # Errors
///
/// Returns [`BackupError::Pattern`] if the search pattern cannot be compiled.
pub fn existing_backups(file: &Utf8Path) -> Result<Vec<Utf8PathBuf>, BackupError> {
    let pattern = format!("{}_*", glob::Pattern::escape(file.as_str()));
    let paths = glob::glob(&pattern).map_err(|source| BackupError::Pattern {
        pattern: pattern.clone(),
        source,
    })?;

    let mut backups: Vec<Utf8PathBuf> = paths
        .filter_map(|entry| match entry {
            Ok(path) => Utf8PathBuf::try_from(path).ok(),
            Err(e) => {
                debug!("skipping unreadable backup candidate: {e}");
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    backups.sort();
    Ok(backups)
}

fn find_identical(backups: &[Utf8PathBuf], contents: &[u8]) -> Option<Utf8PathBuf> {
    backups
        .iter()
        .find(|backup| match std::fs::read(backup) {
            Ok(existing) => existing == contents,
            Err(e) => {
                warn!("could not read backup '{backup}' for comparison: {e}");
                false
            }
        })
        .cloned()
}

fn backup_path(file: &Utf8Path) -> Utf8PathBuf {
    let timestamp = Local::now().format(TIMESTAMP_FORMAT);
    Utf8PathBuf::from(format!("{file}_{timestamp}_{}", random_suffix()))
}

fn random_suffix() -> String {
    Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(SUFFIX_BYTES)
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

fn write_new(path: &Utf8Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct TempHome {
        _temp: TempDir,
        bashrc: Utf8PathBuf,
    }

    #[fixture]
    fn temp_home() -> TempHome {
        let temp = TempDir::new().expect("failed to create temp dir");
        let root = Utf8PathBuf::try_from(temp.path().to_owned()).expect("non-UTF8 temp path");
        let bashrc = root.join(".bashrc");
        std::fs::write(&bashrc, "PATH=$PATH:/usr/bin\n").expect("write bashrc");
        TempHome {
            _temp: temp,
            bashrc,
        }
    }

    #[test]
    fn random_suffix_is_eight_hex_chars() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn backup_path_follows_naming_scheme() {
        let path = backup_path(Utf8Path::new("/home/user/.zshrc"));
        let name = path.file_name().expect("file name");
        let rest = name.strip_prefix(".zshrc_").expect("original name");
        let parts: Vec<&str> = rest.split('_').collect();

        assert_eq!(parts.len(), 3, "unexpected name {name}");
        assert_eq!(parts[0].len(), 8);
        assert!(parts[0].chars().all(|c| c.is_ascii_digit()));
        assert!(parts[1].starts_with('T'));
        assert_eq!(parts[1].len(), 7);
        assert_eq!(parts[2].len(), 8);
    }

    #[rstest]
    fn backup_creates_identical_copy(temp_home: TempHome) {
        let manager = BackupManager::default();
        let outcome = manager.backup(&temp_home.bashrc).expect("backup");

        let BackupOutcome::Created(path) = outcome else {
            panic!("expected a new backup");
        };
        assert_eq!(
            std::fs::read(&path).expect("read backup"),
            std::fs::read(&temp_home.bashrc).expect("read original")
        );
    }

    #[rstest]
    fn repeated_backup_without_changes_is_deduplicated(temp_home: TempHome) {
        let manager = BackupManager::default();
        let first = manager.backup(&temp_home.bashrc).expect("first backup");
        let second = manager.backup(&temp_home.bashrc).expect("second backup");

        assert!(matches!(first, BackupOutcome::Created(_)));
        assert_eq!(second, BackupOutcome::AlreadyBackedUp(first.path().to_owned()));
        assert_eq!(
            existing_backups(&temp_home.bashrc).expect("list").len(),
            1
        );
    }

    #[rstest]
    fn changed_content_creates_second_backup(temp_home: TempHome) {
        let manager = BackupManager::default();
        manager.backup(&temp_home.bashrc).expect("first backup");
        std::fs::write(&temp_home.bashrc, "PATH=$PATH:/opt/bin\n").expect("modify");
        manager.backup(&temp_home.bashrc).expect("second backup");

        assert_eq!(
            existing_backups(&temp_home.bashrc).expect("list").len(),
            2
        );
    }

    #[rstest]
    fn backups_of_other_files_are_ignored(temp_home: TempHome) {
        let sibling = temp_home.bashrc.with_file_name(".bashrc.local");
        std::fs::write(&sibling, "alias ll='ls -l'\n").expect("write sibling");

        let backups = existing_backups(&temp_home.bashrc).expect("list");
        assert!(backups.is_empty());
    }

    #[rstest]
    fn threshold_is_reported_but_not_enforced(temp_home: TempHome) {
        let manager = BackupManager::new(BackupPolicy { max_backups: 1 });
        for n in 0..3 {
            std::fs::write(&temp_home.bashrc, format!("PATH=$PATH:/opt/{n}\n")).expect("modify");
            manager.backup(&temp_home.bashrc).expect("backup");
        }

        assert_eq!(
            existing_backups(&temp_home.bashrc).expect("list").len(),
            3,
            "no backup is pruned when the threshold is exceeded"
        );
    }

    #[rstest]
    fn unreadable_source_is_reported(temp_home: TempHome) {
        let missing = temp_home.bashrc.with_file_name(".zshrc");
        let err = BackupManager::default()
            .backup(&missing)
            .expect_err("expected read failure");
        assert!(matches!(err, BackupError::ReadSource { path, .. } if path == missing));
    }

    #[rstest]
    fn glob_metacharacters_in_path_are_escaped(temp_home: TempHome) {
        let odd = temp_home.bashrc.with_file_name("[profile]");
        std::fs::write(&odd, "PATH=$PATH:/bin\n").expect("write file");

        BackupManager::default().backup(&odd).expect("backup");
        assert_eq!(existing_backups(&odd).expect("list").len(), 1);
    }
}
