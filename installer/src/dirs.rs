//! Home directory lookup.

use camino::Utf8PathBuf;

/// Source of the user's base directories.
pub trait BaseDirs {
    /// Returns the home directory, if it can be determined and is UTF-8.
    fn home_dir(&self) -> Option<Utf8PathBuf>;
}

/// Resolves directories from the running system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBaseDirs;

impl BaseDirs for SystemBaseDirs {
    fn home_dir(&self) -> Option<Utf8PathBuf> {
        let dirs = directories_next::BaseDirs::new()?;
        Utf8PathBuf::from_path_buf(dirs.home_dir().to_path_buf()).ok()
    }
}
