//! Discovery of the shell start-up files that carry `PATH` assignments.

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;

/// Shell profiles considered for editing, relative to the home directory.
pub const SHELL_PROFILES: [&str; 3] = [".bash_profile", ".bashrc", ".zshrc"];

/// Returns the shell profiles that exist under `home`, in [`SHELL_PROFILES`]
/// order. Missing profiles are never created.
#[must_use]
pub fn discover_shell_files(home: &Utf8Path) -> Vec<Utf8PathBuf> {
    SHELL_PROFILES
        .iter()
        .map(|name| home.join(name))
        .filter(|path| {
            let exists = path.is_file();
            if !exists {
                debug!("skipping missing shell profile '{path}'");
            }
            exists
        })
        .collect()
}
