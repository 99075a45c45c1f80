//! Typed access to the system configuration file.
//!
//! The system configuration records where the toolset is installed
//! (`path.tools`), the root that holds checked-out projects
//! (`path.projects`), and the registries of extensions and projects. Every
//! tool in the suite reads it through [`SystemConfig`] so the key layout lives
//! in one place.

use crate::error::Result;
use crate::store::ConfigStore;
use camino::{Utf8Path, Utf8PathBuf};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// File name of the system configuration inside its directory.
pub const DEFAULT_FILENAME: &str = ".ddt-system.json";

const TOOLS_PATH_KEY: &str = "path.tools";
const PROJECTS_PATH_KEY: &str = "path.projects";
const DESCRIPTION_KEY: &str = "description";
const EXTENSIONS_KEY: &str = "extensions";
const PROJECTS_KEY: &str = "projects";

/// A registered extension repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    /// Remote the extension is cloned from.
    pub url: String,
    /// Local checkout directory.
    pub path: String,
}

impl From<&Extension> for Value {
    fn from(extension: &Extension) -> Self {
        json!({ "url": extension.url, "path": extension.path })
    }
}

/// A registered project repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Remote the project is cloned from.
    pub git: String,
    /// Branch to check out.
    pub branch: String,
}

impl From<&Project> for Value {
    fn from(project: &Project) -> Self {
        json!({ "git": project.git, "branch": project.branch })
    }
}

/// The system configuration document.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemConfig {
    store: ConfigStore,
}

impl SystemConfig {
    /// Loads the system configuration from `path`.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::ConfigError`] from [`ConfigStore::load`].
    pub fn load(path: impl Into<Utf8PathBuf>) -> Result<Self> {
        ConfigStore::load(path).map(Self::from_store)
    }

    /// Loads [`DEFAULT_FILENAME`] from `dir`.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::ConfigError`] from [`ConfigStore::load`].
    pub fn load_from_dir(dir: &Utf8Path) -> Result<Self> {
        Self::load(dir.join(DEFAULT_FILENAME))
    }

    /// Wraps an already loaded store.
    #[must_use]
    pub fn from_store(store: ConfigStore) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Returns the underlying store for direct key access.
    pub fn store_mut(&mut self) -> &mut ConfigStore {
        &mut self.store
    }

    /// Persists the configuration.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::ConfigError`] from [`ConfigStore::write`].
    pub fn write(&self) -> Result<()> {
        self.store.write()
    }

    /// Free-form description of this installation.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.store.get_str(DESCRIPTION_KEY)
    }

    /// Directory the toolset is installed in.
    #[must_use]
    pub fn tools_path(&self) -> Option<Utf8PathBuf> {
        self.store.get_str(TOOLS_PATH_KEY).map(Utf8PathBuf::from)
    }

    /// Records the toolset install directory.
    pub fn set_tools_path(&mut self, path: &Utf8Path) {
        self.store.set(TOOLS_PATH_KEY, path.as_str());
    }

    /// Root directory for projects.
    ///
    /// Falls back to the parent of the tools path when unset.
    #[must_use]
    pub fn project_path(&self) -> Option<Utf8PathBuf> {
        if let Some(path) = self.store.get_str(PROJECTS_PATH_KEY) {
            return Some(Utf8PathBuf::from(path));
        }
        self.tools_path()
            .and_then(|tools| tools.parent().map(Utf8Path::to_path_buf))
    }

    /// Records the project root directory.
    pub fn set_project_path(&mut self, path: &Utf8Path) {
        self.store.set(PROJECTS_PATH_KEY, path.as_str());
    }

    /// Lists registered extensions in document order.
    ///
    /// Entries that do not have the `{url, path}` shape are skipped.
    #[must_use]
    pub fn extensions(&self) -> Vec<(String, Extension)> {
        self.records(EXTENSIONS_KEY)
    }

    /// Registers an extension, returning whether the stored record matches.
    pub fn add_extension(&mut self, name: &str, url: &str, path: &str) -> bool {
        let extension = Extension {
            url: url.to_owned(),
            path: path.to_owned(),
        };
        let key = format!("{EXTENSIONS_KEY}.{name}");
        self.store.set(&key, Value::from(&extension));
        self.record::<Extension>(&key).as_ref() == Some(&extension)
    }

    /// Removes an extension, returning whether it was registered.
    pub fn remove_extension(&mut self, name: &str) -> bool {
        self.store.delete(&format!("{EXTENSIONS_KEY}.{name}"))
    }

    /// Lists registered projects in document order.
    #[must_use]
    pub fn projects(&self) -> Vec<(String, Project)> {
        self.records(PROJECTS_KEY)
    }

    /// Registers a project, returning whether it is present afterwards.
    pub fn add_project(&mut self, name: &str, git: &str, branch: &str) -> bool {
        let project = Project {
            git: git.to_owned(),
            branch: branch.to_owned(),
        };
        self.store
            .set(&format!("{PROJECTS_KEY}.{name}"), Value::from(&project));
        self.has_project(name)
    }

    /// Removes a project, returning whether it is absent afterwards.
    pub fn remove_project(&mut self, name: &str) -> bool {
        self.store.delete(&format!("{PROJECTS_KEY}.{name}"));
        !self.has_project(name)
    }

    /// Returns `true` when a project with `name` is registered.
    #[must_use]
    pub fn has_project(&self, name: &str) -> bool {
        self.store.has(&format!("{PROJECTS_KEY}.{name}"))
    }

    fn record<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.store
            .get(key)
            .and_then(|value| T::deserialize(value).ok())
    }

    fn records<T: DeserializeOwned>(&self, key: &str) -> Vec<(String, T)> {
        let Some(table) = self.store.get(key).and_then(Value::as_object) else {
            return Vec::new();
        };

        table
            .iter()
            .filter_map(|(name, value)| match T::deserialize(value) {
                Ok(record) => Some((name.clone(), record)),
                Err(e) => {
                    warn!("skipping malformed {key}.{name} entry: {e}");
                    None
                }
            })
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SystemConfig {
        SystemConfig::from_store(ConfigStore::empty("/unused/.ddt-system.json"))
    }

    #[test]
    fn tools_path_round_trips_through_store() {
        let mut config = config();
        assert_eq!(config.tools_path(), None);

        config.set_tools_path(Utf8Path::new("/opt/ddt"));
        assert_eq!(config.tools_path(), Some(Utf8PathBuf::from("/opt/ddt")));
        assert_eq!(config.store().get_str("path.tools"), Some("/opt/ddt"));
    }

    #[test]
    fn project_path_falls_back_to_tools_parent() {
        let mut config = config();
        config.set_tools_path(Utf8Path::new("/home/user/workspace/ddt"));
        assert_eq!(
            config.project_path(),
            Some(Utf8PathBuf::from("/home/user/workspace"))
        );

        config.set_project_path(Utf8Path::new("/srv/projects"));
        assert_eq!(config.project_path(), Some(Utf8PathBuf::from("/srv/projects")));
    }

    #[test]
    fn add_and_remove_extension() {
        let mut config = config();
        assert!(config.add_extension("proxy", "git@example.com:proxy.git", "/opt/ext/proxy"));

        assert_eq!(
            config.extensions(),
            vec![(
                "proxy".to_owned(),
                Extension {
                    url: "git@example.com:proxy.git".to_owned(),
                    path: "/opt/ext/proxy".to_owned(),
                }
            )]
        );

        assert!(config.remove_extension("proxy"));
        assert!(!config.remove_extension("proxy"));
        assert!(config.extensions().is_empty());
    }

    #[test]
    fn records_are_stored_as_plain_objects() {
        let mut config = config();
        config.add_extension("proxy", "u", "p");
        config.add_project("api", "g", "main");

        assert_eq!(
            config.store().get("extensions.proxy"),
            Some(&json!({ "url": "u", "path": "p" }))
        );
        assert_eq!(
            config.store().get("projects.api"),
            Some(&json!({ "git": "g", "branch": "main" }))
        );
    }

    #[test]
    fn add_and_remove_project() {
        let mut config = config();
        assert!(!config.has_project("api"));
        assert!(config.add_project("api", "git@example.com:api.git", "main"));
        assert!(config.has_project("api"));

        assert!(config.remove_project("api"));
        assert!(!config.has_project("api"));
        assert!(config.remove_project("api"), "removing twice still leaves it absent");
    }

    #[test]
    fn malformed_records_are_skipped() {
        let mut config = config();
        config.store_mut().set("projects.broken", json!("not an object"));
        config.add_project("api", "g", "b");

        let names: Vec<String> = config.projects().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["api"]);
    }

    #[test]
    fn description_reads_top_level_key() {
        let mut config = config();
        config.store_mut().set("description", "workstation");
        assert_eq!(config.description(), Some("workstation"));
    }
}
