//! File-backed JSON document addressed by dot-separated paths.
//!
//! A [`ConfigStore`] is loaded once, mutated in memory, and persisted only
//! when [`ConfigStore::write`] is called. Keys such as `path.tools` address
//! nested objects one segment at a time.
//!
//! Deleting a key removes the leaf only. Ancestor objects left empty by a
//! delete stay in the document.

use crate::error::{ConfigError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde_json::{Map, Value};

/// Separator between the segments of a document key.
pub const KEY_SEPARATOR: char = '.';

/// A JSON object document bound to the file it was loaded from.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigStore {
    path: Utf8PathBuf,
    document: Map<String, Value>,
}

impl ConfigStore {
    /// Creates an empty store that will persist to `path`.
    #[must_use]
    pub fn empty(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            document: Map::new(),
        }
    }

    /// Loads the document stored at `path`.
    ///
    /// A missing file, or one holding only whitespace, yields an empty
    /// document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read and
    /// [`ConfigError::Invalid`] if its bytes do not decode to a JSON object.
    ///
    /// # Examples
    ///
    /// ```
    /// use ddt_common::ConfigStore;
    ///
    /// let dir = tempfile::tempdir()?;
    /// let path = camino::Utf8PathBuf::try_from(dir.path().join("config.json"))?;
    /// std::fs::write(&path, r#"{"path": {"tools": "/opt/ddt"}}"#)?;
    ///
    /// let store = ConfigStore::load(&path)?;
    /// assert_eq!(store.get_str("path.tools"), Some("/opt/ddt"));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load(path: impl Into<Utf8PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            debug!("config file {path} does not exist, starting from an empty document");
            return Ok(Self::empty(path));
        }

        let content = std::fs::read(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        if content.trim_ascii().is_empty() {
            return Ok(Self::empty(path));
        }

        match serde_json::from_slice::<Map<String, Value>>(&content) {
            Ok(document) => Ok(Self { path, document }),
            Err(source) => Err(ConfigError::Invalid { path, source }),
        }
    }

    /// Returns the file this store persists to.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Returns the whole document.
    #[must_use]
    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    /// Looks up the value at `key`.
    ///
    /// Returns `None` when any segment is missing or an intermediate value is
    /// not an object.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut segments = key.split(KEY_SEPARATOR);
        let first = segments.next()?;
        let mut current = self.document.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Looks up a string value at `key`.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Returns `true` when `key` resolves to a non-null value.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some_and(|value| !value.is_null())
    }

    /// Stores `value` at `key`, creating intermediate objects as needed.
    ///
    /// An intermediate segment that currently holds a scalar is replaced by
    /// an object.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        let segments: Vec<&str> = key.split(KEY_SEPARATOR).collect();
        insert_at(&mut self.document, &segments, value.into());
    }

    /// Removes the value at `key`, returning whether it existed.
    pub fn delete(&mut self, key: &str) -> bool {
        let segments: Vec<&str> = key.split(KEY_SEPARATOR).collect();
        remove_at(&mut self.document, &segments)
    }

    /// Serialises the document back to its source file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if the document cannot be encoded and
    /// [`ConfigError::Write`] if the file (or its parent directory) cannot be
    /// written.
    pub fn write(&self) -> Result<()> {
        let mut json = serde_json::to_string_pretty(&self.document)
            .map_err(|source| ConfigError::Serialize { source })?;
        json.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: self.path.clone(),
                source,
            })?;
        }

        std::fs::write(&self.path, json).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!("wrote config file {}", self.path);
        Ok(())
    }
}

fn insert_at(table: &mut Map<String, Value>, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [leaf] => {
            table.insert((*leaf).to_owned(), value);
        }
        [head, rest @ ..] => {
            let child = table
                .entry((*head).to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(map) = child {
                insert_at(map, rest, value);
            }
        }
    }
}

fn remove_at(table: &mut Map<String, Value>, segments: &[&str]) -> bool {
    match segments {
        [] => false,
        [leaf] => table.shift_remove(*leaf).is_some(),
        [head, rest @ ..] => match table.get_mut(*head) {
            Some(Value::Object(map)) => remove_at(map, rest),
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use tempfile::TempDir;

    struct TempConfig {
        _temp: TempDir,
        path: Utf8PathBuf,
    }

    #[fixture]
    fn temp_config() -> TempConfig {
        let temp = TempDir::new().expect("failed to create temp dir");
        let path = Utf8PathBuf::try_from(temp.path().join(".ddt-system.json"))
            .expect("non-UTF8 temp path");
        TempConfig { _temp: temp, path }
    }

    fn store_with(document: Value) -> ConfigStore {
        let Value::Object(document) = document else {
            panic!("test document must be an object");
        };
        ConfigStore {
            path: Utf8PathBuf::from("/unused.json"),
            document,
        }
    }

    #[rstest]
    #[case::top_level("description", Some(json!("tools")))]
    #[case::nested("path.tools", Some(json!("/opt/ddt")))]
    #[case::missing_leaf("path.projects", None)]
    #[case::missing_intermediate("extensions.proxy.url", None)]
    #[case::through_scalar("description.length", None)]
    fn get_traverses_segments(#[case] key: &str, #[case] expected: Option<Value>) {
        let store = store_with(json!({
            "description": "tools",
            "path": { "tools": "/opt/ddt" },
        }));
        assert_eq!(store.get(key), expected.as_ref());
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let mut store = ConfigStore::empty("/unused.json");
        store.set("extensions.proxy.url", "https://example.com/proxy.git");

        assert_eq!(
            store.document(),
            store_with(json!({
                "extensions": { "proxy": { "url": "https://example.com/proxy.git" } }
            }))
            .document()
        );
    }

    #[test]
    fn set_overwrites_existing_value() {
        let mut store = store_with(json!({ "path": { "tools": "/old" } }));
        store.set("path.tools", "/new");
        assert_eq!(store.get_str("path.tools"), Some("/new"));
    }

    #[test]
    fn set_replaces_scalar_intermediate_with_object() {
        let mut store = store_with(json!({ "path": "/flat" }));
        store.set("path.tools", "/opt/ddt");
        assert_eq!(store.get("path"), Some(&json!({ "tools": "/opt/ddt" })));
    }

    #[test]
    fn delete_reports_whether_key_existed() {
        let mut store = store_with(json!({ "path": { "tools": "/opt/ddt" } }));

        assert!(store.delete("path.tools"));
        assert!(!store.delete("path.tools"));
        assert!(!store.delete("missing.key"));
    }

    #[test]
    fn delete_keeps_empty_ancestors() {
        let mut store = store_with(json!({ "projects": { "api": { "git": "x" } } }));

        assert!(store.delete("projects.api"));
        assert_eq!(store.get("projects"), Some(&json!({})));
    }

    #[test]
    fn delete_preserves_sibling_order() {
        let mut store = store_with(json!({ "a": 1, "b": 2, "c": 3 }));
        store.delete("a");
        let keys: Vec<&str> = store.document().keys().map(String::as_str).collect();
        assert_eq!(keys, ["b", "c"]);
    }

    #[test]
    fn has_treats_null_as_absent() {
        let store = store_with(json!({ "projects": { "api": null } }));
        assert!(!store.has("projects.api"));
        assert!(store.has("projects"));
    }

    #[rstest]
    fn load_missing_file_yields_empty_document(temp_config: TempConfig) {
        let store = ConfigStore::load(temp_config.path.clone()).expect("load missing file");
        assert!(store.document().is_empty());
        assert_eq!(store.path(), temp_config.path);
    }

    #[rstest]
    #[case::truncated(b"{\"path\": ")]
    #[case::not_an_object(b"[1, 2, 3]")]
    #[case::garbage(b"path.tools=/opt")]
    #[case::not_utf8(b"{\"a\": \"\xff\"}")]
    fn load_rejects_undecodable_content(temp_config: TempConfig, #[case] content: &[u8]) {
        std::fs::write(&temp_config.path, content).expect("write config");

        let err = ConfigStore::load(temp_config.path.clone()).expect_err("expected invalid");
        assert!(matches!(err, ConfigError::Invalid { ref path, .. } if *path == temp_config.path));
    }

    #[rstest]
    fn write_then_load_round_trips(temp_config: TempConfig) {
        let mut store = ConfigStore::empty(temp_config.path.clone());
        store.set("path.tools", "/opt/ddt");
        store.set("path.projects", "/opt");
        store.set("extensions.proxy", json!({ "url": "u", "path": "p" }));
        store.set("projects.api", json!({ "git": "g", "branch": "main" }));
        store.write().expect("write config");

        let reloaded = ConfigStore::load(temp_config.path.clone()).expect("reload config");
        assert_eq!(reloaded, store);
    }

    #[rstest]
    fn mutations_are_not_flushed_without_write(temp_config: TempConfig) {
        let mut store = ConfigStore::empty(temp_config.path.clone());
        store.set("path.tools", "/opt/ddt");

        assert!(!temp_config.path.exists());
    }

    #[rstest]
    fn write_failure_is_reported(temp_config: TempConfig) {
        std::fs::create_dir_all(&temp_config.path).expect("create blocking directory");

        let store = ConfigStore::empty(temp_config.path.clone());
        let err = store.write().expect_err("expected write failure");
        assert!(matches!(err, ConfigError::Write { .. }));
    }
}
