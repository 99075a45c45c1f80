//! Behaviour-driven tests for the dot-path configuration store.

use camino::{Utf8Path, Utf8PathBuf};
use ddt_common::{ConfigError, SystemConfig};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use tempfile::TempDir;

#[derive(Default)]
struct StoreWorld {
    // Keep the directory alive for the lifetime of the scenario.
    _temp_dir: RefCell<Option<TempDir>>,
    path: RefCell<Option<Utf8PathBuf>>,
    config: RefCell<Option<SystemConfig>>,
    load_error: RefCell<Option<ConfigError>>,
    read_value: RefCell<Option<Option<serde_json::Value>>>,
}

impl StoreWorld {
    fn path(&self) -> Utf8PathBuf {
        self.path.borrow().clone().expect("config path set")
    }

    fn load(&self) {
        match SystemConfig::load(self.path()) {
            Ok(config) => {
                self.config.replace(Some(config));
                self.load_error.replace(None);
            }
            Err(err) => {
                self.config.replace(None);
                self.load_error.replace(Some(err));
            }
        }
    }

    fn with_config<R>(&self, f: impl FnOnce(&mut SystemConfig) -> R) -> R {
        let mut config = self.config.borrow_mut();
        f(config.as_mut().expect("configuration loaded"))
    }
}

#[fixture]
fn store_world() -> StoreWorld {
    StoreWorld::default()
}

fn prepare_file(store_world: &StoreWorld, content: Option<&str>) {
    let temp = TempDir::new().expect("create temp dir");
    let path = Utf8PathBuf::try_from(temp.path().join(".ddt-system.json")).expect("UTF-8 path");
    if let Some(content) = content {
        std::fs::write(&path, content).expect("write config file");
    }
    store_world.path.replace(Some(path));
    store_world._temp_dir.replace(Some(temp));
}

#[given("an empty configuration file")]
fn given_empty_file(store_world: &StoreWorld) {
    prepare_file(store_world, None);
    store_world.load();
}

#[given("a configuration file containing \"{content}\"")]
fn given_file_with_content(store_world: &StoreWorld, content: String) {
    prepare_file(store_world, Some(&content));
}

#[when("the tools path is set to \"{path}\"")]
fn when_tools_path_set(store_world: &StoreWorld, path: String) {
    store_world.with_config(|config| config.set_tools_path(Utf8Path::new(&path)));
}

#[when("a project named \"{name}\" is registered")]
fn when_project_registered(store_world: &StoreWorld, name: String) {
    let added = store_world
        .with_config(|config| config.add_project(&name, "git@example.com:api.git", "main"));
    assert!(added);
}

#[when("the configuration is written and reloaded")]
fn when_written_and_reloaded(store_world: &StoreWorld) {
    store_world
        .with_config(|config| config.write())
        .expect("write configuration");
    store_world.load();
}

#[when("the configuration is reloaded without writing")]
fn when_reloaded_without_writing(store_world: &StoreWorld) {
    store_world.load();
}

#[when("the configuration is loaded")]
fn when_loaded(store_world: &StoreWorld) {
    store_world.load();
}

#[when("the key \"{key}\" is read")]
fn when_key_read(store_world: &StoreWorld, key: String) {
    let value = store_world.with_config(|config| config.store().get(&key).cloned());
    store_world.read_value.replace(Some(value));
}

#[then("the tools path reads \"{expected}\"")]
fn then_tools_path_reads(store_world: &StoreWorld, expected: String) {
    let tools = store_world.with_config(|config| config.tools_path());
    assert_eq!(tools, Some(Utf8PathBuf::from(expected)));
}

#[then("the tools path is absent")]
fn then_tools_path_absent(store_world: &StoreWorld) {
    let tools = store_world.with_config(|config| config.tools_path());
    assert_eq!(tools, None);
}

#[then("the project \"{name}\" is registered")]
fn then_project_registered(store_world: &StoreWorld, name: String) {
    assert!(store_world.with_config(|config| config.has_project(&name)));
}

#[then("the value is absent")]
fn then_value_absent(store_world: &StoreWorld) {
    let value = store_world.read_value.borrow();
    assert_eq!(*value, Some(None));
}

#[then("loading fails with an invalid configuration error")]
fn then_invalid_error(store_world: &StoreWorld) {
    let error = store_world.load_error.borrow();
    assert!(
        matches!(*error, Some(ConfigError::Invalid { .. })),
        "expected ConfigError::Invalid, got {error:?}"
    );
}

#[scenario(path = "tests/features/config_store.feature", index = 0)]
fn scenario_round_trip(store_world: StoreWorld) {
    let _ = store_world;
}

#[scenario(path = "tests/features/config_store.feature", index = 1)]
fn scenario_missing_intermediate(store_world: StoreWorld) {
    let _ = store_world;
}

#[scenario(path = "tests/features/config_store.feature", index = 2)]
fn scenario_invalid_file(store_world: StoreWorld) {
    let _ = store_world;
}

#[scenario(path = "tests/features/config_store.feature", index = 3)]
fn scenario_no_autosave(store_world: StoreWorld) {
    let _ = store_world;
}
