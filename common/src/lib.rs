//! Shared configuration store for the ddt developer tools.
//!
//! The store is a JSON document on disk addressed with dot-separated keys
//! (`path.tools`, `projects.api.branch`). [`ConfigStore`] provides the generic
//! get/set/delete operations and [`SystemConfig`] layers the installation
//! record and extension/project registries on top.
//!
//! # Modules
//!
//! - [`error`] - Configuration load and persistence errors
//! - [`store`] - Dot-path addressed JSON document
//! - [`system`] - Typed system configuration facade

pub mod error;
pub mod store;
pub mod system;

pub use error::{ConfigError, Result};
pub use store::{ConfigStore, KEY_SEPARATOR};
pub use system::{DEFAULT_FILENAME, Extension, Project, SystemConfig};
