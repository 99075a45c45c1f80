//! Error types for configuration persistence.
//!
//! Loading and writing the configuration document never terminates the
//! process. Every failure is surfaced as a [`ConfigError`] so the calling tool
//! decides whether to abort and how to present the problem.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while loading or persisting a configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but does not contain a JSON object.
    #[error("the config file was invalid, it could not be decoded: '{path}': {source}")]
    Invalid {
        /// Path of the undecodable file.
        path: Utf8PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Reading the config file failed.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// File path that could not be read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serialising the document failed.
    #[error("failed to serialize config document: {source}")]
    Serialize {
        /// Underlying serialisation error.
        #[source]
        source: serde_json::Error,
    },

    /// Writing the config file failed.
    #[error("failed to write config file {path}: {source}")]
    Write {
        /// File path that could not be written.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Returns the config file path involved in the failure, when known.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::Invalid { path, .. } | Self::Read { path, .. } | Self::Write { path, .. } => {
                Some(path)
            }
            Self::Serialize { .. } => None,
        }
    }
}

/// Result type alias using [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
