//! Error types for travelstore.
//!
//! These errors circulate inside the crate and across the [`KeyValueStore`]
//! seam. The public [`EntryStore`] operations never return them: every
//! failure is logged and collapsed into a safe default at that boundary.
//!
//! [`KeyValueStore`]: crate::storage::KeyValueStore
//! [`EntryStore`]: crate::store::EntryStore

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for travelstore operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Backend Errors ===
    /// Reading a key from the key-value backend failed.
    #[error("failed to read key '{key}': {message}")]
    BackendRead {
        /// The key being read.
        key: String,
        /// Description of what went wrong.
        message: String,
    },

    /// Writing a key to the key-value backend failed.
    #[error("failed to write key '{key}': {message}")]
    BackendWrite {
        /// The key being written.
        key: String,
        /// Description of what went wrong.
        message: String,
    },

    /// Removing a key from the key-value backend failed.
    #[error("failed to remove key '{key}': {message}")]
    BackendRemove {
        /// The key being removed.
        key: String,
        /// Description of what went wrong.
        message: String,
    },

    /// A storage key is not usable by the backend.
    #[error("invalid storage key '{key}': {reason}")]
    InvalidKey {
        /// The rejected key.
        key: String,
        /// Why it was rejected.
        reason: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

}

/// A specialized Result type for travelstore operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a backend read error.
    #[must_use]
    pub fn backend_read(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendRead {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a backend write error.
    #[must_use]
    pub fn backend_write(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendWrite {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a backend remove error.
    #[must_use]
    pub fn backend_remove(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendRemove {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create an invalid key error.
    #[must_use]
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
