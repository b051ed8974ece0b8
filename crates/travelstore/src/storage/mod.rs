//! Key-value persistence backends.
//!
//! [`KeyValueStore`] is the raw get/set/remove primitive the entry store sits
//! on. It offers no transactions: each call is independent and any of them
//! may fail. Two backends are provided:
//!
//! - [`MemoryStore`]: in-process map with switchable fault injection.
//! - [`FileStore`]: one file per key inside a data directory.

mod file;
mod memory;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::Result;

pub use file::{validate_key, FileStore};
pub use memory::MemoryStore;

/// An asynchronous string key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Fetch the value stored under `key`, or `None` if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be modified.
    async fn remove(&self, key: &str) -> Result<()>;
}
