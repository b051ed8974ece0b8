//! In-memory key-value backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::trace;

use super::KeyValueStore;
use crate::error::{Error, Result};

/// A key-value store held in process memory.
///
/// Faults can be switched on at runtime to exercise failure handling:
///
/// - `fail_reads`: every `get` returns an error.
/// - `fail_writes`: every `set` and `remove` returns an error.
/// - `drop_writes`: `set` and `remove` report success but change nothing,
///   the way a concurrent writer overwriting our result would look.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    drop_writes: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `key = value`.
    #[must_use]
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut data = HashMap::new();
        data.insert(key.into(), value.into());
        Self {
            data: RwLock::new(data),
            ..Self::default()
        }
    }

    /// Make every read fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write and remove fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Silently discard writes and removes while reporting success.
    pub fn set_drop_writes(&self, drop: bool) {
        self.drop_writes.store(drop, Ordering::SeqCst);
    }

    /// Read a value directly, bypassing fault injection.
    pub async fn peek(&self, key: &str) -> Option<String> {
        self.data.read().await.get(key).cloned()
    }

    /// Number of keys currently held.
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    /// Check if no keys are held.
    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }

    fn check_write(&self, key: &str, op: &str) -> Result<bool> {
        if self.fail_writes.load(Ordering::SeqCst) {
            let message = format!("injected {op} failure");
            return Err(if op == "remove" {
                Error::backend_remove(key, message)
            } else {
                Error::backend_write(key, message)
            });
        }
        Ok(!self.drop_writes.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::backend_read(key, "injected read failure"));
        }
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.check_write(key, "write")? {
            self.data
                .write()
                .await
                .insert(key.to_string(), value.to_string());
        } else {
            trace!(key, "dropping write");
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        if self.check_write(key, "remove")? {
            self.data.write().await.remove(key);
        } else {
            trace!(key, "dropping remove");
        }
        Ok(())
    }
}
