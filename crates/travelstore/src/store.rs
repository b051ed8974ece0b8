//! The travel entry store.
//!
//! [`EntryStore`] keeps the whole collection as one JSON array under a
//! single key of a [`KeyValueStore`]. Every mutation reads the full
//! collection, rewrites it, and then reads it back to confirm its own
//! postcondition. The backend has no transactions, so that verification
//! read is best effort: another writer can still slip in between the write
//! and the check.
//!
//! Rewriting the whole collection on every mutation puts a ceiling on how
//! many entries this store handles comfortably. That is accepted for the
//! size of a personal travel journal.
//!
//! No operation here returns an error. Failures are logged and turned into
//! `false`, an empty list, zero or `None`. A verification mismatch is
//! reported as failure and the write that caused it is left in place.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt::Display;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use crate::entry::{generate_entry_id, TravelEntry};
use crate::error::Result;
use crate::storage::KeyValueStore;
use crate::validate;

/// Default storage key for the collection.
pub const DEFAULT_ENTRIES_KEY: &str = "entries";

/// How mutations are isolated from one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyMode {
    /// No isolation. Concurrent mutations may overwrite each other; the
    /// verification read catches only violations of an operation's own
    /// postcondition.
    #[default]
    BestEffort,
    /// Mutations issued through the same store run one at a time. Writers
    /// in other processes or other store instances are not covered.
    Serialized,
}

impl std::fmt::Display for ConsistencyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BestEffort => write!(f, "best_effort"),
            Self::Serialized => write!(f, "serialized"),
        }
    }
}

/// Read-only report about the stored collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreDiagnostics {
    /// The storage key inspected.
    pub key: String,
    /// Whether the key currently exists in the backend.
    pub key_present: bool,
    /// Number of entries a read would return.
    pub entry_count: usize,
    /// Size of the raw stored value in bytes.
    pub serialized_bytes: usize,
    /// Whether the raw value decodes into a valid collection.
    /// An absent key counts as valid.
    pub valid: bool,
    /// Smallest `createdAt` in the collection.
    pub oldest_created_at: Option<f64>,
    /// Largest `createdAt` in the collection.
    pub newest_created_at: Option<f64>,
    /// BLAKE3 digest of the raw stored value.
    pub digest: Option<String>,
    /// Set when the backend could not be read.
    pub error: Option<String>,
}

/// CRUD engine for travel entries over a key-value backend.
///
/// Ids are unique after every successful mutation. Another client of the
/// same key may have stored several entries under one id; reads return
/// them as stored, but `insert`, `update` and `delete` first keep the id on
/// the newest copy and give the others freshly generated ids, which the
/// write-back then persists.
#[derive(Debug)]
pub struct EntryStore {
    backend: Arc<dyn KeyValueStore>,
    key: String,
    mode: ConsistencyMode,
    write_lock: Mutex<()>,
}

impl EntryStore {
    /// Create a store over `backend` using the default key and best-effort
    /// consistency.
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::with_options(backend, DEFAULT_ENTRIES_KEY, ConsistencyMode::default())
    }

    /// Create a store with an explicit key and consistency mode.
    #[must_use]
    pub fn with_options(
        backend: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        mode: ConsistencyMode,
    ) -> Self {
        Self {
            backend,
            key: key.into(),
            mode,
            write_lock: Mutex::new(()),
        }
    }

    /// The storage key holding the collection.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The consistency mode in effect.
    #[must_use]
    pub fn mode(&self) -> ConsistencyMode {
        self.mode
    }

    /// Read every stored entry, newest `createdAt` first.
    ///
    /// An absent key, an undecodable value, or a collection containing any
    /// invalid entry all read as empty.
    pub async fn read_all(&self) -> Vec<TravelEntry> {
        match self.try_read_all().await {
            Ok(entries) => entries,
            Err(e) => {
                error!(key = %self.key, error = %e, "Failed to read entries");
                Vec::new()
            }
        }
    }

    /// Insert `entry`.
    ///
    /// If its id is already taken, the stored copy gets a freshly generated
    /// id. `entry` itself is never modified: use the returned record, which
    /// is what was actually stored. Returns `None` if the entry is invalid,
    /// the backend fails, or the write could not be verified.
    pub async fn insert(&self, entry: &TravelEntry) -> Option<TravelEntry> {
        let _guard = self.lock_for_write().await;
        self.try_insert(entry)
            .await
            .unwrap_or_else(|e| fail("insert", &entry.id, &e, None))
    }

    /// Delete the entry with `id`. Returns `false` if it does not exist or
    /// its absence could not be confirmed.
    pub async fn delete(&self, id: &str) -> bool {
        let _guard = self.lock_for_write().await;
        self.try_delete(id)
            .await
            .unwrap_or_else(|e| fail("delete", id, &e, false))
    }

    /// Replace the stored entry that has `entry.id` with `entry`.
    ///
    /// Returns `false` if the entry is invalid, no entry has that id, or the
    /// replacement could not be confirmed.
    pub async fn update(&self, entry: &TravelEntry) -> bool {
        let _guard = self.lock_for_write().await;
        self.try_update(entry)
            .await
            .unwrap_or_else(|e| fail("update", &entry.id, &e, false))
    }

    /// Remove the whole collection. Clearing an empty store succeeds.
    pub async fn clear(&self) -> bool {
        let _guard = self.lock_for_write().await;
        self.try_clear()
            .await
            .unwrap_or_else(|e| fail("clear", &self.key, &e, false))
    }

    /// Number of stored entries.
    pub async fn count(&self) -> usize {
        self.read_all().await.len()
    }

    /// Fetch the entry with `id`.
    pub async fn get_by_id(&self, id: &str) -> Option<TravelEntry> {
        self.read_all().await.into_iter().find(|e| e.id == id)
    }

    /// The `limit` most recent entries.
    pub async fn recent(&self, limit: usize) -> Vec<TravelEntry> {
        let mut entries = self.read_all().await;
        entries.truncate(limit);
        entries
    }

    /// Entries whose title, notes, address or tags contain `query`,
    /// ignoring case. An empty query matches everything.
    pub async fn search(&self, query: &str) -> Vec<TravelEntry> {
        let needle = query.to_lowercase();
        self.read_all()
            .await
            .into_iter()
            .filter(|e| matches_query(e, &needle))
            .collect()
    }

    /// Entries tagged with `tag`, ignoring ASCII case.
    pub async fn with_tag(&self, tag: &str) -> Vec<TravelEntry> {
        self.read_all()
            .await
            .into_iter()
            .filter(|e| e.has_tag(tag))
            .collect()
    }

    /// Summarize the stored collection without modifying it.
    pub async fn diagnostics(&self) -> StoreDiagnostics {
        match self.backend.get(&self.key).await {
            Ok(raw) => self.describe(raw.as_deref()),
            Err(e) => {
                error!(key = %self.key, error = %e, "Failed to read entries for diagnostics");
                StoreDiagnostics {
                    key: self.key.clone(),
                    error: Some(e.to_string()),
                    ..StoreDiagnostics::default()
                }
            }
        }
    }

    async fn lock_for_write(&self) -> Option<MutexGuard<'_, ()>> {
        match self.mode {
            ConsistencyMode::BestEffort => None,
            ConsistencyMode::Serialized => Some(self.write_lock.lock().await),
        }
    }

    async fn try_read_all(&self) -> Result<Vec<TravelEntry>> {
        let Some(raw) = self.backend.get(&self.key).await? else {
            debug!(key = %self.key, "No stored entries");
            return Ok(Vec::new());
        };

        let mut entries = decode_collection(&raw).unwrap_or_default();
        entries.sort_by(newest_first);
        debug!(key = %self.key, count = entries.len(), "Read entries");
        Ok(entries)
    }

    async fn read_for_write(&self) -> Result<Vec<TravelEntry>> {
        let mut entries = self.try_read_all().await?;
        reassign_duplicate_ids(&mut entries);
        Ok(entries)
    }

    async fn write_all(&self, entries: &[TravelEntry]) -> Result<()> {
        let encoded = serde_json::to_string(entries)?;
        self.backend.set(&self.key, &encoded).await?;
        debug!(key = %self.key, count = entries.len(), bytes = encoded.len(), "Wrote entries");
        Ok(())
    }

    async fn try_insert(&self, entry: &TravelEntry) -> Result<Option<TravelEntry>> {
        if !validate::validate_entry(entry) {
            warn!(id = %entry.id, "Refusing to insert invalid entry");
            return Ok(None);
        }

        let mut entries = self.read_for_write().await?;
        let mut stored = entry.clone();

        {
            let taken: HashSet<&str> = entries.iter().map(|e| e.id.as_str()).collect();
            if taken.contains(stored.id.as_str()) {
                let mut fresh = generate_entry_id();
                while taken.contains(fresh.as_str()) {
                    fresh = generate_entry_id();
                }
                info!(original = %stored.id, assigned = %fresh, "Entry id collision, assigned new id");
                stored.id = fresh;
            }
        }

        entries.push(stored.clone());
        self.write_all(&entries).await?;

        let confirmed = self
            .try_read_all()
            .await?
            .iter()
            .any(|e| e.id == stored.id);
        if !confirmed {
            error!(id = %stored.id, "Insert not visible after write");
            return Ok(None);
        }

        info!(id = %stored.id, "Inserted entry");
        Ok(Some(stored))
    }

    async fn try_delete(&self, id: &str) -> Result<bool> {
        let entries = self.read_for_write().await?;
        if !entries.iter().any(|e| e.id == id) {
            warn!(id, "Entry to delete not found");
            return Ok(false);
        }

        let remaining: Vec<TravelEntry> = entries.into_iter().filter(|e| e.id != id).collect();
        self.write_all(&remaining).await?;

        if self.try_read_all().await?.iter().any(|e| e.id == id) {
            error!(id, "Deleted entry still present after write");
            return Ok(false);
        }

        info!(id, "Deleted entry");
        Ok(true)
    }

    async fn try_update(&self, entry: &TravelEntry) -> Result<bool> {
        if !validate::validate_entry(entry) {
            warn!(id = %entry.id, "Refusing to update with invalid entry");
            return Ok(false);
        }

        let mut entries = self.read_for_write().await?;
        let Some(slot) = entries.iter_mut().find(|e| e.id == entry.id) else {
            warn!(id = %entry.id, "Entry to update not found");
            return Ok(false);
        };
        slot.clone_from(entry);
        self.write_all(&entries).await?;

        #[allow(clippy::float_cmp)]
        let confirmed = self
            .try_read_all()
            .await?
            .iter()
            .any(|e| e.id == entry.id && e.created_at == entry.created_at);
        if !confirmed {
            error!(id = %entry.id, "Updated entry not visible after write");
            return Ok(false);
        }

        info!(id = %entry.id, "Updated entry");
        Ok(true)
    }

    async fn try_clear(&self) -> Result<bool> {
        self.backend.remove(&self.key).await?;

        let remaining = self.try_read_all().await?.len();
        if remaining > 0 {
            error!(key = %self.key, remaining, "Entries still present after clear");
            return Ok(false);
        }

        info!(key = %self.key, "Cleared entries");
        Ok(true)
    }

    fn describe(&self, raw: Option<&str>) -> StoreDiagnostics {
        let Some(raw) = raw else {
            return StoreDiagnostics {
                key: self.key.clone(),
                valid: true,
                ..StoreDiagnostics::default()
            };
        };

        let decoded = decode_collection(raw);
        let entries = decoded.as_deref().unwrap_or_default();
        let created = entries.iter().map(|e| e.created_at);

        StoreDiagnostics {
            key: self.key.clone(),
            key_present: true,
            entry_count: entries.len(),
            serialized_bytes: raw.len(),
            valid: decoded.is_some(),
            oldest_created_at: created.clone().reduce(f64::min),
            newest_created_at: created.reduce(f64::max),
            digest: Some(blake3::hash(raw.as_bytes()).to_hex().to_string()),
            error: None,
        }
    }
}

/// Decode and validate a stored collection. `None` means the value is not
/// trustworthy as a whole.
fn decode_collection(raw: &str) -> Option<Vec<TravelEntry>> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, bytes = raw.len(), "Stored entries are not valid JSON");
            return None;
        }
    };

    if !validate::is_travel_entry_collection(&value) {
        warn!("Stored entries failed validation, treating collection as empty");
        return None;
    }

    match serde_json::from_value(value) {
        Ok(entries) => Some(entries),
        Err(e) => {
            warn!(error = %e, "Stored entries could not be decoded");
            None
        }
    }
}

/// Give every repeated id after its first occurrence a fresh one.
fn reassign_duplicate_ids(entries: &mut [TravelEntry]) {
    let mut taken: HashSet<String> = entries.iter().map(|e| e.id.clone()).collect();
    let mut seen = HashSet::new();

    for entry in entries.iter_mut() {
        if seen.insert(entry.id.clone()) {
            continue;
        }
        let mut fresh = generate_entry_id();
        while taken.contains(&fresh) {
            fresh = generate_entry_id();
        }
        warn!(original = %entry.id, assigned = %fresh, "Duplicate stored id, assigned new id");
        taken.insert(fresh.clone());
        seen.insert(fresh.clone());
        entry.id = fresh;
    }
}

fn newest_first(a: &TravelEntry, b: &TravelEntry) -> Ordering {
    b.created_at.total_cmp(&a.created_at)
}

fn matches_query(entry: &TravelEntry, needle: &str) -> bool {
    let contains = |s: &str| s.to_lowercase().contains(needle);
    contains(&entry.address)
        || entry.title.as_deref().is_some_and(contains)
        || entry.notes.as_deref().is_some_and(contains)
        || entry
            .tags
            .as_deref()
            .is_some_and(|tags| tags.iter().any(|t| contains(t.as_str())))
}

fn fail<T>(op: &str, subject: &str, err: &impl Display, default: T) -> T {
    error!(op, subject, error = %err, "Entry store operation failed");
    default
}
