//! Directory-backed key-value backend.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info, warn};

use super::KeyValueStore;
use crate::error::{Error, Result};

/// File extension used for value files.
const VALUE_EXTENSION: &str = "json";

/// Characters allowed in a storage key.
const KEY_PATTERN: &str = r"^[A-Za-z0-9_.\-]+$";

/// A key-value store that keeps each key in its own file.
///
/// Key `k` lives at `<dir>/k.json`. Writes go to a temporary sibling first
/// and are renamed into place, so a reader never sees a half-written value.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();

        if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|source| Error::DirectoryCreate {
                    path: dir.clone(),
                    source,
                })?;
            info!("Created data directory at {}", dir.display());
        }

        debug!("Opened file store at {}", dir.display());
        Ok(Self { dir })
    }

    /// Get the data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the file path backing `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is not a valid storage key.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{VALUE_EXTENSION}")))
    }
}

/// Check that `key` can be used as a file name.
///
/// # Errors
///
/// Returns [`Error::InvalidKey`] for empty keys, keys starting with `.`, or
/// keys containing anything besides ASCII letters, digits, `_`, `.` and `-`.
#[allow(clippy::missing_panics_doc)]
pub fn validate_key(key: &str) -> Result<()> {
    static KEY_RE: OnceLock<Regex> = OnceLock::new();
    let re = KEY_RE.get_or_init(|| Regex::new(KEY_PATTERN).expect("valid key regex"));

    if key.starts_with('.') {
        return Err(Error::invalid_key(key, "must not start with '.'"));
    }
    if !re.is_match(key) {
        return Err(Error::invalid_key(
            key,
            "only ASCII letters, digits, '_', '.' and '-' are allowed",
        ));
    }
    Ok(())
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::backend_read(key, e.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension(format!("{VALUE_EXTENSION}.tmp"));

        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| Error::backend_write(key, e.to_string()))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                warn!(key, error = %cleanup, "Failed to remove {}", tmp.display());
            }
            return Err(Error::backend_write(key, e.to_string()));
        }

        debug!(key, bytes = value.len(), "Wrote {}", path.display());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key, "Removed {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::backend_remove(key, e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("entries").is_ok());
        assert!(validate_key("travel-entries_v1.bak").is_ok());

        assert!(validate_key("").is_err());
        assert!(validate_key(".hidden").is_err());
        assert!(validate_key("../escape").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key("with space").is_err());
    }

    #[tokio::test]
    async fn test_open_creates_directory() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("nested").join("data");

        let store = FileStore::open(&dir).await.unwrap();
        assert!(dir.is_dir());
        assert_eq!(store.dir(), dir);
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let temp = tempfile::tempdir().unwrap();
        let store = FileStore::open(temp.path()).await.unwrap();
        assert!(store.get("entries").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_get_remove() {
        let temp = tempfile::tempdir().unwrap();
        let store = FileStore::open(temp.path()).await.unwrap();

        store.set("entries", "[1,2]").await.unwrap();
        assert_eq!(store.get("entries").await.unwrap().as_deref(), Some("[1,2]"));
        assert!(temp.path().join("entries.json").is_file());
        assert!(!temp.path().join("entries.json.tmp").exists());

        store.remove("entries").await.unwrap();
        assert!(store.get("entries").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let temp = tempfile::tempdir().unwrap();
        let store = FileStore::open(temp.path()).await.unwrap();

        store.set("entries", "old").await.unwrap();
        store.set("entries", "new").await.unwrap();
        assert_eq!(store.get("entries").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_remove_missing_key_succeeds() {
        let temp = tempfile::tempdir().unwrap();
        let store = FileStore::open(temp.path()).await.unwrap();
        assert!(store.remove("entries").await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_key_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let store = FileStore::open(temp.path()).await.unwrap();

        let err = store.set("../outside", "x").await.unwrap_err();
        assert!(matches!(err, Error::InvalidKey { .. }));
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temp_file() {
        let temp = tempfile::tempdir().unwrap();
        let store = FileStore::open(temp.path()).await.unwrap();

        // A non-empty directory in the value's place makes the rename fail
        let blocker = temp.path().join("entries.json");
        std::fs::create_dir(&blocker).unwrap();
        std::fs::write(blocker.join("keep"), "x").unwrap();

        let err = store.set("entries", "[]").await.unwrap_err();
        assert!(matches!(err, Error::BackendWrite { .. }));
        assert!(!temp.path().join("entries.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_values_persist_across_reopen() {
        let temp = tempfile::tempdir().unwrap();
        {
            let store = FileStore::open(temp.path()).await.unwrap();
            store.set("entries", "[]").await.unwrap();
        }
        let reopened = FileStore::open(temp.path()).await.unwrap();
        assert_eq!(reopened.get("entries").await.unwrap().as_deref(), Some("[]"));
    }
}
