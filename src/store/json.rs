//! JSON-file stores with atomic replacement.

use std::collections::{BTreeMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use super::{ResultCache, SeenStore, StoreError};
use crate::document::ExamResult;

/// File name of the seen set inside the state directory.
pub const SEEN_FILE_NAME: &str = "seen.json";

/// File name of the result cache inside the state directory.
pub const RESULTS_FILE_NAME: &str = "results.json";

/// [`SeenStore`] kept as a sorted JSON array of ids.
#[derive(Debug)]
pub struct JsonSeenStore {
    path: PathBuf,
}

impl JsonSeenStore {
    /// A store at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A store at [`SEEN_FILE_NAME`] inside `state_dir`.
    #[must_use]
    pub fn in_dir(state_dir: &Path) -> Self {
        Self::new(state_dir.join(SEEN_FILE_NAME))
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SeenStore for JsonSeenStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<HashSet<String>, StoreError> {
        let ids: Vec<String> = read_json(&self.path).await?.unwrap_or_default();
        debug!(count = ids.len(), "seen set loaded");
        Ok(ids.into_iter().collect())
    }

    #[instrument(skip(self, seen), fields(path = %self.path.display(), count = seen.len()))]
    async fn save(&self, seen: &HashSet<String>) -> Result<(), StoreError> {
        let mut ids: Vec<&String> = seen.iter().collect();
        ids.sort();
        write_json_atomic(&self.path, &ids).await
    }
}

/// [`ResultCache`] kept as one JSON object keyed by exam code.
#[derive(Debug)]
pub struct JsonResultCache {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonResultCache {
    /// A cache at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// A cache at [`RESULTS_FILE_NAME`] inside `state_dir`.
    #[must_use]
    pub fn in_dir(state_dir: &Path) -> Self {
        Self::new(state_dir.join(RESULTS_FILE_NAME))
    }

    async fn load_all(&self) -> Result<BTreeMap<String, ExamResult>, StoreError> {
        Ok(read_json(&self.path).await?.unwrap_or_default())
    }
}

#[async_trait]
impl ResultCache for JsonResultCache {
    async fn get(&self, code: &str) -> Result<Option<ExamResult>, StoreError> {
        Ok(self.load_all().await?.remove(code))
    }

    #[instrument(skip(self, result), fields(path = %self.path.display()))]
    async fn put(&self, code: &str, result: &ExamResult) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut all = self.load_all().await?;
        all.insert(code.to_string(), result.clone());
        write_json_atomic(&self.path, &all).await
    }
}

/// Reads and decodes `path`; a missing file is `None`.
async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes `value` to a sibling temp file, then renames it over `path`.
async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let io_error = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
    }

    let json = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, &json).await.map_err(io_error)?;
    set_owner_only_permissions(&tmp_path).await.map_err(io_error)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(io_error)?;
    debug!(path = %path.display(), bytes = json.len(), "state written");
    Ok(())
}

#[cfg(unix)]
async fn set_owner_only_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await
}

#[cfg(not(unix))]
async fn set_owner_only_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::document::extract_result;

    use tempfile::TempDir;

    fn ids(values: &[&str]) -> HashSet<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_seen_store_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonSeenStore::in_dir(dir.path());
        let seen = tokio_test::block_on(store.load()).unwrap();
        assert!(seen.is_empty());
    }

    #[test]
    fn test_seen_store_round_trip_creates_dirs() {
        let dir = TempDir::new().unwrap();
        let store = JsonSeenStore::in_dir(&dir.path().join("nested/state"));

        tokio_test::block_on(store.save(&ids(&["20", "3", "100"]))).unwrap();
        let loaded = tokio_test::block_on(store.load()).unwrap();
        assert_eq!(loaded, ids(&["20", "3", "100"]));

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let on_disk: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(on_disk, ["100", "20", "3"]);
        assert!(!store.path().with_file_name("seen.json.tmp").exists());
    }

    #[test]
    fn test_seen_store_corrupt_file_is_error_and_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SEEN_FILE_NAME);
        std::fs::write(&path, "{not json").unwrap();

        let result = tokio_test::block_on(JsonSeenStore::new(&path).load());
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{not json");
    }

    #[cfg(unix)]
    #[test]
    fn test_seen_store_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = JsonSeenStore::in_dir(dir.path());
        tokio_test::block_on(store.save(&ids(&["1"]))).unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_result_cache_put_get() {
        let dir = TempDir::new().unwrap();
        let cache = JsonResultCache::in_dir(dir.path());
        assert_eq!(cache.get("A20-2025-III").await.unwrap(), None);

        let result = extract_result("A20-Probabilitas (A20) = 81.5\nPeriode III Tahun 2025");
        cache.put("A20-2025-III", &result).await.unwrap();
        cache
            .put("A30-2025-III", &extract_result("A30-Ekonomi (A30) = 40"))
            .await
            .unwrap();

        assert_eq!(cache.get("A20-2025-III").await.unwrap(), Some(result));
        let reopened = JsonResultCache::in_dir(dir.path());
        let other = reopened.get("A30-2025-III").await.unwrap().unwrap();
        assert_eq!(other.passed, Some(false));
    }
}
