// src/storage/disk.rs

//! Local filesystem result cache backend.
//!
//! One JSON file per key under a root directory. Writes are atomic
//! (write to temp, then rename) so a concurrent reader never sees a
//! half-written entry. Unreadable or corrupt files read as misses:
//! the cache recomputes rather than fails.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::NormalizedPage;
use crate::storage::{CachedPage, ResultCache};

/// Disk-backed cache rooted at a directory.
#[derive(Debug, Clone)]
pub struct DiskCache {
    root_dir: PathBuf,
}

impl DiskCache {
    /// Create a new DiskCache rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a cache key.
    ///
    /// Keys are hex digests, so they are safe as file names.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(format!("{key}.json"))
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.root_dir).await?;

        let path = self.path(key);
        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl ResultCache for DiskCache {
    async fn get(&self, key: &str) -> Result<Option<CachedPage>> {
        let Some(bytes) = self.read_bytes(key).await? else {
            return Ok(None);
        };

        let entry: CachedPage = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("corrupt cache entry {key}: {e}");
                let _ = tokio::fs::remove_file(self.path(key)).await;
                return Ok(None);
            }
        };

        if !entry.is_fresh_at(Utc::now()) {
            let _ = tokio::fs::remove_file(self.path(key)).await;
            return Ok(None);
        }
        Ok(Some(entry))
    }

    async fn put(&self, key: &str, page: NormalizedPage, ttl: Duration) -> Result<()> {
        let entry = CachedPage::new(page, ttl);
        let bytes = serde_json::to_vec_pretty(&entry)?;
        self.write_bytes(key, &bytes).await
    }

    async fn invalidate(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_cache() -> (DiskCache, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir");
        let cache = DiskCache::new(temp_dir.path());
        (cache, temp_dir)
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let (cache, _dir) = create_test_cache();
        let page = NormalizedPage {
            has_next: true,
            ..NormalizedPage::default()
        };
        cache
            .put("abc123", page.clone(), Duration::from_secs(100))
            .await
            .unwrap();

        let cached = cache.get("abc123").await.unwrap().expect("hit");
        assert!(cached.page.has_next);
        assert_eq!(cached.page.records, page.records);
    }

    #[tokio::test]
    async fn zero_ttl_reads_as_miss_and_is_removed() {
        let (cache, dir) = create_test_cache();
        cache
            .put("dead", NormalizedPage::default(), Duration::ZERO)
            .await
            .unwrap();
        assert!(dir.path().join("dead.json").exists());

        assert!(cache.get("dead").await.unwrap().is_none());
        assert!(!dir.path().join("dead.json").exists());
    }

    #[tokio::test]
    async fn corrupt_entry_reads_as_miss() {
        let (cache, dir) = create_test_cache();
        std::fs::write(dir.path().join("bad.json"), b"{ not json").unwrap();
        assert!(cache.get("bad").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalidate_is_idempotent() {
        let (cache, _dir) = create_test_cache();
        cache
            .put("k", NormalizedPage::default(), Duration::from_secs(100))
            .await
            .unwrap();
        cache.invalidate("k").await.unwrap();
        cache.invalidate("k").await.unwrap();
        assert!(cache.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_creates_root_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("cache");
        let cache = DiskCache::new(&nested);
        cache
            .put("k", NormalizedPage::default(), Duration::from_secs(10))
            .await
            .unwrap();
        assert!(nested.join("k.json").exists());
    }
}
