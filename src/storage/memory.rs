// src/storage/memory.rs

//! In-memory result cache backend.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::Result;
use crate::models::NormalizedPage;
use crate::storage::{CachedPage, ResultCache};

/// Process-local cache behind a read-write lock.
///
/// Read-mostly: lookups take the read lock; puts and the expired-entry
/// removal on read take the write lock. Stale-read-then-overwrite
/// races are acceptable since entries are idempotent recomputations of
/// the same key.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CachedPage>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.entries.read().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every expired entry. Not required for correctness, only
    /// for bounding memory on long-running processes.
    pub fn purge_expired(&self) {
        let now = Utc::now();
        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.retain(|_, entry| entry.is_fresh_at(now));
    }
}

#[async_trait]
impl ResultCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<CachedPage>> {
        {
            let entries = self.entries.read().expect("cache lock poisoned");
            match entries.get(key) {
                Some(entry) if entry.is_fresh_at(Utc::now()) => return Ok(Some(entry.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired: remove the dead entry.
        let mut entries = self.entries.write().expect("cache lock poisoned");
        if let Some(entry) = entries.get(key) {
            if !entry.is_fresh_at(Utc::now()) {
                entries.remove(key);
            }
        }
        Ok(None)
    }

    async fn put(&self, key: &str, page: NormalizedPage, ttl: Duration) -> Result<()> {
        let entry = CachedPage::new(page, ttl);
        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.remove(key);
        Ok(())
    }
}
