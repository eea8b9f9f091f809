//! Result cache abstractions.
//!
//! Memoizes normalized pages by a stable key with a time-to-live.
//! Expiry is checked lazily on read; an entry is never served past its
//! expiry, and backends may evict early under pressure. An external
//! key-value store can satisfy the same contract; this crate ships an
//! in-memory backend and a local-disk backend.

pub mod disk;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::NormalizedPage;

// Re-export for convenience
pub use disk::DiskCache;
pub use memory::MemoryCache;

/// A cached normalized page with its freshness metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedPage {
    /// The normalized page as stored at put time.
    pub page: NormalizedPage,
    /// When the entry was created.
    pub cached_at: DateTime<Utc>,
    /// When the entry stops being servable.
    pub expires_at: DateTime<Utc>,
}

impl CachedPage {
    pub fn new(page: NormalizedPage, ttl: Duration) -> Self {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero());
        Self {
            page,
            cached_at: now,
            expires_at: now + ttl,
        }
    }

    /// Whether the entry may still be served.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Trait for result cache backends.
#[async_trait]
pub trait ResultCache: Send + Sync {
    /// Look up a fresh entry. Expired entries read as misses.
    async fn get(&self, key: &str) -> Result<Option<CachedPage>>;

    /// Store a page under the key with the given time-to-live.
    ///
    /// Overwrites any previous entry. Concurrent overwrites of the
    /// same key are benign: entries are idempotent recomputations.
    async fn put(&self, key: &str, page: NormalizedPage, ttl: Duration) -> Result<()>;

    /// Drop an entry ahead of its expiry.
    async fn invalidate(&self, key: &str) -> Result<()>;
}
