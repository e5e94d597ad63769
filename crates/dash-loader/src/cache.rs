//! Document and scene caches
//!
//! Two caches with different lifetimes:
//! - [`DocumentCache`]: one slot, last write wins, fresh for a short TTL so
//!   that back-to-back loads of the same dashboard share one fetch
//! - [`SceneCache`]: built scenes keyed by identity, reused while the
//!   document fingerprint is unchanged

use dash_scene::DashboardScene;
use dash_schema::RawDocument;
use moka::future::Cache;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Slot {
    key: String,
    document: RawDocument,
    stored_at: Instant,
}

/// Single-slot document cache with a TTL
#[derive(Debug)]
pub struct DocumentCache {
    slot: Mutex<Option<Slot>>,
    ttl: Duration,
}

impl DocumentCache {
    #[inline]
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            ttl,
        }
    }

    /// Cached document when the key matches and the entry is still fresh
    #[must_use]
    pub fn get(&self, key: &str) -> Option<RawDocument> {
        let slot = self.slot.lock();
        slot.as_ref()
            .filter(|s| s.key == key && s.stored_at.elapsed() < self.ttl)
            .map(|s| s.document.clone())
    }

    /// Overwrite the slot
    pub fn set(&self, key: impl Into<String>, document: RawDocument) {
        *self.slot.lock() = Some(Slot {
            key: key.into(),
            document,
            stored_at: Instant::now(),
        });
    }

    pub fn clear(&self) {
        *self.slot.lock() = None;
    }

    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Scenes keyed by dashboard identity
#[derive(Debug, Clone)]
pub struct SceneCache {
    inner: Cache<String, Arc<DashboardScene>>,
}

impl SceneCache {
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    #[must_use]
    pub async fn get(&self, identity: &str) -> Option<Arc<DashboardScene>> {
        self.inner.get(identity).await
    }

    /// Insert or atomically replace the entry for an identity
    pub async fn insert(&self, identity: impl Into<String>, scene: Arc<DashboardScene>) {
        self.inner.insert(identity.into(), scene).await;
    }

    pub async fn remove(&self, identity: &str) {
        self.inner.invalidate(identity).await;
    }

    pub fn clear(&self) {
        self.inner.invalidate_all();
    }

    #[must_use]
    pub async fn contains(&self, identity: &str) -> bool {
        self.inner.get(identity).await.is_some()
    }
}

impl Default for SceneCache {
    fn default() -> Self {
        Self::new(100)
    }
}
