use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use super::{CacheBackend, CacheError, CacheStore};
use crate::constants::cache::DEFAULT_TTL_SECONDS;

/// Thirty years; longer TTLs are treated as this.
const MAX_TTL_SECONDS: u64 = 30 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: String,
    pub expires_at: Instant,
}

impl CacheEntry {
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process cache store.
///
/// Expired entries are invisible to `get` immediately and are physically
/// removed by [`MemoryStore::purge_expired`], either on demand or from the
/// background sweeper.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included until purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    pub fn spawn_sweeper(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let removed = self.purge_expired().await;
                if removed > 0 {
                    debug!(removed, "Purged expired cache entries");
                }
            }
        })
    }
}

// Clamped so an oversized TTL cannot overflow the clock.
fn expiry_after(ttl_seconds: u64) -> Instant {
    let now = Instant::now();
    let ttl = Duration::from_secs(ttl_seconds.min(MAX_TTL_SECONDS));
    now.checked_add(ttl).unwrap_or_else(|| now + Duration::from_secs(DEFAULT_TTL_SECONDS))
}

#[async_trait::async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone()))
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<(), CacheError> {
        let entry = CacheEntry {
            value: value.to_string(),
            expires_at: expiry_after(ttl_seconds),
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }

    fn backend(&self) -> CacheBackend {
        CacheBackend::Memory
    }
}
