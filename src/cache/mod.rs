//! Shared cache store boundary.
//!
//! The resolver only needs three things from a store: read a key, write a key
//! with an expiry, and let expired keys disappear on their own. Two backends
//! implement [`CacheStore`]:
//!
//! - [`RedisStore`]: the shared store used in production
//! - [`MemoryStore`]: an in-process map, for single-instance runs and tests
//!
//! A store is built once at startup and handed to the resolver; there is no
//! process-wide handle.

pub mod memory;
pub mod redis_store;

pub use memory::{CacheEntry, MemoryStore};
pub use redis_store::RedisStore;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::config::CacheConfig;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Redis,
    Memory,
}

impl std::fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Redis => write!(f, "redis"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Key/value store with per-key expiry.
///
/// No transactions and no compare-and-swap: concurrent writers to the same
/// key race and the last write wins.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the stored value, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key`, replacing any previous value and expiry.
    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<(), CacheError>;

    /// Round-trips to the store to prove it is reachable.
    async fn ping(&self) -> Result<(), CacheError>;

    fn backend(&self) -> CacheBackend;
}

/// Builds the configured store.
///
/// A Redis store that cannot be reached yet is still returned: the failure is
/// logged and later operations retry the connection.
pub async fn connect(config: &CacheConfig) -> anyhow::Result<Arc<dyn CacheStore>> {
    match config.backend {
        CacheBackend::Redis => {
            let store = RedisStore::open(
                &config.redis_url,
                Duration::from_secs(config.connect_timeout_seconds),
            )?;

            match store.ping().await {
                Ok(()) => info!("Connected to Redis cache store"),
                Err(e) => error!(
                    "Redis cache store not reachable, serving uncached until it is: {}",
                    e
                ),
            }

            Ok(Arc::new(store))
        }
        CacheBackend::Memory => {
            let store = Arc::new(MemoryStore::new());
            if config.sweep_interval_seconds > 0 {
                store
                    .clone()
                    .spawn_sweeper(Duration::from_secs(config.sweep_interval_seconds));
            }
            info!("Using in-memory cache store");
            Ok(store)
        }
    }
}
