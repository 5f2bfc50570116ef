use std::time::Duration;

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::{CacheBackend, CacheError, CacheStore};

/// Redis-backed cache store.
///
/// The connection is established lazily and kept in a [`ConnectionManager`],
/// which reconnects on its own once it has connected the first time. Every
/// command is bounded by `op_timeout` so a stalled server reads as
/// unavailable instead of hanging a query.
pub struct RedisStore {
    client: redis::Client,
    connection: Mutex<Option<ConnectionManager>>,
    op_timeout: Duration,
}

impl RedisStore {
    pub fn open(url: &str, op_timeout: Duration) -> Result<Self, CacheError> {
        let client =
            redis::Client::open(url).map_err(|e| CacheError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            connection: Mutex::new(None),
            op_timeout,
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        if let Some(connection) = self.connection.lock().await.as_ref() {
            return Ok(connection.clone());
        }

        // Connect without holding the lock so callers fail in parallel while
        // the server is unreachable.
        let manager = tokio::time::timeout(self.op_timeout, self.client.get_connection_manager())
            .await
            .map_err(|_| CacheError::Unavailable("timed out connecting to redis".to_string()))?
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;

        let mut guard = self.connection.lock().await;
        if let Some(existing) = guard.as_ref() {
            return Ok(existing.clone());
        }

        info!("Redis connection established");
        *guard = Some(manager.clone());
        Ok(manager)
    }

    async fn run<T, F>(&self, op: &'static str, command: F) -> Result<T, CacheError>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, command).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(op, error = %e, "Redis command failed");
                Err(CacheError::Unavailable(e.to_string()))
            }
            Err(_) => {
                warn!(op, "Redis command timed out");
                Err(CacheError::Unavailable(format!("redis {op} timed out")))
            }
        }
    }
}

#[async_trait::async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        self.run("get", conn.get::<_, Option<String>>(key)).await
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        self.run("set_ex", conn.set_ex::<_, _, ()>(key, value, ttl_seconds))
            .await
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        self.run("ping", redis::cmd("PING").query_async::<String>(&mut conn))
            .await
            .map(|_| ())
    }

    fn backend(&self) -> CacheBackend {
        CacheBackend::Redis
    }
}
