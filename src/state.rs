use std::sync::Arc;
use tokio::sync::RwLock;

use crate::cache::{self, CacheStore};
use crate::clients::PlaceholderClient;
use crate::config::Config;
use crate::services::{CacheAsideGraphService, CachePolicy, GraphService};

/// Build a shared HTTP client for upstream calls.
/// Every request is bounded by `timeout_seconds`; pooling is shared across
/// all resolvers.
fn build_shared_http_client(config: &Config) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(
            config.upstream.request_timeout_seconds,
        ))
        .user_agent(config.upstream.user_agent.clone())
        .pool_max_idle_per_host(config.upstream.pool_max_idle_per_host)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub upstream: Arc<PlaceholderClient>,

    pub cache: Arc<dyn CacheStore>,

    pub graph: Arc<dyn GraphService>,
}

impl SharedState {
    /// Connects the configured cache store, then wires the resolver to it.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let cache = cache::connect(&config.cache).await?;
        Self::with_cache(config, cache)
    }

    /// Wires the resolver to an already constructed cache store.
    pub fn with_cache(config: Config, cache: Arc<dyn CacheStore>) -> anyhow::Result<Self> {
        let http_client = build_shared_http_client(&config)?;
        let upstream = Arc::new(PlaceholderClient::with_shared_client(
            &config.upstream.base_url,
            http_client,
        ));

        let graph = Arc::new(CacheAsideGraphService::new(
            upstream.clone(),
            cache.clone(),
            CachePolicy::from(&config.cache),
        )) as Arc<dyn GraphService + Send + Sync + 'static>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            upstream,
            cache,
            graph,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
