use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::get,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::constants;
use crate::state::SharedState;

mod error;
pub mod graphql;
mod observability;
pub mod system;
mod types;

pub use error::ApiError;
pub use graphql::{GraphSchema, build_schema};
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub schema: GraphSchema,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.shared.cache
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    let schema = build_schema(shared.graph.clone());

    Arc::new(AppState {
        shared,
        schema,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, graphiql) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.server.graphiql,
        )
    };

    let graphql_route = if graphiql {
        get(graphql::graphiql).post(graphql::graphql_handler)
    } else {
        axum::routing::post(graphql::graphql_handler)
    };

    let api_router = Router::new()
        .route("/system/status", get(system::get_status))
        .route("/metrics", get(observability::get_metrics));

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route(constants::graphql::PATH, graphql_route)
        .route("/health/live", get(system::health_live))
        .route("/health/ready", get(system::health_ready))
        .nest("/api", api_router)
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::track_requests))
}
