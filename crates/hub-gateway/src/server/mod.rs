//! Gateway server setup
//!
//! Wires the store, history writer and hub together and serves `/ws` and
//! `/health`.

mod handler;
mod state;

pub use handler::{gateway_handler, health_check, HealthResponse, TRANSPORT_LIMIT_FACTOR};
pub use state::GatewayState;

use crate::hub::{spawn_history_writer, Hub, ReplayBuffer};
use crate::identity::{NameGenerator, RandomNameGenerator};
use axum::{routing::get, Router};
use hub_common::{AppConfig, AppError, HubConfig};
use hub_core::SharedMessageStore;
use hub_store::{MemoryHistoryStore, RedisHistoryStore, RedisPool};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/ws", get(gateway_handler))
        .route("/health", get(health_check))
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Select the history store: Redis when configured, memory otherwise
///
/// An unreachable Redis is not fatal; the hub runs with degraded persistence.
pub async fn create_store(config: &AppConfig) -> Result<SharedMessageStore, AppError> {
    let capacity = config.hub.history_capacity;

    let Some(redis) = &config.redis else {
        tracing::info!(capacity, "REDIS_URL not set, keeping history in memory");
        return Ok(Arc::new(MemoryHistoryStore::new(capacity)));
    };

    tracing::info!("Connecting to Redis...");
    let pool = RedisPool::from_config(redis).map_err(|e| AppError::Cache(e.to_string()))?;

    match pool.health_check().await {
        Ok(()) => tracing::info!("Redis connection established"),
        Err(e) => tracing::warn!(
            error = %e,
            "Redis unreachable, history persistence degraded until it recovers"
        ),
    }

    Ok(Arc::new(RedisHistoryStore::new(
        pool,
        redis.history_key.clone(),
        capacity,
    )))
}

/// Seed replay from `store`, start the history writer and hub, and return
/// the state handlers share
pub async fn create_gateway_state(
    config: HubConfig,
    store: SharedMessageStore,
    names: Arc<dyn NameGenerator>,
) -> GatewayState {
    let replay = ReplayBuffer::load(store.as_ref(), config.history_depth).await;
    let (history, _writer) = spawn_history_writer(store, config.history_buffer);
    let (hub, handle) = Hub::new(config.command_buffer, history, replay);
    hub.spawn();

    GatewayState::new(handle, config, names)
}

/// Serve `app` on an already bound listener
pub async fn serve(listener: TcpListener, app: Router) -> Result<(), AppError> {
    let addr = listener.local_addr().map_err(AppError::server)?;
    tracing::info!("Gateway listening on ws://{}/ws", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::server(format!("Server error: {e}")))
}

/// Bind `addr` and serve `app`
pub async fn run_server(app: Router, addr: &str) -> Result<(), AppError> {
    tracing::info!("Starting Gateway server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::server(format!("Failed to bind to {addr}: {e}")))?;

    serve(listener, app).await
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let store = create_store(&config).await?;
    let state = create_gateway_state(
        config.hub.clone(),
        store,
        Arc::new(RandomNameGenerator::default()),
    )
    .await;

    run_server(create_app(state), &config.gateway.address()).await
}
