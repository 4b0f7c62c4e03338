//! Gateway server setup
//!
//! Wires the collaborators together and runs the WebSocket server.

mod context;
mod handler;
mod state;

pub use context::{CoordinatorContext, CoordinatorContextBuilder};
pub use handler::gateway_handler;
pub use state::GatewayState;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use connect_cache::{
    EphemeralStore, MemoryStore, PresenceTracker, RedisPool, RedisPoolConfig, RedisStore,
    TypingTracker,
};
use connect_common::{AppConfig, AppError, JwtService};

use crate::broadcast::RoomBroadcaster;
use crate::connection::SessionRegistry;

/// Sweep period for the in-memory ephemeral store
const SWEEP_PERIOD: Duration = Duration::from_secs(30);

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/gateway", get(gateway_handler))
        .route("/health", get(health_check))
}

/// Liveness probe
async fn health_check() -> &'static str {
    "OK"
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initialize all dependencies and create `GatewayState`
pub async fn create_gateway_state(config: AppConfig) -> Result<GatewayState, AppError> {
    // Database pool
    tracing::info!("Connecting to PostgreSQL...");
    let db_config = connect_db::DatabaseConfig::from(&config.database);
    let pool = connect_db::create_pool(&db_config)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    tracing::info!("PostgreSQL connection established");

    // Ephemeral store: Redis when configured, in-memory otherwise
    let store: Arc<dyn EphemeralStore> = match RedisPoolConfig::from_app_config(&config.redis) {
        Some(redis_config) => {
            tracing::info!("Connecting to Redis...");
            let redis_pool =
                RedisPool::new(redis_config).map_err(|e| AppError::Cache(e.to_string()))?;
            redis_pool
                .health_check()
                .await
                .map_err(|e| AppError::Cache(e.to_string()))?;
            tracing::info!("Redis connection established");
            Arc::new(RedisStore::new(redis_pool))
        }
        None => {
            tracing::info!("No Redis URL configured, using in-memory ephemeral store");
            let store = MemoryStore::new_shared();
            MemoryStore::spawn_sweeper(store.clone(), SWEEP_PERIOD);
            store
        }
    };

    let presence = PresenceTracker::new(
        store.clone(),
        Duration::from_secs(config.coordinator.presence_ttl_secs),
    );
    let typing = TypingTracker::new(
        store,
        Duration::from_secs(config.coordinator.typing_ttl_secs),
    );

    // Credential verification
    let verifier = Arc::new(JwtService::new(
        &config.auth.jwt_secret,
        config.auth.token_expiry,
    ));

    // Repositories
    let users = Arc::new(connect_db::PgUserRepository::new(pool.clone()));
    let chats = Arc::new(connect_db::PgChatRepository::new(pool.clone()));
    let members = Arc::new(connect_db::PgChatMemberRepository::new(pool.clone()));
    let messages = Arc::new(connect_db::PgMessageRepository::new(pool));

    let context = CoordinatorContextBuilder::new()
        .users(users)
        .chats(chats)
        .members(members)
        .messages(messages)
        .presence(presence)
        .typing(typing)
        .verifier(verifier)
        .collaborator_timeout(Duration::from_millis(
            config.coordinator.collaborator_timeout_ms,
        ))
        .history_limit(config.coordinator.history_limit)
        .session_buffer(config.coordinator.session_buffer)
        .build()
        .map_err(AppError::Config)?;

    let registry = SessionRegistry::new_shared();
    let broadcaster = Arc::new(RoomBroadcaster::new(registry.clone()));

    Ok(GatewayState::new(Arc::new(context), registry, broadcaster))
}

/// Run the gateway server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    tracing::info!("Starting gateway server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Gateway listening on ws://{}/gateway", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    Ok(())
}

/// Resolve on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("Shutdown signal received, closing gateway");
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .gateway
        .address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid gateway address: {e}")))?;

    let state = create_gateway_state(config).await?;
    let app = create_app(state);

    run_server(app, addr).await
}
