//! HTTP API for the reputation backend.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::{
    logging_middleware, rate_limit_middleware, security_headers_middleware, RateLimitState,
};
pub use types::*;

use crate::config::{ChainConfig, Config, StoreLocation};
use anyhow::{Context, Result};
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use record_store::{EncryptedFileStore, MemoryStore, RecordStore};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Record store backend
    pub store: Arc<dyn RecordStore>,
    /// Chain parameters
    pub chain: Arc<ChainConfig>,
}

impl AppState {
    /// Create new application state.
    pub fn new(store: Arc<dyn RecordStore>, chain: ChainConfig) -> Self {
        Self {
            store,
            chain: Arc::new(chain),
        }
    }

    /// Open the configured record store and build the state around it.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<dyn RecordStore> = match config.database.location()? {
            StoreLocation::Memory => {
                warn!("No database configured, using in-memory storage (data will be lost on restart)");
                Arc::new(MemoryStore::new())
            }
            StoreLocation::EncryptedFile(path) => {
                let secret = config
                    .auth
                    .secret
                    .as_ref()
                    .context("auth.secret (JWT_SECRET) is required for the file-backed store")?;
                let store = EncryptedFileStore::open(&path, secret)
                    .await
                    .with_context(|| format!("Failed to open record store at {:?}", path))?;
                Arc::new(store)
            }
        };

        info!(backend = store.backend(), "Record store ready");
        Ok(Self::new(store, config.chain.clone()))
    }
}

/// User registration, profile and listing routes.
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register_user))
        .route("/profile/:address", get(handlers::get_profile))
        .route("/users", get(handlers::list_users))
}

fn organization_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_organizations).post(handlers::create_organization),
        )
        .route("/:id", get(handlers::get_organization))
        .route("/:id/members", post(handlers::add_member))
}

fn reputation_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::leaderboard))
        .route(
            "/:address",
            get(handlers::get_reputation).post(handlers::adjust_reputation),
        )
}

fn nft_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_nfts).post(handlers::create_nft))
        .route("/owner/:address", get(handlers::list_nfts_by_owner))
        .route("/:id", get(handlers::get_nft))
}

/// Create the API router with default rate limiting.
pub fn create_router(state: AppState) -> Router {
    let rate_limit = RateLimitState::from_config(&Default::default());
    create_router_with_rate_limit(state, rate_limit)
}

/// Create the API router with custom rate limiting.
///
/// Nothing here binds a socket; the router can be driven in-process.
pub fn create_router_with_rate_limit(state: AppState, rate_limit: RateLimitState) -> Router {
    let api = Router::new()
        .merge(user_routes())
        .nest("/organizations", organization_routes())
        .nest("/reputation", reputation_routes())
        .nest("/nfts", nft_routes())
        .method_not_allowed_fallback(handlers::method_not_allowed);

    Router::new()
        .nest("/api", api)
        .layer(axum_middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ))
        // Health check (no rate limiting)
        .route("/health", get(handlers::health))
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .fallback(handlers::route_not_found)
        .layer(CorsLayer::permissive())
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
