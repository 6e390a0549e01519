//! Reputation API - REST backend for users, organizations, reputation and NFT records.
//!
//! The service:
//! - Registers users under a unique address and serves their profiles
//! - Tracks organizations, reputation scores and NFT records per user
//! - Applies security headers, CORS and per-client rate limiting to every route

pub mod api;
pub mod config;
pub mod error;

pub use api::{create_router, create_router_with_rate_limit, AppState, RateLimitState};
pub use config::Config;
pub use error::ApiError;
