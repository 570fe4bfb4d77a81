//! # Stockwise Server
//!
//! HTTP API over the Stockwise database layer.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Request Pipeline                                │
//! │                                                                         │
//! │  TraceLayer ──► access_guard ──► route handler ──► stockwise-db        │
//! │  (span per      (JWT → role,     (Json in,         (transactions,      │
//! │   request)       303/401/403)     envelope out)     SQLite)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`] for the TOML file and `STOCKWISE_*` environment variables.

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use stockwise_db::Database;
use tower_http::trace::TraceLayer;

// Re-exports
pub use auth::{AuthUser, JwtManager};
pub use config::ServerConfig;
pub use error::{ApiError, ApiResponse, ErrorCode};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
}

impl AppState {
    pub fn new(db: Database, config: &ServerConfig) -> Self {
        AppState {
            db,
            jwt: JwtManager::new(&config.jwt_secret, config.jwt_lifetime_secs),
        }
    }
}

/// Builds the router with every route, the access guard and request tracing.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/replacements", get(routes::replacements::list_replacements))
        .route("/replacements/product", post(routes::replacements::replace_product))
        .route("/replacements/order", post(routes::replacements::replace_with_order))
        .route("/replacement-report", get(routes::replacements::replacement_report))
        .route(
            "/returns",
            get(routes::returns::list_returns).post(routes::returns::record_return),
        )
        .route("/product-returns-report", get(routes::returns::product_returns_report))
        .route("/products", get(routes::catalog::list_products))
        .route("/products/:id", get(routes::catalog::get_product))
        .route("/orders/:code", get(routes::catalog::get_order));

    Router::new()
        .route("/health", get(routes::health::health))
        .nest("/api", api)
        .fallback(routes::not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::access_guard,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
