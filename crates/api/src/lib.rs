//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes
//! - Shared application state
//! - Response types
//!
//! Authentication/session handling lives upstream; requests reaching these
//! routes are assumed authorized.

pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use driftline_shared::config::FinanceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Finance settings for the revenue engine.
    pub finance: Arc<FinanceConfig>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
