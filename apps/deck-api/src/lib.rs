//! Deck API - HTTP front end for template personalization
//!
//! Provides REST endpoints for:
//! - Liveness and health checks
//! - Generating a personalized presentation from a template, returned
//!   inline as base64, as a download, or stored in the document drive

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use config::AppConfig;
pub use error::ApiError;
pub use state::AppState;

/// Build the router
pub fn app(state: Arc<AppState>) -> Router {
    // CORS configuration for browser-based callers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health))
        .route("/generate", post(handlers::generate))
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
