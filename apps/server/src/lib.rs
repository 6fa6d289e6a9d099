//! # Kulino Server
//!
//! JSON API behind the Kulino POS single-page front end.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Kulino Server                                   │
//! │                                                                         │
//! │  Browser ──► TraceLayer ──► CorsLayer ──► Router ──► routes::*          │
//! │                                                 │                       │
//! │                                                 ▼                       │
//! │                                   AppState { Database, StoreInfo }      │
//! │                                                 │                       │
//! │                       ┌─────────────────────────┴──────────────┐        │
//! │                       ▼                                        ▼        │
//! │              kulino-db repositories              kulino-core::render    │
//! │              (one SQLite transaction             (receipts, reports)    │
//! │               per request)                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`]: `kulino.toml` plus `KULINO_*` environment overrides.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// Builds the full application router with middleware.
pub fn build_router(state: AppState) -> Router {
    routes::api_routes()
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        // The SPA may be served from another origin during development.
        .layer(CorsLayer::permissive())
        .with_state(state)
}
