//! # Level 99 Server
//!
//! JSON API behind the store's back office and POS screen.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Level 99 Server                                 │
//! │                                                                         │
//! │  Browser ──► CORS ──► Trace ──► Sessions ──► Router                     │
//! │                                   │                                     │
//! │          ┌────────────┬───────────┼────────────┬─────────────┐         │
//! │          ▼            ▼           ▼            ▼             ▼         │
//! │       /login     /categories  /products     /pos/*       /health       │
//! │          │            │           │            │                        │
//! │          │            └─────┬─────┘            ▼                        │
//! │          │                  ▼            CartRegistry                   │
//! │          └──────────► level99-db        (per session)                   │
//! │                        (SQLite)                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything except `/login`, `/logout` and `/health` requires a session
//! cookie, checked by the [`auth::CurrentOperator`] extractor.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::ApiError;
pub use state::AppState;

/// Builds the application router with middleware and state applied.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(state.config.cors_origin.clone())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE]);

    let sessions = auth::session_layer(&state.config);

    routes::routes()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(sessions),
        )
        .with_state(state)
}
