//! HTTP routes, one module per resource.

pub mod auth;
pub mod categories;
pub mod health;
pub mod pos;
pub mod products;


use axum::Router;

use crate::state::AppState;

/// Every route, without state or middleware applied.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(categories::router())
        .merge(products::router())
        .merge(pos::router())
}
