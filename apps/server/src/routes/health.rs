use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::warn;

use level99_db::migrations::{migration_status, MigrationStatus};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub migrations: MigrationStatus,
}

/// `GET /health`. Unauthenticated.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = state.db.health_check().await;

    let migrations = match migration_status(state.db.pool()).await {
        Ok(status) => status,
        Err(e) => {
            warn!(error = %e, "Could not read migration status");
            MigrationStatus { total: 0, applied: 0 }
        }
    };

    let status = if database && migrations.is_current() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        database,
        migrations,
    })
}
