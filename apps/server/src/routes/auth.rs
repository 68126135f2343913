//! Login, logout and the current operator.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{current_session, CurrentOperator, OperatorSession, OPERATOR_KEY};
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct OperatorResponse {
    pub username: String,
}

/// `POST /login`
///
/// Any failure, unknown user or wrong password alike, gets the same 401
/// message.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<OperatorResponse>, ApiError> {
    let Json(body) = payload?;
    let username = body.username.trim();

    if username.is_empty() || body.password.is_empty() {
        return Err(ApiError::validation("Username and password are required"));
    }

    let Some(user) = state
        .db
        .users()
        .verify_credentials(username, &body.password)
        .await?
    else {
        warn!(username = %username, "Rejected login");
        return Err(ApiError::invalid_credentials());
    };

    // Logging in again from the same browser replaces the old cart.
    if let Some(previous) = current_session(&session).await {
        state.carts.close(&previous.cart_id).await;
    }
    session.cycle_id().await?;

    let operator = OperatorSession {
        username: user.username,
        cart_id: Uuid::new_v4().to_string(),
    };
    let expires_at = Utc::now() + Duration::seconds(state.config.session_lifetime_secs);
    state.carts.open(&operator.cart_id, expires_at).await;
    session.insert(OPERATOR_KEY, &operator).await?;

    info!(username = %operator.username, "Operator logged in");

    Ok(Json(OperatorResponse {
        username: operator.username,
    }))
}

/// `POST /logout`
///
/// Always succeeds. A live session is flushed and its cart discarded.
pub async fn logout(State(state): State<AppState>, session: Session) -> StatusCode {
    if let Some(operator) = current_session(&session).await {
        if state.carts.close(&operator.cart_id).await {
            info!(username = %operator.username, "Operator logged out");
        }
    }

    if let Err(e) = session.flush().await {
        warn!(error = %e, "Failed to flush session");
    }

    StatusCode::NO_CONTENT
}

/// `GET /me`
pub async fn me(operator: CurrentOperator) -> Json<OperatorResponse> {
    Json(OperatorResponse {
        username: operator.username,
    })
}
