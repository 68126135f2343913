//! # Session Authentication
//!
//! Cookie sessions via `tower-sessions`, held in a [`MemoryStore`].
//!
//! ## Login Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  POST /login {username, password}                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UserRepository::verify_credentials ──► None ──► 401 generic message   │
//! │       │ Some(user)                                                      │
//! │       ▼                                                                 │
//! │  session.cycle_id()  + insert OperatorSession { username, cart_id }     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CartRegistry::open(cart_id)     Set-Cookie: l99_session=<id>; HttpOnly │
//! │                                                                         │
//! │  Later requests:                                                        │
//! │  SessionManagerLayer ──► Session ──► CurrentOperator ──► cart open?     │
//! │                                                          │ no           │
//! │                                                          └──► 401       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every login gets a fresh `cart_id`, so two browsers logged in as the same
//! user still get separate carts.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use tower_sessions::cookie::time::Duration;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "l99_session";

/// Session key holding the [`OperatorSession`].
pub const OPERATOR_KEY: &str = "operator";

/// What a logged-in session stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorSession {
    pub username: String,

    /// Keys this session's register in the cart registry.
    pub cart_id: String,
}

/// Session layer for the router.
///
/// Sessions expire `session_lifetime_secs` after login.
pub fn session_layer(config: &ServerConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(
            config.session_lifetime_secs,
        )))
        .with_secure(config.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Reads the logged-in operator, if any.
pub async fn current_session(session: &Session) -> Option<OperatorSession> {
    match session.get::<OperatorSession>(OPERATOR_KEY).await {
        Ok(operator) => operator,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable session");
            None
        }
    }
}

/// The logged-in operator for the current request.
///
/// ## Example
///
/// ```rust,ignore
/// async fn me(operator: CurrentOperator) -> Json<OperatorResponse> {
///     Json(OperatorResponse { username: operator.username })
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentOperator {
    pub username: String,
    pub cart_id: String,
}

impl FromRequestParts<AppState> for CurrentOperator {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| ApiError::unauthorized("Not logged in"))?;

        let operator = current_session(session)
            .await
            .ok_or_else(|| ApiError::unauthorized("Not logged in"))?;

        if !state.carts.is_open(&operator.cart_id).await {
            return Err(ApiError::unauthorized("Session expired or invalid"));
        }

        Ok(CurrentOperator {
            username: operator.username,
            cart_id: operator.cart_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_operator_roundtrips_through_session() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        assert!(current_session(&session).await.is_none());

        let operator = OperatorSession {
            username: "admin".to_string(),
            cart_id: "cart-1".to_string(),
        };
        session.insert(OPERATOR_KEY, &operator).await.unwrap();

        let back = current_session(&session).await.unwrap();
        assert_eq!(back.username, "admin");
        assert_eq!(back.cart_id, "cart-1");
    }
}
