//! # Cart Registry
//!
//! One [`Register`] per login, held in memory and keyed by the `cart_id`
//! stored in the operator's session.
//!
//! ## Locking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Arc<Mutex<HashMap<cart_id, OpenCart>>>                                 │
//! │                                                                         │
//! │  POST /pos/cart/items ──► lock ──► register.cart_mut().add_to_cart()   │
//! │  POST /pos/checkout   ──► lock ──► register.checkout(now)   ─► unlock  │
//! │                                                                         │
//! │  Every operation, checkout included, runs inside one lock acquisition, │
//! │  so a concurrent add can never land between "snapshot" and "clear".    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Product lookups hit the database before the lock is taken; nothing awaits
//! while the lock is held.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use level99_core::Register;

#[derive(Debug)]
struct OpenCart {
    register: Register,
    expires_at: DateTime<Utc>,
}

/// Thread-safe map of cart id to register.
///
/// Cloning is cheap and every clone shares the same map.
#[derive(Debug, Clone, Default)]
pub struct CartRegistry {
    sessions: Arc<Mutex<HashMap<String, OpenCart>>>,
}

impl CartRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        CartRegistry::default()
    }

    /// Opens a session with an empty register.
    ///
    /// Also drops every session already past its expiry, which bounds the
    /// map to live logins.
    pub async fn open(&self, cart_id: &str, expires_at: DateTime<Utc>) {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;

        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at > now);
        let pruned = before - sessions.len();
        if pruned > 0 {
            debug!(pruned, "Pruned expired sessions");
        }

        sessions.insert(
            cart_id.to_string(),
            OpenCart {
                register: Register::new(),
                expires_at,
            },
        );
    }

    /// Closes a session, discarding its cart and last sale.
    ///
    /// Returns whether the session was open.
    pub async fn close(&self, cart_id: &str) -> bool {
        self.sessions.lock().await.remove(cart_id).is_some()
    }

    /// Whether the session is open and unexpired.
    pub async fn is_open(&self, cart_id: &str) -> bool {
        self.sessions
            .lock()
            .await
            .get(cart_id)
            .is_some_and(|session| session.expires_at > Utc::now())
    }

    /// Number of open sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Runs `f` against the session's register under the lock.
    ///
    /// Returns `None` when the session is not open.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let sale = carts
    ///     .with_register(&operator.cart_id, |register| register.checkout(Utc::now()).cloned())
    ///     .await;
    /// ```
    pub async fn with_register<F, R>(&self, cart_id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut Register) -> R,
    {
        let mut sessions = self.sessions.lock().await;
        sessions
            .get_mut(cart_id)
            .map(|session| f(&mut session.register))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use level99_core::{Money, Product};

    fn later() -> DateTime<Utc> {
        Utc::now() + Duration::hours(1)
    }

    #[tokio::test]
    async fn test_sessions_have_separate_carts() {
        let carts = CartRegistry::new();
        carts.open("a", later()).await;
        carts.open("b", later()).await;
        let game = Product::new(1, "Tetris", Money::from_cents(999), None);

        carts
            .with_register("a", |r| r.cart_mut().add_to_cart(&game).map(|_| ()))
            .await
            .unwrap()
            .unwrap();

        let a = carts.with_register("a", |r| r.cart().line_count()).await;
        let b = carts.with_register("b", |r| r.cart().line_count()).await;
        assert_eq!(a, Some(1));
        assert_eq!(b, Some(0));
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let carts = CartRegistry::new();

        assert!(!carts.is_open("nope").await);
        assert_eq!(carts.with_register("nope", |_| ()).await, None);
    }

    #[tokio::test]
    async fn test_close_discards_register() {
        let carts = CartRegistry::new();
        carts.open("a", later()).await;

        assert!(carts.close("a").await);
        assert!(!carts.is_open("a").await);
        assert!(!carts.close("a").await);
    }

    #[tokio::test]
    async fn test_expired_sessions_are_pruned_on_open() {
        let carts = CartRegistry::new();
        carts.open("old", Utc::now() - Duration::seconds(1)).await;
        assert!(!carts.is_open("old").await);

        carts.open("new", later()).await;

        assert_eq!(carts.session_count().await, 1);
        assert!(carts.is_open("new").await);
    }
}
