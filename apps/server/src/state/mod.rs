//! # State Module
//!
//! Shared state handed to every handler through axum's `State` extractor.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────────────┐  │
//! │  │   Database   │  │   CartRegistry   │  │  ServerConfig / Ticket   │  │
//! │  │  SqlitePool  │  │  Arc<Mutex<Map>> │  │  read-only after start   │  │
//! │  └──────────────┘  └──────────────────┘  └──────────────────────────┘  │
//! │                                                                         │
//! │  Sessions themselves live in the SessionManagerLayer's MemoryStore.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;

use std::sync::Arc;

use level99_core::TicketConfig;
use level99_db::Database;

use crate::config::ServerConfig;

pub use cart::CartRegistry;

/// Application state shared by all handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub carts: CartRegistry,
    pub config: Arc<ServerConfig>,
    pub ticket: Arc<TicketConfig>,
}

impl AppState {
    /// Wires the state from an open database and the loaded config.
    pub fn new(db: Database, config: ServerConfig) -> Self {
        let ticket = config.ticket_config();

        AppState {
            db,
            carts: CartRegistry::new(),
            config: Arc::new(config),
            ticket: Arc::new(ticket),
        }
    }
}
