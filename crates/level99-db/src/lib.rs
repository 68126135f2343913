//! # level99-db
//!
//! SQLite storage for the catalog and operator accounts.
//!
//! ```text
//! apps/server handler
//!       │  state.db.products().update(7, &input)
//!       ▼
//! Database ──► repository ──► SqlitePool ──► ./level99.db (L99_DB_PATH)
//! ```
//!
//! Carts and sales are not stored; they live in the server's memory.
//!
//! ```rust,ignore
//! use level99_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./level99.db")).await?;
//! let genres = db.categories().list().await?;
//! let games = db.products().list_with_category().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, Storage};

pub use repository::category::CategoryRepository;
pub use repository::product::ProductRepository;
pub use repository::user::UserRepository;
