//! # Database Pool Management
//!
//! Opens the store's SQLite database and hands out repositories.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  DbConfig::new("./level99.db")      DbConfig::in_memory()               │
//! │        │   Storage::File                  │   Storage::Memory           │
//! │        └──────────────┬───────────────────┘   (one connection, or each  │
//! │                       ▼                        would see its own db)    │
//! │             Database::new(config)                                       │
//! │                       │  WAL, foreign_keys = ON, busy timeout           │
//! │                       │  embedded migrations                            │
//! │                       ▼                                                 │
//! │   ┌──────────────────────────────────────────────┐                      │
//! │   │ Database (Clone, shares one SqlitePool)      │                      │
//! │   │   .categories()  .products()  .users()       │                      │
//! │   └──────────────────────────────────────────────┘                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Foreign keys must be on for the `ON DELETE RESTRICT` behind the category
//! guard. SQLite leaves them off per connection unless asked.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::category::CategoryRepository;
use crate::repository::product::ProductRepository;
use crate::repository::user::UserRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    /// A file on disk, created on first connect.
    File(PathBuf),

    /// A private in-memory database, dropped with the pool.
    Memory,
}

impl fmt::Display for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Storage::File(path) => write!(f, "{}", path.display()),
            Storage::Memory => f.write_str(":memory:"),
        }
    }
}

/// Pool settings.
///
/// ```rust,ignore
/// let config = DbConfig::new("./level99.db").max_connections(8);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub storage: Storage,

    /// Default 5. Always 1 for [`Storage::Memory`].
    pub max_connections: u32,

    pub min_connections: u32,

    /// How long a request may wait for a free connection.
    pub acquire_timeout: Duration,

    /// How long a connection waits on a locked database before failing.
    pub busy_timeout: Duration,

    /// Apply embedded migrations on connect.
    pub migrate: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            storage: Storage::File(path.into()),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            migrate: true,
        }
    }

    /// Fresh, migrated, private database. Used by tests.
    pub fn in_memory() -> Self {
        DbConfig {
            storage: Storage::Memory,
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(1),
            migrate: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn migrate(mut self, migrate: bool) -> Self {
        self.migrate = migrate;
        self
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match &self.storage {
            Storage::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal),
            Storage::Memory => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?,
        };

        Ok(options
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout))
    }

    fn pool_size(&self) -> (u32, u32) {
        match self.storage {
            Storage::Memory => (1, 1),
            Storage::File(_) => (
                self.min_connections.min(self.max_connections),
                self.max_connections.max(1),
            ),
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the store database.
///
/// Clones share the pool. Repositories are created per call and are cheap.
///
/// ```rust,ignore
/// async fn list_categories(
///     State(state): State<AppState>,
/// ) -> Result<Json<Vec<Category>>, ApiError> {
///     Ok(Json(state.db.categories().list().await?))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connects, then migrates when `config.migrate` is set.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let (min, max) = config.pool_size();
        info!(storage = %config.storage, max_connections = max, "Opening database");

        let mut pool_options = SqlitePoolOptions::new()
            .min_connections(min)
            .max_connections(max)
            .acquire_timeout(config.acquire_timeout);
        if config.storage == Storage::Memory {
            // The data lives only as long as its single connection.
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!("Pool connected");

        let db = Database { pool };
        if config.migrate {
            db.run_migrations().await?;
        }
        Ok(db)
    }

    /// Applies pending migrations. Safe to call repeatedly.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(self.pool.clone())
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Waits for checked-out connections to return, then closes the pool.
    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }

    /// `true` when a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn test_closed_pool_is_unhealthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;

        assert!(!db.health_check().await);
    }

    #[test]
    fn test_memory_is_single_connection() {
        let config = DbConfig::in_memory().max_connections(8);

        assert_eq!(config.pool_size(), (1, 1));
    }

    #[test]
    fn test_file_pool_size_is_clamped() {
        let config = DbConfig::new("/tmp/level99-test.db")
            .min_connections(10)
            .max_connections(4)
            .migrate(false);

        assert_eq!(config.pool_size(), (4, 4));
        assert!(!config.migrate);
        assert_eq!(config.storage.to_string(), "/tmp/level99-test.db");
    }
}
