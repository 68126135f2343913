//! # Database Migrations
//!
//! SQL files under `migrations/sqlite/` are compiled into the binary and
//! applied on connect. sqlx records each one in `_sqlx_migrations`, so
//! reopening an existing store only runs what is new.
//!
//! ```text
//! migrations/sqlite/
//! └── 0001_initial_schema.sql   categories, products, users
//! ```
//!
//! New schema changes go in a new `NNNN_description.sql`. Applied files are
//! checksummed; editing one breaks every existing database.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// How far the database is behind the embedded migrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub total: usize,
    pub applied: usize,
}

impl MigrationStatus {
    pub fn is_current(&self) -> bool {
        self.applied >= self.total
    }
}

/// Applies every pending migration, each in its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;

    let status = migration_status(pool).await?;
    info!(applied = status.applied, "Schema up to date");
    Ok(())
}

/// Counts applied migrations. A database that was never migrated reports 0.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    let total = MIGRATOR.iter().count();

    let applied = match sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1",
    )
    .fetch_one(pool)
    .await
    {
        Ok(count) => usize::try_from(count).unwrap_or(0),
        Err(e) => {
            debug!(error = %e, "No migration table");
            0
        }
    };

    Ok(MigrationStatus { total, applied })
}
