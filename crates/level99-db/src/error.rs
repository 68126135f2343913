//! # Database Error Types
//!
//! ```text
//! sqlx::Error ──► DbError ──► ApiError { code, message }   (apps/server)
//!
//! constraint failures are classified by sqlx's ErrorKind:
//!   UniqueViolation      ─► DbError::UniqueViolation   (409)
//!   ForeignKeyViolation  ─► DbError::ForeignKeyViolation
//!   Check / NotNull      ─► DbError::ConstraintViolation (400)
//! ```
//!
//! Repositories refine the generic variants where they know more, e.g. a
//! foreign key failure while deleting a category becomes
//! [`DbError::CategoryInUse`].

use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// No row with that id, or an UPDATE/DELETE matched nothing.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Deleting the category would orphan products.
    ///
    /// ```text
    /// DELETE /categories/3
    ///   SELECT COUNT(*) FROM products WHERE category_id = 3  → 2
    ///   ─► CategoryInUse { id: 3, products: 2 }, rolled back
    /// ```
    #[error("Category {id} still has {products} associated product(s)")]
    CategoryInUse { id: i64, products: i64 },

    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A `CHECK` or `NOT NULL` column rule rejected the row.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Every pooled connection stayed busy past the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// `"UNIQUE constraint failed: users.username"` ─► `"users.username"`
fn unique_column(message: &str) -> &str {
    message
        .rsplit_once(": ")
        .map_or("unknown", |(_, column)| column)
}

/// SQLite extended result codes for foreign-key failures.
///
/// `ON DELETE RESTRICT` fires as `SQLITE_CONSTRAINT_TRIGGER` (1811), which sqlx
/// does not map to [`ErrorKind::ForeignKeyViolation`].
const SQLITE_CONSTRAINT_FOREIGNKEY: &str = "787";
const SQLITE_CONSTRAINT_TRIGGER: &str = "1811";

fn is_foreign_key_failure(code: Option<&str>, message: &str) -> bool {
    matches!(
        code,
        Some(SQLITE_CONSTRAINT_FOREIGNKEY) | Some(SQLITE_CONSTRAINT_TRIGGER)
    ) || message.contains("FOREIGN KEY constraint failed")
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                if is_foreign_key_failure(db_err.code().as_deref(), &message) {
                    return DbError::ForeignKeyViolation { message };
                }
                match db_err.kind() {
                    ErrorKind::UniqueViolation => {
                        DbError::duplicate(unique_column(&message), "unknown")
                    }
                    ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation { message },
                    ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                        DbError::ConstraintViolation(message)
                    }
                    _ => DbError::QueryFailed(message),
                }
            }
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
