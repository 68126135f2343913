//! # User Repository
//!
//! Operator accounts and password checks.
//!
//! Passwords are stored as Argon2 PHC strings (`$argon2id$v=19$...`), which
//! carry their own salt and parameters.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use std::sync::LazyLock;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use level99_core::User;

/// Hashes a password for storage.
pub fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::PasswordHash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Checks a password against a stored hash.
///
/// A malformed hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Checked on unknown usernames so a miss costs the same Argon2 work as a hit.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("level99-no-such-operator").ok());

/// Runs [`verify_password`] on the blocking pool. `None` compares against
/// [`DUMMY_HASH`] and always fails.
async fn verify_off_thread(password: &str, hash: Option<String>) -> DbResult<bool> {
    let password = password.to_string();

    tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(&password, &hash),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                verify_password(&password, dummy);
            }
            false
        }
    })
    .await
    .map_err(|e| DbError::Internal(format!("Password check aborted: {e}")))
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
}

/// Repository for operator accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates an operator with a freshly hashed password.
    ///
    /// ## Errors
    /// `UniqueViolation` when the username is taken.
    pub async fn create(&self, username: &str, password: &str) -> DbResult<User> {
        let password_hash = hash_password(password)?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash) VALUES (?1, ?2) RETURNING id, username",
        )
        .bind(username)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("username", username),
            other => other,
        })?;

        info!(username = %user.username, "Created operator");
        Ok(user)
    }

    /// Looks up an operator by username.
    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user =
            sqlx::query_as::<_, User>("SELECT id, username FROM users WHERE username = ?1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        Ok(user)
    }

    /// Returns the operator if `username` exists and `password` matches.
    ///
    /// Unknown user and wrong password both come back as `Ok(None)`, so the
    /// caller cannot tell them apart.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> DbResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            verify_off_thread(password, None).await?;
            debug!(username = %username, "Unknown operator");
            return Ok(None);
        };

        if !verify_off_thread(password, Some(row.password_hash)).await? {
            debug!(username = %username, "Password mismatch");
            return Ok(None);
        }

        Ok(Some(User {
            id: row.id,
            username: row.username,
        }))
    }

    /// Replaces an operator's password.
    pub async fn set_password(&self, username: &str, password: &str) -> DbResult<()> {
        let password_hash = hash_password(password)?;

        let result = sqlx::query("UPDATE users SET password_hash = ?1 WHERE username = ?2")
            .bind(&password_hash)
            .bind(username)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", username));
        }

        Ok(())
    }

    /// Counts operators.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter2").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
        assert!(!verify_password("hunter2", "not-a-hash"));
    }

    #[tokio::test]
    async fn test_create_and_verify_credentials() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        let created = repo.create("cashier", "s3cret").await.unwrap();
        assert_eq!(created.username, "cashier");

        let ok = repo.verify_credentials("cashier", "s3cret").await.unwrap();
        assert_eq!(ok, Some(created));

        assert_eq!(repo.verify_credentials("cashier", "wrong").await.unwrap(), None);
        assert_eq!(repo.verify_credentials("nobody", "s3cret").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_user_still_checks_a_hash() {
        let dummy = DUMMY_HASH.as_deref().unwrap();
        assert!(dummy.starts_with("$argon2"));

        // The dummy password never logs anyone in.
        assert!(!verify_off_thread("level99-no-such-operator", None).await.unwrap());
        assert!(verify_off_thread("hunter2", Some(hash_password("hunter2").unwrap()))
            .await
            .unwrap());

        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let found = db
            .users()
            .verify_credentials("ghost", "level99-no-such-operator")
            .await
            .unwrap();
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();
        repo.create("admin", "a").await.unwrap();

        let err = repo.create("admin", "b").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "username"));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_set_password() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();
        repo.create("admin", "old").await.unwrap();

        repo.set_password("admin", "new").await.unwrap();

        assert!(repo.verify_credentials("admin", "new").await.unwrap().is_some());
        assert!(repo.verify_credentials("admin", "old").await.unwrap().is_none());
        assert!(repo.find_by_username("admin").await.unwrap().is_some());
    }
}
