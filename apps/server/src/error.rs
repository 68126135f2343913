//! HTTP error type.
//!
//! Every failed request answers with the same body:
//!
//! ```json
//! { "code": "CATEGORY_IN_USE", "message": "This category has associated games and cannot be deleted" }
//! ```
//!
//! Storage and internal failures are logged here and replaced with a generic
//! message before they leave the process.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use level99_core::{CoreError, ValidationError};
use level99_db::DbError;

/// Generic login failure. Never says which half was wrong.
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    /// Delete refused while products still point at the category.
    CategoryInUse,
    Conflict,
    /// Line or quantity limit hit.
    CartError,
    Unauthorized,
    DatabaseError,
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ValidationError | Self::CategoryInUse | Self::CartError => {
                StatusCode::BAD_REQUEST
            }
            Self::Conflict => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::DatabaseError | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// `"{resource} not found: {id}"` with a 404.
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{resource} not found: {id}"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    /// The login failure every bad username/password pair gets.
    pub fn invalid_credentials() -> Self {
        ApiError::unauthorized(INVALID_CREDENTIALS)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    fn storage(message: &str) -> Self {
        ApiError::new(ErrorCode::DatabaseError, message)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            DbError::CategoryInUse { id, products } => {
                warn!(category_id = id, products, "Category deletion blocked");
                ApiError::new(
                    ErrorCode::CategoryInUse,
                    "This category has associated games and cannot be deleted",
                )
            }
            DbError::UniqueViolation { field, value } => {
                ApiError::new(ErrorCode::Conflict, format!("{field} '{value}' already exists"))
            }
            DbError::ForeignKeyViolation { message } => {
                warn!(%message, "Foreign key violation");
                ApiError::validation("Invalid reference")
            }
            DbError::ConstraintViolation(message) => {
                warn!(%message, "Constraint violation reached the database");
                ApiError::validation("Invalid value")
            }
            DbError::PoolExhausted => {
                error!("Database pool exhausted");
                ApiError::storage("Database is busy, try again")
            }
            DbError::PasswordHash(e) => {
                error!(error = %e, "Password hashing failed");
                ApiError::internal("Internal error")
            }
            DbError::ConnectionFailed(e) => {
                error!(error = %e, "Database connection failed");
                ApiError::storage("Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                error!(error = %e, "Migration failed");
                ApiError::storage("Database migration failed")
            }
            DbError::QueryFailed(e) | DbError::TransactionFailed(e) | DbError::Internal(e) => {
                error!(error = %e, "Database operation failed");
                ApiError::storage("Database operation failed")
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::CartTooLarge { .. } => ApiError::new(ErrorCode::CartError, err.to_string()),
            CoreError::QuantityTooLarge { .. } => {
                ApiError::new(ErrorCode::CartError, err.to_string())
            }
            CoreError::NoSale => ApiError::new(ErrorCode::NotFound, err.to_string()),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Malformed or missing JSON bodies get the same `{ code, message }` shape.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

/// Non-numeric ids in the URL.
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<tower_sessions::session::Error> for ApiError {
    fn from(err: tower_sessions::session::Error) -> Self {
        error!(error = %err, "Session store failed");
        ApiError::internal("Session error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_in_use_maps_to_400() {
        let err: ApiError = DbError::CategoryInUse { id: 1, products: 3 }.into();

        assert_eq!(err.code, ErrorCode::CategoryInUse);
        assert_eq!(err.code.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err: ApiError = DbError::QueryFailed("no such table: secrets".to_string()).into();

        assert_eq!(err.code.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("secrets"));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::not_found("Product", 42)).unwrap();

        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Product not found: 42");
    }

    #[test]
    fn test_core_errors() {
        let err: ApiError = CoreError::QuantityTooLarge {
            requested: 1000,
            max: 999,
        }
        .into();
        assert_eq!(err.code, ErrorCode::CartError);

        let err: ApiError = CoreError::NoSale.into();
        assert_eq!(err.code.status(), StatusCode::NOT_FOUND);
    }
}
