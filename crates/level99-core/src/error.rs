//! # Error Types
//!
//! ```text
//! ValidationError ──► CoreError ──┐
//!                                 ├──► ApiError (apps/server) ──► { code, message }
//!          level99-db::DbError ───┘
//! ```
//!
//! Cart errors leave the cart exactly as it was. Validation errors are raised
//! before anything reaches the database.

use thiserror::Error;

/// Cart and checkout rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The cart already has [`crate::MAX_CART_LINES`] distinct products.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// One more unit would push a line past [`crate::MAX_LINE_QUANTITY`].
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Nothing has been checked out in this session.
    #[error("No sale has been finalized yet")]
    NoSale,

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Rejected create/update payloads. `field` is the JSON field name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} must not be negative")]
    Negative { field: &'static str },

    #[error("{field} must be a positive id")]
    InvalidId { field: &'static str },
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_messages() {
        let err = CoreError::QuantityTooLarge {
            requested: 1000,
            max: 999,
        };
        assert_eq!(err.to_string(), "Quantity 1000 exceeds maximum allowed (999)");
        assert_eq!(
            CoreError::CartTooLarge { max: 100 }.to_string(),
            "Cart cannot have more than 100 lines"
        );
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::Required { field: "name" }.to_string(),
            "name is required"
        );
        assert_eq!(
            ValidationError::Negative { field: "price_cents" }.to_string(),
            "price_cents must not be negative"
        );
    }

    #[test]
    fn test_validation_wraps_into_core_error() {
        let err: CoreError = ValidationError::InvalidId { field: "category_id" }.into();

        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::InvalidId { .. })
        ));
    }
}
