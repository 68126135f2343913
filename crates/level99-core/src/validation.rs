//! # Validation
//!
//! Rules applied to category and product payloads before any SQL runs.
//!
//! | Field         | Rule                                  |
//! |---------------|---------------------------------------|
//! | `name`        | trimmed, non-empty, ≤ 200 characters  |
//! | `price_cents` | ≥ 0 (free demo discs are allowed)     |
//! | `category_id` | absent, or a positive id              |
//!
//! The schema repeats the name and price rules as `CHECK` constraints.

use crate::error::ValidationError;
use crate::money::Money;
use crate::MAX_NAME_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates and normalizes a display name.
///
/// ## Rules
/// - Surrounding whitespace is trimmed
/// - Must not be empty after trimming
/// - At most [`MAX_NAME_LEN`] characters
///
/// ## Returns
/// The trimmed name, ready to store.
///
/// ## Example
/// ```rust
/// use level99_core::validation::validate_name;
///
/// assert_eq!(validate_name("name", "  RPG ").unwrap(), "RPG");
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &'static str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required { field });
    }

    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_NAME_LEN,
        });
    }

    Ok(value.to_string())
}

/// Validates a category name.
pub fn validate_category_name(name: &str) -> ValidationResult<String> {
    validate_name("name", name)
}

/// Validates a product name.
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    validate_name("name", name)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price.
///
/// ## Rules
/// - Must be non-negative
/// - Zero is allowed (free demo discs, promo items)
///
/// ## Example
/// ```rust
/// use level99_core::money::Money;
/// use level99_core::validation::validate_price;
///
/// assert!(validate_price(Money::from_cents(0)).is_ok());
/// assert!(validate_price(Money::from_cents(-100)).is_err());
/// ```
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::Negative {
            field: "price_cents",
        });
    }

    Ok(())
}

/// Validates a referenced identifier (category or product).
pub fn validate_id(field: &'static str, id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::InvalidId { field });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
