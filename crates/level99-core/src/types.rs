//! # Domain Types
//!
//! Core domain types used throughout the Level 99 store.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │◄──│     Product     │◄──│    CartLine     │       │
//! │  │  ─────────────  │ FK│  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │   │  id (i64)       │   │  product (copy) │       │
//! │  │  name           │   │  name           │   │  quantity ≥ 1   │       │
//! │  └─────────────────┘   │  price (Money)  │   └────────┬────────┘       │
//! │                        │  category_id?   │            │ frozen         │
//! │                        └─────────────────┘            ▼                │
//! │                                               ┌─────────────────┐       │
//! │                                               │      Sale       │       │
//! │                                               │  items, total,  │       │
//! │                                               │  timestamp      │       │
//! │                                               └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Identifiers are integers assigned by the database on insert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::validation::{
    validate_category_name, validate_id, validate_price, validate_product_name, ValidationResult,
};

// =============================================================================
// Category
// =============================================================================

/// A product category (a game genre in the store's vocabulary).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    /// Assigned by the store on creation, immutable afterwards.
    pub id: i64,

    /// Display name. The only editable field.
    pub name: String,
}

/// Create/rename payload for a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategoryInput {
    pub name: String,
}

impl CategoryInput {
    pub fn validate(self) -> ValidationResult<Self> {
        Ok(CategoryInput {
            name: validate_category_name(&self.name)?,
        })
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Assigned by the store on creation.
    pub id: i64,

    /// Display name shown on the POS screen and on the ticket.
    pub name: String,

    /// Unit price, never negative.
    #[serde(rename = "price_cents")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "price_cents"))]
    pub price: Money,

    /// Optional reference to a [`Category`].
    pub category_id: Option<i64>,
}

impl Product {
    /// Convenience constructor, mostly for tests and the seed binary.
    pub fn new(id: i64, name: impl Into<String>, price: Money, category_id: Option<i64>) -> Self {
        Product {
            id,
            name: name.into(),
            price,
            category_id,
        }
    }
}

/// Create/update payload for a product.
///
/// `POST /products` and `PUT /products/:id` share this body; an update
/// replaces every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductInput {
    pub name: String,

    #[serde(rename = "price_cents")]
    pub price: Money,

    #[serde(default)]
    pub category_id: Option<i64>,
}

impl ProductInput {
    /// Checks every field and returns the normalized payload.
    ///
    /// Names come back trimmed.
    pub fn validate(self) -> ValidationResult<Self> {
        let name = validate_product_name(&self.name)?;
        validate_price(self.price)?;
        if let Some(category_id) = self.category_id {
            validate_id("category_id", category_id)?;
        }

        Ok(ProductInput {
            name,
            price: self.price,
            category_id: self.category_id,
        })
    }
}

/// A product joined with its category, as listed by `GET /products`.
///
/// The POS screen shows the category name under each game, so listings
/// always carry the join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductWithCategory {
    #[serde(flatten)]
    pub product: Product,

    /// `None` when the product has no category.
    pub category: Option<Category>,
}

// =============================================================================
// Cart Line
// =============================================================================

/// One line of a cart: a product snapshot and how many units of it.
///
/// The product is copied in when first added, so later price edits in the
/// catalog do not change a cart that is already being rung up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product: Product,

    /// Always ≥ 1. A line at zero does not exist; it is removed instead.
    pub quantity: i64,
}

impl CartLine {
    /// `price × quantity` for this line.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.product.price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A frozen snapshot of a cart taken at checkout.
///
/// Never persisted: it lives in the session's register until the next
/// checkout replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    /// Lines in first-insertion order.
    pub items: Vec<CartLine>,

    /// Sum of the line totals at checkout.
    pub total: Money,

    /// When the sale was finalized.
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

impl Sale {
    /// Total units across all lines.
    pub fn unit_count(&self) -> i64 {
        self.items.iter().map(|line| line.quantity).sum()
    }
}

// =============================================================================
// User
// =============================================================================

/// A store operator allowed to use the back office and the POS screen.
///
/// The password hash never leaves the database crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub username: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
