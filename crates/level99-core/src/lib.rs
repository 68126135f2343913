//! # level99-core: Pure Business Logic for the Level 99 Store
//!
//! Everything the point of sale computes lives here as plain data and pure
//! functions. Storage and HTTP live in `level99-db` and the server app.
//!
//! ```text
//! React UI ──► apps/server (axum) ──► level99-core ◄── level99-db
//!                                      types · money · cart · ticket
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Category, Product, CartLine, Sale)
//! - [`money`] - Integer cents
//! - [`cart`] - Cart engine and per-terminal register
//! - [`ticket`] - Paginated ticket layout and PDF rendering
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use level99_core::cart::Cart;
//! use level99_core::money::Money;
//! use level99_core::types::Product;
//!
//! let zelda = Product::new(1, "Zelda", Money::from_cents(1000), None);
//! let tetris = Product::new(2, "Tetris", Money::from_cents(500), None);
//!
//! let mut cart = Cart::new();
//! cart.add_to_cart(&zelda).unwrap();
//! cart.add_to_cart(&zelda).unwrap();
//! cart.add_to_cart(&tetris).unwrap();
//!
//! assert_eq!(cart.compute_total().cents(), 2500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod ticket;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, Register};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use ticket::{Ticket, TicketConfig};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Distinct products one cart may hold.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line.
///
/// Each add increments by one, so reaching this means the same game was
/// added 999 times in one sale.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Maximum length of category and product names.
pub const MAX_NAME_LEN: usize = 200;
