//! # Cart Engine
//!
//! The in-progress sale of one terminal and the checkout transition.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Frontend Action        Engine Call                State Change         │
//! │  ───────────────        ───────────                ────────────         │
//! │                                                                         │
//! │  Click "Add" ─────────► add_to_cart(p) ──────────► qty+1 or push line  │
//! │                                                                         │
//! │  Click "Remove" ──────► remove_from_cart(id) ────► line dropped        │
//! │                                                                         │
//! │  View Cart ───────────► compute_total() ─────────► (read only)         │
//! │                                                                         │
//! │  Click "Finalize" ────► Register::checkout() ────► Sale frozen,        │
//! │                                                    cart emptied         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by product id; re-adding increments the quantity
//! - Every line has quantity ≥ 1
//! - Line order is first-insertion order
//! - The total is recomputed from the lines on every call, never cached

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CartLine, Product, Sale};
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Cart
// =============================================================================

/// An ordered collection of cart lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds one unit of `product`.
    ///
    /// ## Behavior
    /// - Product already in cart: its quantity goes up by one
    /// - Product not in cart: a new line with quantity 1 is appended
    ///
    /// The product is snapshotted on first add; later adds only bump the
    /// quantity, so the line keeps the price it was rung up at.
    ///
    /// ## Errors
    /// Fails without touching the cart when the line is already at
    /// [`MAX_LINE_QUANTITY`] or the cart already has [`MAX_CART_LINES`] lines.
    pub fn add_to_cart(&mut self, product: &Product) -> CoreResult<&CartLine> {
        if let Some(index) = self.position(product.id) {
            let line = &mut self.lines[index];
            let requested = line.quantity + 1;
            if requested > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested,
                    max: MAX_LINE_QUANTITY,
                });
            }
            line.quantity = requested;
            return Ok(&self.lines[index]);
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        self.lines.push(CartLine {
            product: product.clone(),
            quantity: 1,
        });
        Ok(&self.lines[self.lines.len() - 1])
    }

    /// Removes the line for `product_id`, whatever its quantity.
    ///
    /// Removing a product that is not in the cart is a no-op. Returns
    /// whether a line was actually removed.
    pub fn remove_from_cart(&mut self, product_id: i64) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product.id != product_id);
        self.lines.len() != before
    }

    /// `Σ price × quantity` over the current lines.
    pub fn compute_total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Freezes the cart into a [`Sale`] and empties it.
    ///
    /// An empty cart produces nothing and is left as is. Otherwise the
    /// snapshot and the clear happen in the same `&mut self` call, so no
    /// reader can see a half-cleared cart.
    pub fn finalize_sale(&mut self, now: DateTime<Utc>) -> Option<Sale> {
        if self.lines.is_empty() {
            return None;
        }

        let total = self.compute_total();
        let items = std::mem::take(&mut self.lines);

        Some(Sale {
            items,
            total,
            timestamp: now,
        })
    }

    /// Current lines in first-insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Quantity of `product_id` in the cart (0 when absent).
    pub fn quantity_of(&self, product_id: i64) -> i64 {
        self.position(product_id)
            .map(|index| self.lines[index].quantity)
            .unwrap_or(0)
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn position(&self, product_id: i64) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| line.product.id == product_id)
    }
}

// =============================================================================
// Register
// =============================================================================

/// One terminal's point-of-sale state: the open cart and the last sale.
///
/// The server keeps one register per session, so two cashiers logged in at
/// the same time never share a cart.
#[derive(Debug, Clone, Default)]
pub struct Register {
    cart: Cart,
    last_sale: Option<Sale>,
}

impl Register {
    /// Creates a register with an empty cart and no sale.
    pub fn new() -> Self {
        Register::default()
    }

    /// Read access to the open cart.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Write access to the open cart.
    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    /// The most recently finalized sale, if any.
    pub fn last_sale(&self) -> Option<&Sale> {
        self.last_sale.as_ref()
    }

    /// Finalizes the open cart.
    ///
    /// ## Behavior
    /// - Empty cart: returns `None`; cart and last sale are unchanged
    /// - Otherwise: the new sale replaces the last sale, the cart is emptied,
    ///   and a reference to the new sale is returned
    pub fn checkout(&mut self, now: DateTime<Utc>) -> Option<&Sale> {
        let sale = self.cart.finalize_sale(now)?;
        self.last_sale = Some(sale);
        self.last_sale.as_ref()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, price_cents: i64) -> Product {
        Product::new(id, format!("Game {}", id), Money::from_cents(price_cents), None)
    }

    #[test]
    fn test_repeated_adds_accumulate_on_one_line() {
        let mut cart = Cart::new();
        let p = product(1, 999);

        for _ in 0..7 {
            cart.add_to_cart(&p).unwrap();
        }

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.quantity_of(1), 7);
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let mut cart = Cart::new();
        cart.add_to_cart(&product(3, 100)).unwrap();
        cart.add_to_cart(&product(1, 100)).unwrap();
        cart.add_to_cart(&product(3, 100)).unwrap();
        cart.add_to_cart(&product(2, 100)).unwrap();

        let ids: Vec<i64> = cart.lines().iter().map(|l| l.product.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_first_snapshot_keeps_its_price() {
        let mut cart = Cart::new();
        cart.add_to_cart(&product(1, 1000)).unwrap();

        // Catalog price changed after the game was rung up.
        cart.add_to_cart(&product(1, 4000)).unwrap();

        assert_eq!(cart.compute_total().cents(), 2000);
    }

    #[test]
    fn test_remove_is_whole_line_and_idempotent() {
        let mut cart = Cart::new();
        let p = product(1, 500);
        cart.add_to_cart(&p).unwrap();
        cart.add_to_cart(&p).unwrap();
        cart.add_to_cart(&product(2, 300)).unwrap();

        assert!(cart.remove_from_cart(1));
        let after_first = cart.clone();

        assert!(!cart.remove_from_cart(1));
        assert_eq!(cart, after_first);
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.quantity_of(1), 0);
    }

    #[test]
    fn test_remove_absent_product_from_empty_cart() {
        let mut cart = Cart::new();
        assert!(!cart.remove_from_cart(42));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_total_is_sum_of_price_times_quantity() {
        let mut cart = Cart::new();
        assert!(cart.compute_total().is_zero());

        cart.add_to_cart(&product(1, 1099)).unwrap();
        cart.add_to_cart(&product(1, 1099)).unwrap();
        cart.add_to_cart(&product(2, 1)).unwrap();
        cart.add_to_cart(&product(3, 250)).unwrap();

        assert_eq!(cart.compute_total().cents(), 1099 * 2 + 1 + 250);
    }

    #[test]
    fn test_zero_price_product_adds_line_not_total() {
        let mut cart = Cart::new();
        cart.add_to_cart(&product(1, 1500)).unwrap();
        let before = cart.compute_total();

        cart.add_to_cart(&product(2, 0)).unwrap();

        assert_eq!(cart.line_count(), 2);
        assert_eq!(cart.compute_total(), before);
    }

    #[test]
    fn test_finalize_empty_cart_is_noop() {
        let mut register = Register::new();

        assert!(register.checkout(Utc::now()).is_none());
        assert!(register.cart().is_empty());
        assert!(register.last_sale().is_none());
    }

    #[test]
    fn test_finalize_empty_cart_keeps_previous_sale() {
        let mut register = Register::new();
        register.cart_mut().add_to_cart(&product(1, 700)).unwrap();
        register.checkout(Utc::now()).unwrap();
        let previous = register.last_sale().cloned();

        assert!(register.checkout(Utc::now()).is_none());
        assert_eq!(register.last_sale().cloned(), previous);
    }

    #[test]
    fn test_finalize_freezes_total_and_clears_cart() {
        let mut cart = Cart::new();
        cart.add_to_cart(&product(1, 1234)).unwrap();
        cart.add_to_cart(&product(2, 66)).unwrap();
        let expected_total = cart.compute_total();
        let expected_lines = cart.lines().to_vec();

        let now = Utc::now();
        let sale = cart.finalize_sale(now).unwrap();

        assert_eq!(sale.total, expected_total);
        assert_eq!(sale.items, expected_lines);
        assert_eq!(sale.timestamp, now);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_point_of_sale_scenario() {
        let p1 = product(1, 10);
        let p2 = product(2, 5);
        let mut register = Register::new();

        register.cart_mut().add_to_cart(&p1).unwrap();
        assert_eq!(register.cart().quantity_of(1), 1);

        register.cart_mut().add_to_cart(&p1).unwrap();
        assert_eq!(register.cart().quantity_of(1), 2);

        register.cart_mut().add_to_cart(&p2).unwrap();
        let quantities: Vec<(i64, i64)> = register
            .cart()
            .lines()
            .iter()
            .map(|l| (l.product.id, l.quantity))
            .collect();
        assert_eq!(quantities, vec![(1, 2), (2, 1)]);
        assert_eq!(register.cart().compute_total().cents(), 25);

        let sale = register.checkout(Utc::now()).unwrap().clone();
        assert_eq!(sale.items.len(), 2);
        assert_eq!(sale.total.cents(), 25);
        assert!(register.cart().is_empty());
        assert_eq!(register.last_sale(), Some(&sale));
    }

    #[test]
    fn test_line_quantity_limit() {
        let mut cart = Cart::new();
        let p = product(1, 100);
        for _ in 0..MAX_LINE_QUANTITY {
            cart.add_to_cart(&p).unwrap();
        }

        let err = cart.add_to_cart(&p).unwrap_err();
        assert!(matches!(err, CoreError::QuantityTooLarge { .. }));
        assert_eq!(cart.quantity_of(1), MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_cart_line_limit() {
        let mut cart = Cart::new();
        for id in 1..=MAX_CART_LINES as i64 {
            cart.add_to_cart(&product(id, 100)).unwrap();
        }

        let err = cart.add_to_cart(&product(10_000, 100)).unwrap_err();
        assert!(matches!(err, CoreError::CartTooLarge { .. }));
        assert_eq!(cart.line_count(), MAX_CART_LINES);

        // Existing lines can still be bumped.
        cart.add_to_cart(&product(1, 100)).unwrap();
        assert_eq!(cart.quantity_of(1), 2);
    }
}
