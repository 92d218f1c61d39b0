//! # Cart Types
//!
//! Mutable pre-checkout container. A cart line holds a product id and a
//! quantity, never a price: displayed subtotals dereference the live catalog
//! at read time, while orders freeze prices at creation.

use serde::{Deserialize, Serialize};

/// A line in a cart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    /// Line id, unique across all carts
    pub id: u64,

    /// Product id in the catalog
    pub product_id: String,

    /// Quantity, always >= 1 while the line exists
    pub quantity: u32,
}

/// A user's cart.
///
/// One per user, created lazily on first access and emptied (never deleted)
/// when an order is created from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    /// Cart id
    pub id: u64,

    /// Owning user
    pub user_id: u64,

    /// Lines, at most one per product
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart for a user
    pub fn new(id: u64, user_id: u64) -> Self {
        Self { id, user_id, items: Vec::new() }
    }

    /// Check if the cart has no lines
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total quantity across all lines
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Find a line by its id
    pub fn item(&self, item_id: u64) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    /// Find the line for a product, if one exists
    pub fn line_for_product_mut(&mut self, product_id: &str) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|i| i.product_id == product_id)
    }

    /// Mutable lookup of a line by id
    pub fn item_mut(&mut self, item_id: u64) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|i| i.id == item_id)
    }

    /// Remove a line by id; returns whether anything was removed
    pub fn remove_line(&mut self, item_id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != item_id);
        self.items.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart_with_lines() -> Cart {
        let mut cart = Cart::new(1, 42);
        cart.items.push(CartItem { id: 10, product_id: "desk-lamp".into(), quantity: 2 });
        cart.items.push(CartItem { id: 11, product_id: "mug".into(), quantity: 1 });
        cart
    }

    #[test]
    fn test_item_count() {
        let cart = cart_with_lines();
        assert_eq!(cart.item_count(), 3);
        assert!(!cart.is_empty());
        assert!(Cart::new(2, 7).is_empty());
    }

    #[test]
    fn test_line_lookup_and_removal() {
        let mut cart = cart_with_lines();
        assert_eq!(cart.item(10).unwrap().product_id, "desk-lamp");
        assert!(cart.item(99).is_none());

        cart.line_for_product_mut("mug").unwrap().quantity = 4;
        assert_eq!(cart.item(11).unwrap().quantity, 4);

        assert!(cart.remove_line(10));
        assert!(!cart.remove_line(10));
        assert_eq!(cart.items.len(), 1);
    }
}
