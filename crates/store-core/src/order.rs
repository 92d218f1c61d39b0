//! # Order Types
//!
//! Immutable order snapshots and the order status machine.
//!
//! An order freezes the product name and unit price observed at creation
//! time, so later catalog edits never alter order history or the amount
//! owed. Items hold a plain product id rather than a catalog reference,
//! letting order history survive product deletion.

use crate::error::{StoreError, StoreResult};
use crate::money::Money;
use crate::product::Product;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order status.
///
/// Closed set; any other value is unrepresentable. Transitions are validated
/// by [`OrderStatus::can_transition`] rather than accepting arbitrary
/// strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Created, awaiting payment
    Pending,
    /// Payment confirmed via webhook
    Paid,
    /// Handed to the carrier
    Shipped,
    /// Received by the customer
    Delivered,
    /// Cancelled before fulfilment
    Cancelled,
}

impl OrderStatus {
    /// Whether the machine allows moving from `self` to `next`.
    ///
    /// pending -> paid | cancelled
    /// paid    -> shipped | cancelled
    /// shipped -> delivered
    pub fn can_transition(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Paid)
                | (Pending, Cancelled)
                | (Paid, Shipped)
                | (Paid, Cancelled)
                | (Shipped, Delivered)
        )
    }

    /// True once payment has been confirmed (paid or any later fulfilment
    /// state). A settled order is never re-billed.
    pub fn is_settled(self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Shipped | OrderStatus::Delivered)
    }

    /// Lowercase name, matching the serialized form
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A frozen order line.
///
/// The subtotal is computed from its inputs on demand and never stored, so
/// it cannot diverge from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product id at the time of ordering; not a live catalog reference
    pub product_id: String,

    /// Product name as it read at creation time
    pub product_name: String,

    /// Unit price observed at creation time
    pub unit_price: Money,

    /// Quantity ordered
    pub quantity: u32,
}

impl OrderItem {
    /// Snapshot a catalog product into a frozen line
    pub fn snapshot(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            unit_price: product.price,
            quantity,
        }
    }

    /// Line subtotal: unit price times quantity, exact
    pub fn subtotal(&self) -> StoreResult<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

/// An immutable financial record created once from a cart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Order id
    pub id: u64,

    /// Owning user id, snapshot rather than a live account reference
    pub user_id: u64,

    /// Frozen lines
    pub items: Vec<OrderItem>,

    /// Exact sum of line subtotals at creation time
    pub total: Money,

    /// Current status
    pub status: OrderStatus,

    /// Shipping address captured at creation
    pub shipping_address: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Total quantity across all lines
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Apply a validated status transition
    pub fn transition(&mut self, next: OrderStatus) -> StoreResult<()> {
        if !self.status.can_transition(next) {
            return Err(StoreError::InvalidTransition { from: self.status, to: next });
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    fn product(price_minor: i64) -> Product {
        Product::new("desk-lamp", "Desk Lamp", Money::from_minor(price_minor, Currency::USD))
    }

    #[test]
    fn test_transition_matrix() {
        use OrderStatus::*;
        let allowed = [
            (Pending, Paid),
            (Pending, Cancelled),
            (Paid, Shipped),
            (Paid, Cancelled),
            (Shipped, Delivered),
        ];
        let all = [Pending, Paid, Shipped, Delivered, Cancelled];
        for from in all {
            for to in all {
                assert_eq!(
                    from.can_transition(to),
                    allowed.contains(&(from, to)),
                    "transition {from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_settled_states() {
        assert!(!OrderStatus::Pending.is_settled());
        assert!(OrderStatus::Paid.is_settled());
        assert!(OrderStatus::Shipped.is_settled());
        assert!(OrderStatus::Delivered.is_settled());
        assert!(!OrderStatus::Cancelled.is_settled());
    }

    #[test]
    fn test_snapshot_freezes_price() {
        let mut p = product(2499);
        let item = OrderItem::snapshot(&p, 2);

        // A later catalog edit must not reach the frozen line.
        p.price = Money::from_minor(9999, Currency::USD);
        p.name = "Renamed".into();

        assert_eq!(item.unit_price, Money::from_minor(2499, Currency::USD));
        assert_eq!(item.product_name, "Desk Lamp");
        assert_eq!(item.subtotal().unwrap(), Money::from_minor(4998, Currency::USD));
    }

    #[test]
    fn test_order_transition_validation() {
        let mut order = Order {
            id: 1,
            user_id: 42,
            items: vec![OrderItem::snapshot(&product(1000), 1)],
            total: Money::from_minor(1000, Currency::USD),
            status: OrderStatus::Pending,
            shipping_address: "1 Main St".into(),
            created_at: Utc::now(),
        };

        order.transition(OrderStatus::Paid).unwrap();
        assert_eq!(order.status, OrderStatus::Paid);

        let err = order.transition(OrderStatus::Pending).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
        assert_eq!(order.status, OrderStatus::Paid);

        order.transition(OrderStatus::Shipped).unwrap();
        order.transition(OrderStatus::Delivered).unwrap();
        assert!(order.transition(OrderStatus::Cancelled).is_err());
    }
}
