//! # Commerce Store
//!
//! In-memory store for carts and orders. Customers and the product catalog
//! are immutable collaborator data; carts and orders live behind a single
//! `RwLock`, and that one lock is the transaction boundary: every compound
//! mutation (line lookup + quantity write, order persist + cart clear,
//! status read + compare-and-set) takes the write guard once, so concurrent
//! callers observe fully-old or fully-new state, never an intermediate one.
//!
//! Lock poisoning surfaces as a retryable `StoreFailure`, which the webhook
//! path reports as a transient error so the provider redelivers.

use crate::cart::{Cart, CartItem};
use crate::customer::CustomerDirectory;
use crate::error::{StoreError, StoreResult};
use crate::money::Money;
use crate::order::{Order, OrderItem, OrderStatus};
use crate::product::ProductCatalog;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Outcome of the webhook's compare-and-set settlement
#[derive(Debug, Clone)]
pub enum Settlement {
    /// The order moved pending -> paid in this call
    Transitioned(Order),
    /// The order was not pending; nothing changed. Duplicate deliveries
    /// land here.
    Unchanged(Order),
}

#[derive(Debug)]
struct StoreInner {
    /// Carts keyed by owning user id; one cart per user
    carts: HashMap<u64, Cart>,
    /// Orders keyed by id; BTreeMap keeps admin listings in creation order
    orders: BTreeMap<u64, Order>,
    next_cart_id: u64,
    next_item_id: u64,
    next_order_id: u64,
}

impl StoreInner {
    fn new() -> Self {
        Self {
            carts: HashMap::new(),
            orders: BTreeMap::new(),
            next_cart_id: 1,
            next_item_id: 1,
            next_order_id: 1,
        }
    }
}

/// The store behind all cart and order operations
#[derive(Debug)]
pub struct CommerceStore {
    customers: CustomerDirectory,
    catalog: Arc<ProductCatalog>,
    inner: RwLock<StoreInner>,
}

impl CommerceStore {
    /// Create a store over the given collaborator data
    pub fn new(customers: CustomerDirectory, catalog: Arc<ProductCatalog>) -> Self {
        Self { customers, catalog, inner: RwLock::new(StoreInner::new()) }
    }

    /// The catalog this store resolves products against
    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    /// The customer directory this store resolves callers against
    pub fn customers(&self) -> &CustomerDirectory {
        &self.customers
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, StoreInner>> {
        self.inner.read().map_err(|_| StoreError::StoreFailure("store lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, StoreInner>> {
        self.inner.write().map_err(|_| StoreError::StoreFailure("store lock poisoned".into()))
    }

    fn require_customer(&self, user_id: u64) -> StoreResult<()> {
        if self.customers.contains(user_id) {
            Ok(())
        } else {
            Err(StoreError::UserNotFound { user_id })
        }
    }

    // ------------------------------------------------------------------
    // Cart operations
    // ------------------------------------------------------------------

    /// The user's cart, created empty on first access
    pub fn cart_for_user(&self, user_id: u64) -> StoreResult<Cart> {
        self.require_customer(user_id)?;
        let mut guard = self.write()?;
        Ok(cart_entry(&mut guard, user_id).clone())
    }

    /// Add a product to the user's cart.
    ///
    /// Adding a product that is already in the cart increments that line's
    /// quantity rather than appending a second line.
    pub fn add_cart_item(&self, user_id: u64, product_id: &str, quantity: u32) -> StoreResult<Cart> {
        if quantity == 0 {
            return Err(StoreError::Validation("quantity must be at least 1".into()));
        }
        self.require_customer(user_id)?;
        let product = self
            .catalog
            .get_active(product_id)
            .ok_or_else(|| StoreError::ProductNotFound { product_id: product_id.to_string() })?;

        let mut guard = self.write()?;
        let StoreInner { carts, next_cart_id, next_item_id, .. } = &mut *guard;
        let cart = carts.entry(user_id).or_insert_with(|| {
            let id = *next_cart_id;
            *next_cart_id += 1;
            Cart::new(id, user_id)
        });

        if let Some(line) = cart.line_for_product_mut(&product.id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            let id = *next_item_id;
            *next_item_id += 1;
            cart.items.push(CartItem { id, product_id: product.id.clone(), quantity });
        }
        Ok(cart.clone())
    }

    /// Set a line's quantity; a quantity of zero or less removes the line.
    ///
    /// The line must belong to the caller's cart. A line id from another
    /// user's cart reports `ItemNotFound`, indistinguishable from a
    /// nonexistent id.
    pub fn update_cart_item(&self, user_id: u64, item_id: u64, quantity: i64) -> StoreResult<Cart> {
        self.require_customer(user_id)?;
        let mut guard = self.write()?;
        let cart = cart_entry(&mut guard, user_id);

        if cart.item(item_id).is_none() {
            return Err(StoreError::ItemNotFound { item_id });
        }
        if quantity <= 0 {
            cart.remove_line(item_id);
        } else {
            let quantity = u32::try_from(quantity)
                .map_err(|_| StoreError::Validation(format!("quantity {quantity} out of range")))?;
            if let Some(line) = cart.item_mut(item_id) {
                line.quantity = quantity;
            }
        }
        Ok(cart.clone())
    }

    /// Remove a line from the caller's cart
    pub fn remove_cart_item(&self, user_id: u64, item_id: u64) -> StoreResult<Cart> {
        self.require_customer(user_id)?;
        let mut guard = self.write()?;
        let cart = cart_entry(&mut guard, user_id);

        if !cart.remove_line(item_id) {
            return Err(StoreError::ItemNotFound { item_id });
        }
        Ok(cart.clone())
    }

    // ------------------------------------------------------------------
    // Order operations
    // ------------------------------------------------------------------

    /// Convert the user's cart into an immutable order snapshot.
    ///
    /// Runs entirely under one write guard: the snapshot rows, the computed
    /// total, and the cleared cart commit together or not at all. A failure
    /// while pricing the lines leaves both cart and order book untouched.
    pub fn create_order(&self, user_id: u64, shipping_address: &str) -> StoreResult<Order> {
        self.require_customer(user_id)?;
        let mut guard = self.write()?;

        // Price the lines before touching anything mutable.
        let cart_lines: Vec<CartItem> = cart_entry(&mut guard, user_id).items.clone();
        if cart_lines.is_empty() {
            return Err(StoreError::EmptyCart);
        }

        let mut items = Vec::with_capacity(cart_lines.len());
        let mut total: Option<Money> = None;
        for line in &cart_lines {
            let product = self.catalog.get(&line.product_id).ok_or_else(|| {
                StoreError::ProductNotFound { product_id: line.product_id.clone() }
            })?;
            let item = OrderItem::snapshot(product, line.quantity);
            let subtotal = item.subtotal()?;
            total = Some(match total {
                Some(t) => t.checked_add(subtotal)?,
                None => subtotal,
            });
            items.push(item);
        }
        let Some(total) = total else {
            return Err(StoreError::EmptyCart);
        };

        let StoreInner { carts, orders, next_order_id, .. } = &mut *guard;
        let id = *next_order_id;
        *next_order_id += 1;

        let order = Order {
            id,
            user_id,
            items,
            total,
            status: OrderStatus::Pending,
            shipping_address: shipping_address.to_string(),
            created_at: Utc::now(),
        };
        orders.insert(id, order.clone());
        if let Some(cart) = carts.get_mut(&user_id) {
            cart.items.clear();
        }
        Ok(order)
    }

    /// Fetch an order by id
    pub fn order(&self, order_id: u64) -> StoreResult<Order> {
        let guard = self.read()?;
        guard
            .orders
            .get(&order_id)
            .cloned()
            .ok_or(StoreError::OrderNotFound { order_id })
    }

    /// Fetch an order, checking ownership
    pub fn order_for_user(&self, order_id: u64, user_id: u64) -> StoreResult<Order> {
        let order = self.order(order_id)?;
        if order.user_id != user_id {
            return Err(StoreError::Forbidden);
        }
        Ok(order)
    }

    /// All of a user's orders, newest first
    pub fn orders_for_user(&self, user_id: u64) -> StoreResult<Vec<Order>> {
        let guard = self.read()?;
        Ok(guard
            .orders
            .values()
            .rev()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    /// Every order in the store, in creation order (admin listing)
    pub fn all_orders(&self) -> StoreResult<Vec<Order>> {
        let guard = self.read()?;
        Ok(guard.orders.values().cloned().collect())
    }

    /// Compare-and-set an order to paid.
    ///
    /// The status read and write happen under one write guard, so two
    /// concurrent deliveries of the same completed-session event cannot
    /// both transition: the second observes a settled order and reports
    /// `Unchanged`.
    pub fn settle_order_paid(&self, order_id: u64) -> StoreResult<Settlement> {
        let mut guard = self.write()?;
        let order = guard
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound { order_id })?;

        if order.status == OrderStatus::Pending {
            order.status = OrderStatus::Paid;
            Ok(Settlement::Transitioned(order.clone()))
        } else {
            Ok(Settlement::Unchanged(order.clone()))
        }
    }

    /// Administrative status change, validated against the state machine
    pub fn update_order_status(&self, order_id: u64, next: OrderStatus) -> StoreResult<Order> {
        let mut guard = self.write()?;
        let order = guard
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound { order_id })?;
        order.transition(next)?;
        Ok(order.clone())
    }
}

fn cart_entry(inner: &mut StoreInner, user_id: u64) -> &mut Cart {
    let StoreInner { carts, next_cart_id, .. } = inner;
    carts.entry(user_id).or_insert_with(|| {
        let id = *next_cart_id;
        *next_cart_id += 1;
        Cart::new(id, user_id)
    })
}
