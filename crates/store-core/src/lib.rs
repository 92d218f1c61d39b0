//! # store-core
//!
//! Core types and the order-lifecycle engine for storefront-rs.
//!
//! This crate provides:
//! - `Money` for exact minor-unit currency arithmetic
//! - `Cart`, `Order`, and the `OrderStatus` state machine
//! - `CommerceStore`, the transactional in-memory store
//! - `PaymentGateway` trait for payment providers
//! - `OrderLifecycle` for cart conversion and webhook reconciliation
//! - `CheckoutService` for payment-session orchestration
//! - `StoreError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use store_core::{CheckoutService, CommerceStore, OrderLifecycle};
//!
//! let store = Arc::new(CommerceStore::new(customers, catalog));
//! let lifecycle = OrderLifecycle::new(store.clone(), gateway.clone());
//! let checkout = CheckoutService::new(store.clone(), gateway, urls);
//!
//! // Cart -> immutable pending order, atomically clearing the cart.
//! let order = lifecycle.create_order(user_id, "1 Main St")?;
//!
//! // Hosted payment session; redirect the customer to session.checkout_url.
//! let session = checkout.create_payment_session(order.id, user_id).await?;
//!
//! // Signed provider webhook settles the order exactly once.
//! let outcome = lifecycle.apply_payment_event(&body, &signature).await?;
//! ```

pub mod cart;
pub mod checkout;
pub mod customer;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod money;
pub mod order;
pub mod product;
pub mod store;

// Re-exports for convenience
pub use cart::{Cart, CartItem};
pub use checkout::CheckoutService;
pub use customer::{Customer, CustomerDirectory};
pub use error::{StoreError, StoreResult};
pub use gateway::{
    CheckoutUrls, GatewaySession, PaymentEvent, PaymentEventKind, PaymentGateway, SharedGateway,
    ORDER_ID_METADATA_KEY,
};
pub use lifecycle::{OrderLifecycle, WebhookDisposition};
pub use money::{Currency, Money};
pub use order::{Order, OrderItem, OrderStatus};
pub use product::{Product, ProductCatalog};
pub use store::{CommerceStore, Settlement};
