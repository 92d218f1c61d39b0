//! # store-stripe
//!
//! Stripe payment gateway adapter for storefront-rs.
//!
//! Implements `store_core::PaymentGateway` over Stripe's Checkout Sessions
//! API: dynamic line items built from an order's frozen snapshots, the local
//! order id attached as correlation metadata, and HMAC-SHA256 verification
//! of inbound webhook events.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use store_stripe::StripeGateway;
//! use store_core::PaymentGateway;
//!
//! // Construct explicitly; the gateway is injected where it is needed.
//! let gateway = StripeGateway::from_env()?;
//!
//! let session = gateway.create_session(
//!     &order,
//!     "https://shop.example.com/checkout/success",
//!     "https://shop.example.com/checkout/cancel",
//! ).await?;
//!
//! // Redirect the customer to session.checkout_url. Settlement arrives
//! // later on the webhook path:
//! let event = gateway.verify_webhook(&raw_body, &signature_header).await?;
//! ```

pub mod config;
pub mod gateway;

// Re-exports
pub use config::StripeConfig;
pub use gateway::StripeGateway;
