//! # Store Error Types
//!
//! Typed error handling for the storefront engine.
//! All store and payment operations return `Result<T, StoreError>`.

use thiserror::Error;

use crate::order::OrderStatus;

/// Core error type for all store and payment operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data (bad quantity, malformed fields)
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Monetary amount could not be parsed or overflowed
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Arithmetic across two different currencies
    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: String, right: String },

    /// User id does not resolve in the customer directory
    #[error("User not found: {user_id}")]
    UserNotFound { user_id: u64 },

    /// Product not found in catalog (or inactive)
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: String },

    /// Cart item does not exist or does not belong to the caller's cart
    #[error("Cart item not found: {item_id}")]
    ItemNotFound { item_id: u64 },

    /// Order id is unknown
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: u64 },

    /// Record exists but is owned by a different user.
    /// Mapped to 404 over HTTP so ownership checks do not leak existence.
    #[error("Access denied")]
    Forbidden,

    /// Order creation attempted against a cart with no items
    #[error("Cannot create an order from an empty cart")]
    EmptyCart,

    /// Checkout attempted for an order that has already been paid
    #[error("Order {order_id} is already paid")]
    AlreadyPaid { order_id: u64 },

    /// Status change rejected by the order state machine
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Webhook signature verification failed
    #[error("Webhook verification failed: {0}")]
    SignatureInvalid(String),

    /// Webhook payload parsing error
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Payment provider API error
    #[error("Gateway error [{provider}]: {message}")]
    Gateway { provider: String, message: String },

    /// Network/HTTP error communicating with the provider
    #[error("Network error: {0}")]
    Network(String),

    /// Persistence failure; safe to retry
    #[error("Store failure: {0}")]
    StoreFailure(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Returns true if this error is retryable.
    ///
    /// A retryable failure on the webhook path is surfaced as a non-2xx
    /// response so the provider's at-least-once delivery redelivers.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Network(_) | StoreError::StoreFailure(_) | StoreError::Gateway { .. }
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::Configuration(_) => 500,
            StoreError::Validation(_) => 400,
            StoreError::InvalidAmount(_) => 400,
            StoreError::CurrencyMismatch { .. } => 400,
            StoreError::UserNotFound { .. } => 404,
            StoreError::ProductNotFound { .. } => 404,
            StoreError::ItemNotFound { .. } => 404,
            StoreError::OrderNotFound { .. } => 404,
            // Deliberately indistinguishable from a missing record.
            StoreError::Forbidden => 404,
            StoreError::EmptyCart => 409,
            StoreError::AlreadyPaid { .. } => 409,
            StoreError::InvalidTransition { .. } => 409,
            StoreError::SignatureInvalid(_) => 400,
            StoreError::WebhookParse(_) => 400,
            StoreError::Gateway { .. } => 502,
            StoreError::Network(_) => 503,
            StoreError::StoreFailure(_) => 503,
            StoreError::Serialization(_) => 500,
        }
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(StoreError::Network("timeout".into()).is_retryable());
        assert!(StoreError::StoreFailure("lock poisoned".into()).is_retryable());
        assert!(!StoreError::EmptyCart.is_retryable());
        assert!(!StoreError::SignatureInvalid("bad sig".into()).is_retryable());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(StoreError::Validation("test".into()).status_code(), 400);
        assert_eq!(
            StoreError::ProductNotFound { product_id: "x".into() }.status_code(),
            404
        );
        assert_eq!(StoreError::EmptyCart.status_code(), 409);
        assert_eq!(StoreError::AlreadyPaid { order_id: 1 }.status_code(), 409);
        assert_eq!(StoreError::StoreFailure("down".into()).status_code(), 503);
    }

    #[test]
    fn test_forbidden_is_indistinguishable_from_not_found() {
        assert_eq!(
            StoreError::Forbidden.status_code(),
            StoreError::OrderNotFound { order_id: 9 }.status_code()
        );
    }
}
