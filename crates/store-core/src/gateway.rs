//! # Payment Gateway Trait
//!
//! Narrow seam to the external payment provider. The rest of the system
//! sees exactly two capabilities: create a hosted payment session for an
//! order's line items, and verify-and-decode an inbound webhook payload.
//!
//! Implementations are constructed explicitly and injected at composition
//! time; there is no ambient provider state.

use crate::error::StoreResult;
use crate::order::Order;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Correlation-metadata key carrying the local order id.
///
/// Attached to the session at creation time and echoed back by the provider
/// inside the event's session object; the webhook has no other reliable way
/// to map an event to an order.
pub const ORDER_ID_METADATA_KEY: &str = "orderId";

/// A hosted payment session created by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySession {
    /// Provider's session id
    pub session_id: String,

    /// Local order id the session was created for
    pub order_id: u64,

    /// URL to redirect the customer to for payment
    pub checkout_url: String,

    /// When the session expires, if the provider reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Kinds of provider events this system understands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentEventKind {
    /// Hosted checkout session completed; the only kind that drives a
    /// status transition
    CheckoutCompleted,
    /// Lower-level payment success; acknowledged, not acted on
    PaymentSucceeded,
    /// Lower-level payment failure; acknowledged, not acted on
    PaymentFailed,
    /// Anything else the provider sends
    Unknown(String),
}

/// A verified, decoded webhook event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEvent {
    /// Event id from the provider
    pub event_id: String,

    /// Event kind
    pub kind: PaymentEventKind,

    /// Session id the event refers to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Amount paid in minor units, if reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_total: Option<i64>,

    /// Correlation metadata echoed from session creation
    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// Provider-side event timestamp
    pub timestamp: DateTime<Utc>,
}

impl PaymentEvent {
    /// The local order id from correlation metadata, if present and
    /// parseable. `None` means the session was not created by this system.
    pub fn order_id(&self) -> Option<u64> {
        self.metadata.get(ORDER_ID_METADATA_KEY)?.parse().ok()
    }
}

/// External payment provider interface.
///
/// `create_session` must complete within a bounded timeout and surface
/// failures as typed errors rather than hang; a timed-out call mutates no
/// local state. `verify_webhook` must be handed the raw request body bytes
/// unaltered, since any re-serialization breaks signature validation.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted payment session for an order's frozen line items.
    ///
    /// The local order id is attached as correlation metadata under
    /// [`ORDER_ID_METADATA_KEY`].
    async fn create_session(
        &self,
        order: &Order,
        success_url: &str,
        cancel_url: &str,
    ) -> StoreResult<GatewaySession>;

    /// Verify a webhook signature and decode the event.
    ///
    /// Fails with `SignatureInvalid` before anything else happens.
    async fn verify_webhook(&self, payload: &[u8], signature: &str) -> StoreResult<PaymentEvent>;

    /// Provider name, for logging
    fn provider_name(&self) -> &'static str;
}

/// Shared handle to a gateway implementation
pub type SharedGateway = Arc<dyn PaymentGateway>;

/// Redirect URLs handed to the provider at session creation
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    /// Base URL of the storefront (e.g., "https://shop.example.com")
    pub base_url: String,
    /// Success page path
    pub success_path: String,
    /// Cancel page path
    pub cancel_path: String,
}

impl CheckoutUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            success_path: "/checkout/success".to_string(),
            cancel_path: "/checkout/cancel".to_string(),
        }
    }

    pub fn success_url(&self) -> String {
        format!("{}{}", self.base_url, self.success_path)
    }

    pub fn cancel_url(&self) -> String {
        format!("{}{}", self.base_url, self.cancel_path)
    }

    /// Success URL with the provider's session-id placeholder appended
    pub fn success_url_with_session(&self) -> String {
        if self.success_url().contains('?') {
            format!("{}&session_id={{CHECKOUT_SESSION_ID}}", self.success_url())
        } else {
            format!("{}?session_id={{CHECKOUT_SESSION_ID}}", self.success_url())
        }
    }
}

impl Default for CheckoutUrls {
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_urls() {
        let urls = CheckoutUrls::new("https://shop.example.com");

        assert_eq!(urls.success_url(), "https://shop.example.com/checkout/success");
        assert_eq!(urls.cancel_url(), "https://shop.example.com/checkout/cancel");
        assert_eq!(
            urls.success_url_with_session(),
            "https://shop.example.com/checkout/success?session_id={CHECKOUT_SESSION_ID}"
        );
    }

    #[test]
    fn test_event_order_id_extraction() {
        let mut event = PaymentEvent {
            event_id: "evt_1".into(),
            kind: PaymentEventKind::CheckoutCompleted,
            session_id: Some("cs_1".into()),
            amount_total: Some(2000),
            metadata: HashMap::new(),
            timestamp: Utc::now(),
        };
        assert_eq!(event.order_id(), None);

        event.metadata.insert(ORDER_ID_METADATA_KEY.into(), "17".into());
        assert_eq!(event.order_id(), Some(17));

        event.metadata.insert(ORDER_ID_METADATA_KEY.into(), "not-a-number".into());
        assert_eq!(event.order_id(), None);
    }
}
