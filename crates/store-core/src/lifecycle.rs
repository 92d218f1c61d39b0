//! # Order Lifecycle
//!
//! Creates orders from carts and applies webhook-driven status transitions.
//!
//! The webhook path assumes at-least-once delivery: duplicates and
//! out-of-order events are routine, so the only transition it ever performs
//! is an idempotent compare-and-set from pending to paid. Signature
//! verification happens before any state is read or written.

use crate::error::{StoreError, StoreResult};
use crate::gateway::{PaymentEventKind, SharedGateway};
use crate::order::{Order, OrderStatus};
use crate::store::{CommerceStore, Settlement};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// What a verified webhook event amounted to.
///
/// Everything here is an acknowledged outcome; the provider should not
/// redeliver any of them. Retryable conditions surface as errors instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookDisposition {
    /// The order moved pending -> paid
    Settled { order_id: u64 },
    /// The order was already paid or later; duplicate delivery, no-op
    AlreadySettled { order_id: u64, status: OrderStatus },
    /// Event kind carries no transition in this design
    Ignored { kind: PaymentEventKind },
    /// No usable order id in the correlation metadata; not our session
    ForeignSession { event_id: String },
    /// The referenced order no longer exists locally
    OrderMissing { order_id: u64 },
}

/// Order creation and payment reconciliation
pub struct OrderLifecycle {
    store: Arc<CommerceStore>,
    gateway: SharedGateway,
}

impl OrderLifecycle {
    /// Build a lifecycle over an explicitly injected store and gateway
    pub fn new(store: Arc<CommerceStore>, gateway: SharedGateway) -> Self {
        Self { store, gateway }
    }

    /// Convert the user's cart into a pending order.
    ///
    /// Snapshot rows, exact total, and the cleared cart commit atomically;
    /// see [`CommerceStore::create_order`].
    #[instrument(skip(self, shipping_address), fields(user_id = user_id))]
    pub fn create_order(&self, user_id: u64, shipping_address: &str) -> StoreResult<Order> {
        let order = self.store.create_order(user_id, shipping_address)?;
        info!(
            order_id = order.id,
            total = %order.total,
            items = order.items.len(),
            "order created from cart"
        );
        Ok(order)
    }

    /// Verify and apply one inbound payment event.
    ///
    /// Returns `Ok` for every acknowledged outcome, including duplicates,
    /// foreign sessions, and locally-missing orders. Returns `Err` only for
    /// signature failures (terminal per event) and store failures (the one
    /// case the provider should retry).
    #[instrument(skip_all)]
    pub async fn apply_payment_event(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> StoreResult<WebhookDisposition> {
        // Authenticity first; nothing is read or written before this.
        let event = self.gateway.verify_webhook(payload, signature).await?;

        if event.kind != PaymentEventKind::CheckoutCompleted {
            // Other kinds report the same logical payment through other
            // channels; acting on them would double-process it.
            info!(event_id = %event.event_id, kind = ?event.kind, "acknowledging event without action");
            return Ok(WebhookDisposition::Ignored { kind: event.kind });
        }

        let Some(order_id) = event.order_id() else {
            warn!(
                event_id = %event.event_id,
                session_id = event.session_id.as_deref().unwrap_or("unknown"),
                "completed session carries no usable order id; not created by this system"
            );
            return Ok(WebhookDisposition::ForeignSession { event_id: event.event_id });
        };

        match self.store.settle_order_paid(order_id) {
            Ok(Settlement::Transitioned(order)) => {
                info!(
                    event_id = %event.event_id,
                    order_id,
                    total = %order.total,
                    "order settled: pending -> paid"
                );
                Ok(WebhookDisposition::Settled { order_id })
            }
            Ok(Settlement::Unchanged(order)) => {
                info!(
                    event_id = %event.event_id,
                    order_id,
                    status = %order.status,
                    "duplicate or late delivery; order already settled"
                );
                Ok(WebhookDisposition::AlreadySettled { order_id, status: order.status })
            }
            Err(StoreError::OrderNotFound { .. }) => {
                warn!(
                    event_id = %event.event_id,
                    order_id,
                    "event references an order that no longer exists locally"
                );
                Ok(WebhookDisposition::OrderMissing { order_id })
            }
            Err(err) => {
                warn!(
                    event_id = %event.event_id,
                    order_id,
                    error = %err,
                    "store failure while settling; provider retry will redeliver"
                );
                Err(err)
            }
        }
    }
}
