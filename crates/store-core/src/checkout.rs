//! # Checkout Service
//!
//! Orchestrates payment-session creation against an existing order. Never
//! mutates order state: a synchronous checkout call has no proof that
//! payment completed, so transitions happen only on the webhook path.

use crate::error::{StoreError, StoreResult};
use crate::gateway::{CheckoutUrls, GatewaySession, SharedGateway};
use crate::order::OrderStatus;
use crate::store::CommerceStore;
use std::sync::Arc;
use tracing::{info, instrument};

/// Payment-session orchestration
pub struct CheckoutService {
    store: Arc<CommerceStore>,
    gateway: SharedGateway,
    urls: CheckoutUrls,
}

impl CheckoutService {
    /// Build a checkout service over an explicitly injected store and gateway
    pub fn new(store: Arc<CommerceStore>, gateway: SharedGateway, urls: CheckoutUrls) -> Self {
        Self { store, gateway, urls }
    }

    /// Create a hosted payment session for the caller's order.
    ///
    /// Fails before reaching the provider when the order is unknown, owned
    /// by someone else, or already paid; a paid order is never re-billed.
    /// A provider timeout or failure leaves the order pending and untouched.
    #[instrument(skip(self), fields(order_id = order_id, user_id = user_id))]
    pub async fn create_payment_session(
        &self,
        order_id: u64,
        user_id: u64,
    ) -> StoreResult<GatewaySession> {
        let order = self.store.order_for_user(order_id, user_id)?;
        if order.status == OrderStatus::Paid {
            return Err(StoreError::AlreadyPaid { order_id });
        }

        let session = self
            .gateway
            .create_session(
                &order,
                &self.urls.success_url_with_session(),
                &self.urls.cancel_url(),
            )
            .await?;

        info!(
            session_id = %session.session_id,
            provider = self.gateway.provider_name(),
            total = %order.total,
            "payment session created"
        );
        Ok(session)
    }
}
