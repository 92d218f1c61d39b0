//! # Stripe Gateway
//!
//! `PaymentGateway` implementation over Stripe's Checkout Sessions API and
//! signed webhook events. Sessions are created from an order's frozen line
//! items with the local order id attached as correlation metadata; webhook
//! payloads are authenticated with HMAC-SHA256 before they are decoded.

use crate::config::StripeConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use store_core::{
    GatewaySession, Order, PaymentEvent, PaymentEventKind, PaymentGateway, StoreError,
    StoreResult, ORDER_ID_METADATA_KEY,
};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// Webhook timestamps older or newer than this are rejected
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Stripe payment gateway
///
/// Uses Stripe's hosted checkout page; card data never touches this system.
pub struct StripeGateway {
    config: StripeConfig,
    client: Client,
}

impl StripeGateway {
    /// Create a new Stripe gateway
    pub fn new(config: StripeConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Create from environment variables
    pub fn from_env() -> StoreResult<Self> {
        let config = StripeConfig::from_env()?;
        Ok(Self::new(config))
    }

    /// Flatten an order's lines into Stripe's form-encoded line_items
    fn push_line_items(order: &Order, form_params: &mut Vec<(String, String)>) {
        for (i, item) in order.items.iter().enumerate() {
            form_params.push((
                format!("line_items[{i}][price_data][currency]"),
                item.unit_price.currency.as_str().to_string(),
            ));
            form_params.push((
                format!("line_items[{i}][price_data][unit_amount]"),
                item.unit_price.minor_units().to_string(),
            ));
            form_params.push((
                format!("line_items[{i}][price_data][product_data][name]"),
                item.product_name.clone(),
            ));
            form_params.push((format!("line_items[{i}][quantity]"), item.quantity.to_string()));
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self, order), fields(order_id = order.id))]
    async fn create_session(
        &self,
        order: &Order,
        success_url: &str,
        cancel_url: &str,
    ) -> StoreResult<GatewaySession> {
        if order.items.is_empty() {
            return Err(StoreError::Validation("order has no line items".to_string()));
        }

        let mut form_params: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), success_url.to_string()),
            ("cancel_url".to_string(), cancel_url.to_string()),
        ];
        Self::push_line_items(order, &mut form_params);

        // The webhook maps the event back to the order through this key.
        form_params
            .push((format!("metadata[{ORDER_ID_METADATA_KEY}]"), order.id.to_string()));

        debug!("Creating Stripe checkout session: {} line items", order.items.len());

        let idempotency_key = Uuid::new_v4().to_string();
        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .header("Idempotency-Key", &idempotency_key)
            .form(&form_params)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| StoreError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);

            if let Ok(error_response) = serde_json::from_str::<StripeErrorResponse>(&body) {
                return Err(StoreError::Gateway {
                    provider: "stripe".to_string(),
                    message: error_response.error.message,
                });
            }
            return Err(StoreError::Gateway {
                provider: "stripe".to_string(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        let session: StripeSessionResponse = serde_json::from_str(&body).map_err(|e| {
            StoreError::Serialization(format!("Failed to parse Stripe response: {e}"))
        })?;

        info!("Created Stripe checkout session: id={}, url={}", session.id, session.url);

        Ok(GatewaySession {
            session_id: session.id,
            order_id: order.id,
            checkout_url: session.url,
            expires_at: session.expires_at.and_then(|ts| DateTime::from_timestamp(ts, 0)),
        })
    }

    #[instrument(skip(self, payload, signature))]
    async fn verify_webhook(&self, payload: &[u8], signature: &str) -> StoreResult<PaymentEvent> {
        let sig_parts = parse_signature_header(signature)?;

        let now = Utc::now().timestamp();
        if (now - sig_parts.timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
            return Err(StoreError::SignatureInvalid("Timestamp outside tolerance".to_string()));
        }

        // The signed payload is "{timestamp}.{raw body}"; any intermediate
        // re-serialization of the body breaks this.
        let signed_payload =
            format!("{}.{}", sig_parts.timestamp, String::from_utf8_lossy(payload));
        let expected_sig = compute_hmac_sha256(&self.config.webhook_secret, &signed_payload);

        let valid = sig_parts.signatures.iter().any(|sig| constant_time_compare(sig, &expected_sig));
        if !valid {
            return Err(StoreError::SignatureInvalid("Signature mismatch".to_string()));
        }

        let event: StripeWebhookEvent = serde_json::from_slice(payload)
            .map_err(|e| StoreError::WebhookParse(format!("Failed to parse webhook: {e}")))?;

        debug!("Verified Stripe webhook: type={}", event.event_type);

        let kind = match event.event_type.as_str() {
            "checkout.session.completed" => PaymentEventKind::CheckoutCompleted,
            "payment_intent.succeeded" => PaymentEventKind::PaymentSucceeded,
            "payment_intent.payment_failed" => PaymentEventKind::PaymentFailed,
            other => PaymentEventKind::Unknown(other.to_string()),
        };

        let object = &event.data.object;
        let session_id = object.get("id").and_then(|v| v.as_str()).map(String::from);
        let amount_total = object.get("amount_total").and_then(|v| v.as_i64());
        let metadata: HashMap<String, String> = object
            .get("metadata")
            .and_then(|m| m.as_object())
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        Ok(PaymentEvent {
            event_id: event.id,
            kind,
            session_id,
            amount_total,
            metadata,
            timestamp: DateTime::from_timestamp(event.created, 0).unwrap_or_else(Utc::now),
        })
    }

    fn provider_name(&self) -> &'static str {
        "stripe"
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeSessionResponse {
    id: String,
    url: String,
    #[serde(default)]
    expires_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct StripeWebhookEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    created: i64,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Map<String, serde_json::Value>,
}

// =============================================================================
// Webhook Signature Verification
// =============================================================================

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> StoreResult<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let kv: Vec<&str> = part.split('=').collect();
        if kv.len() != 2 {
            continue;
        }
        match kv[0] {
            "t" => {
                timestamp = kv[1].parse().ok();
            }
            "v1" => {
                signatures.push(kv[1].to_string());
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        StoreError::SignatureInvalid("Missing timestamp in signature".to_string())
    })?;

    if signatures.is_empty() {
        return Err(StoreError::SignatureInvalid("No v1 signature found".to_string()));
    }

    Ok(SignatureHeader { timestamp, signatures })
}

fn compute_hmac_sha256(secret: &str, message: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    let result = mac.finalize();
    hex::encode(result.into_bytes())
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use store_core::{Currency, Money, Order, OrderItem, OrderStatus};
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_order() -> Order {
        Order {
            id: 7,
            user_id: 1,
            items: vec![OrderItem {
                product_id: "desk-lamp".into(),
                product_name: "Desk Lamp".into(),
                unit_price: Money::from_minor(2499, Currency::USD),
                quantity: 2,
            }],
            total: Money::from_minor(4998, Currency::USD),
            status: OrderStatus::Pending,
            shipping_address: "1 Main St".into(),
            created_at: Utc::now(),
        }
    }

    fn signed_payload(secret: &str, payload: &str) -> String {
        let ts = Utc::now().timestamp();
        let sig = compute_hmac_sha256(secret, &format!("{ts}.{payload}"));
        format!("t={ts},v1={sig}")
    }

    fn completed_session_payload() -> String {
        json!({
            "id": "evt_test_1",
            "type": "checkout.session.completed",
            "created": Utc::now().timestamp(),
            "data": {
                "object": {
                    "id": "cs_test_1",
                    "amount_total": 4998,
                    "metadata": { "orderId": "7" }
                }
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_create_session_posts_line_items_and_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .and(header("Authorization", "Bearer sk_test_abc"))
            // Form-encoded: metadata[orderId]=7
            .and(body_string_contains("metadata%5BorderId%5D=7"))
            .and(body_string_contains("unit_amount%5D=2499"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cs_test_1",
                "url": "https://checkout.stripe.com/c/pay/cs_test_1",
                "expires_at": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = StripeGateway::new(
            StripeConfig::new("sk_test_abc", "whsec_test").with_api_base_url(server.uri()),
        );
        let session = gateway
            .create_session(&test_order(), "https://shop/success", "https://shop/cancel")
            .await
            .unwrap();

        assert_eq!(session.session_id, "cs_test_1");
        assert_eq!(session.order_id, 7);
        assert_eq!(session.checkout_url, "https://checkout.stripe.com/c/pay/cs_test_1");
    }

    #[tokio::test]
    async fn test_create_session_maps_provider_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "Invalid currency" }
            })))
            .mount(&server)
            .await;

        let gateway = StripeGateway::new(
            StripeConfig::new("sk_test_abc", "whsec_test").with_api_base_url(server.uri()),
        );
        let err = gateway
            .create_session(&test_order(), "https://shop/success", "https://shop/cancel")
            .await
            .unwrap_err();

        match err {
            StoreError::Gateway { provider, message } => {
                assert_eq!(provider, "stripe");
                assert_eq!(message, "Invalid currency");
            }
            other => panic!("expected gateway error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_session_rejects_empty_order() {
        let gateway = StripeGateway::new(StripeConfig::new("sk_test_abc", "whsec_test"));
        let mut order = test_order();
        order.items.clear();

        let err = gateway
            .create_session(&order, "https://shop/success", "https://shop/cancel")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_verify_webhook_round_trip() {
        let gateway = StripeGateway::new(StripeConfig::new("sk_test_abc", "whsec_testsecret"));
        let payload = completed_session_payload();
        let header = signed_payload("whsec_testsecret", &payload);

        let event = gateway.verify_webhook(payload.as_bytes(), &header).await.unwrap();

        assert_eq!(event.kind, PaymentEventKind::CheckoutCompleted);
        assert_eq!(event.event_id, "evt_test_1");
        assert_eq!(event.session_id.as_deref(), Some("cs_test_1"));
        assert_eq!(event.amount_total, Some(4998));
        assert_eq!(event.order_id(), Some(7));
    }

    #[tokio::test]
    async fn test_verify_webhook_rejects_wrong_secret() {
        let gateway = StripeGateway::new(StripeConfig::new("sk_test_abc", "whsec_real"));
        let payload = completed_session_payload();
        let header = signed_payload("whsec_someone_else", &payload);

        let err = gateway.verify_webhook(payload.as_bytes(), &header).await.unwrap_err();
        assert!(matches!(err, StoreError::SignatureInvalid(_)));
    }

    #[tokio::test]
    async fn test_verify_webhook_rejects_tampered_body() {
        let gateway = StripeGateway::new(StripeConfig::new("sk_test_abc", "whsec_testsecret"));
        let payload = completed_session_payload();
        let header = signed_payload("whsec_testsecret", &payload);

        let tampered = payload.replace("\"orderId\":\"7\"", "\"orderId\":\"8\"");
        let err = gateway.verify_webhook(tampered.as_bytes(), &header).await.unwrap_err();
        assert!(matches!(err, StoreError::SignatureInvalid(_)));
    }

    #[tokio::test]
    async fn test_verify_webhook_rejects_stale_timestamp() {
        let gateway = StripeGateway::new(StripeConfig::new("sk_test_abc", "whsec_testsecret"));
        let payload = completed_session_payload();

        let stale_ts = Utc::now().timestamp() - SIGNATURE_TOLERANCE_SECS - 60;
        let sig = compute_hmac_sha256("whsec_testsecret", &format!("{stale_ts}.{payload}"));
        let header = format!("t={stale_ts},v1={sig}");

        let err = gateway.verify_webhook(payload.as_bytes(), &header).await.unwrap_err();
        assert!(matches!(err, StoreError::SignatureInvalid(_)));
    }

    #[tokio::test]
    async fn test_unknown_event_types_pass_through() {
        let gateway = StripeGateway::new(StripeConfig::new("sk_test_abc", "whsec_testsecret"));
        let payload = json!({
            "id": "evt_test_2",
            "type": "charge.refunded",
            "created": Utc::now().timestamp(),
            "data": { "object": { "id": "ch_1" } }
        })
        .to_string();
        let header = signed_payload("whsec_testsecret", &payload);

        let event = gateway.verify_webhook(payload.as_bytes(), &header).await.unwrap();
        assert_eq!(event.kind, PaymentEventKind::Unknown("charge.refunded".into()));
        assert!(event.metadata.is_empty());
    }

    #[test]
    fn test_parse_signature_header() {
        let header = "t=1234567890,v1=abc123,v1=def456";
        let parsed = parse_signature_header(header).unwrap();

        assert_eq!(parsed.timestamp, 1234567890);
        assert_eq!(parsed.signatures.len(), 2);
        assert_eq!(parsed.signatures[0], "abc123");

        assert!(parse_signature_header("v1=abc").is_err());
        assert!(parse_signature_header("t=123").is_err());
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc123", "abc123"));
        assert!(!constant_time_compare("abc123", "abc124"));
        assert!(!constant_time_compare("abc", "abcd"));
    }
}
