//! # Request Handlers
//!
//! Axum request handlers for the storefront API: cart mutation, order
//! creation and history, checkout-session creation, the raw-body webhook,
//! catalog reads, and the admin order surface.

use crate::auth::{Caller, ADMIN_KEY_HEADER};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use store_core::{
    Cart, Currency, Money, Order, OrderStatus, ProductCatalog, StoreError, StoreResult,
};
use tracing::{error, info, instrument};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Add-to-cart request
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    /// Product to add
    pub product_id: String,
    /// Quantity to add (merged into an existing line for the same product)
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// Quantity query parameter for cart updates
#[derive(Debug, Deserialize)]
pub struct QuantityParam {
    /// New quantity; zero or negative removes the line
    pub quantity: i64,
}

/// Order-creation request
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Shipping address captured into the order snapshot
    pub shipping_address: String,
}

/// Checkout-session request
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Order to pay for
    pub order_id: u64,
}

/// Checkout-session response
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    /// Provider session id
    pub session_id: String,
    /// Checkout URL (redirect the customer here)
    pub checkout_url: String,
}

/// Admin status-change request
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// Target status; the transition is validated against the state machine
    pub status: OrderStatus,
}

/// A cart line priced live from the catalog
#[derive(Debug, Serialize)]
pub struct CartItemView {
    pub id: u64,
    pub product_id: String,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub subtotal: Money,
}

/// Cart snapshot with live-priced subtotals.
///
/// Prices here can drift until checkout; only order creation freezes them.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub id: u64,
    pub items: Vec<CartItemView>,
    pub total: Money,
    pub item_count: u32,
}

/// A frozen order line with its computed subtotal
#[derive(Debug, Serialize)]
pub struct OrderItemView {
    pub product_id: String,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub subtotal: Money,
}

/// Order response
#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: u64,
    pub user_id: u64,
    pub items: Vec<OrderItemView>,
    pub total: Money,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub created_at: DateTime<Utc>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self { error: error.into(), code }
    }
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn store_error_to_response(err: StoreError) -> HandlerError {
    let code = err.status_code();
    let response = ErrorResponse::new(err.to_string(), code);
    (StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR), Json(response))
}

fn cart_view(cart: &Cart, catalog: &ProductCatalog) -> StoreResult<CartView> {
    let mut items = Vec::with_capacity(cart.items.len());
    let mut total = Money::zero(Currency::default());
    for line in &cart.items {
        let product = catalog
            .get(&line.product_id)
            .ok_or_else(|| StoreError::ProductNotFound { product_id: line.product_id.clone() })?;
        let subtotal = product.price.checked_mul(line.quantity)?;
        total = if items.is_empty() { subtotal } else { total.checked_add(subtotal)? };
        items.push(CartItemView {
            id: line.id,
            product_id: line.product_id.clone(),
            product_name: product.name.clone(),
            unit_price: product.price,
            quantity: line.quantity,
            subtotal,
        });
    }
    Ok(CartView { id: cart.id, items, total, item_count: cart.item_count() })
}

fn order_view(order: &Order) -> StoreResult<OrderView> {
    let mut items = Vec::with_capacity(order.items.len());
    for item in &order.items {
        items.push(OrderItemView {
            product_id: item.product_id.clone(),
            product_name: item.product_name.clone(),
            unit_price: item.unit_price,
            quantity: item.quantity,
            subtotal: item.subtotal()?,
        });
    }
    Ok(OrderView {
        id: order.id,
        user_id: order.user_id,
        items,
        total: order.total,
        status: order.status,
        shipping_address: order.shipping_address.clone(),
        created_at: order.created_at,
    })
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), HandlerError> {
    let presented = headers.get(ADMIN_KEY_HEADER).and_then(|v| v.to_str().ok());
    match (state.config.admin_key.as_deref(), presented) {
        (Some(expected), Some(key)) if key == expected => Ok(()),
        // Same response as a missing route; the admin surface is not
        // discoverable without the key.
        _ => Err((StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found", 404)))),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "storefront",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// List active products
pub async fn list_products(State(state): State<AppState>) -> impl IntoResponse {
    let products: Vec<_> = state.store.catalog().active_products().collect();
    Json(serde_json::json!({
        "products": products,
        "count": products.len()
    }))
}

/// Get single product
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let product = state
        .store
        .catalog()
        .get_active(&product_id)
        .ok_or_else(|| {
            store_error_to_response(StoreError::ProductNotFound { product_id: product_id.clone() })
        })?;
    Ok(Json(product.clone()))
}

/// Get the caller's cart, priced live
#[instrument(skip(state), fields(user_id = caller.0))]
pub async fn get_cart(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<CartView>, HandlerError> {
    let cart = state.store.cart_for_user(caller.0).map_err(store_error_to_response)?;
    let view = cart_view(&cart, state.store.catalog()).map_err(store_error_to_response)?;
    Ok(Json(view))
}

/// Add a product to the caller's cart, merging into an existing line
#[instrument(skip(state, request), fields(user_id = caller.0, product_id = %request.product_id))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>, HandlerError> {
    let cart = state
        .store
        .add_cart_item(caller.0, &request.product_id, request.quantity)
        .map_err(store_error_to_response)?;
    let view = cart_view(&cart, state.store.catalog()).map_err(store_error_to_response)?;
    Ok(Json(view))
}

/// Set a line's quantity; zero or negative removes it
#[instrument(skip(state), fields(user_id = caller.0, item_id = item_id))]
pub async fn update_cart_item(
    State(state): State<AppState>,
    caller: Caller,
    Path(item_id): Path<u64>,
    Query(params): Query<QuantityParam>,
) -> Result<Json<CartView>, HandlerError> {
    let cart = state
        .store
        .update_cart_item(caller.0, item_id, params.quantity)
        .map_err(store_error_to_response)?;
    let view = cart_view(&cart, state.store.catalog()).map_err(store_error_to_response)?;
    Ok(Json(view))
}

/// Remove a line from the caller's cart
#[instrument(skip(state), fields(user_id = caller.0, item_id = item_id))]
pub async fn remove_cart_item(
    State(state): State<AppState>,
    caller: Caller,
    Path(item_id): Path<u64>,
) -> Result<Json<CartView>, HandlerError> {
    let cart =
        state.store.remove_cart_item(caller.0, item_id).map_err(store_error_to_response)?;
    let view = cart_view(&cart, state.store.catalog()).map_err(store_error_to_response)?;
    Ok(Json(view))
}

/// Create an order from the caller's cart
#[instrument(skip(state, request), fields(user_id = caller.0))]
pub async fn create_order(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderView>), HandlerError> {
    let order = state
        .lifecycle
        .create_order(caller.0, &request.shipping_address)
        .map_err(store_error_to_response)?;
    let view = order_view(&order).map_err(store_error_to_response)?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// The caller's order history, newest first
#[instrument(skip(state), fields(user_id = caller.0))]
pub async fn list_orders(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<OrderView>>, HandlerError> {
    let orders = state.store.orders_for_user(caller.0).map_err(store_error_to_response)?;
    let views: Vec<OrderView> = orders
        .iter()
        .map(order_view)
        .collect::<StoreResult<_>>()
        .map_err(store_error_to_response)?;
    Ok(Json(views))
}

/// A single order, ownership-checked
#[instrument(skip(state), fields(user_id = caller.0, order_id = order_id))]
pub async fn get_order(
    State(state): State<AppState>,
    caller: Caller,
    Path(order_id): Path<u64>,
) -> Result<Json<OrderView>, HandlerError> {
    let order =
        state.store.order_for_user(order_id, caller.0).map_err(store_error_to_response)?;
    let view = order_view(&order).map_err(store_error_to_response)?;
    Ok(Json(view))
}

/// Create a payment session for one of the caller's orders
#[instrument(skip(state, request), fields(user_id = caller.0, order_id = request.order_id))]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, HandlerError> {
    let session = state
        .checkout
        .create_payment_session(request.order_id, caller.0)
        .await
        .map_err(|e| {
            error!("Failed to create checkout session: {e}");
            store_error_to_response(e)
        })?;

    Ok(Json(CreateSessionResponse {
        session_id: session.session_id,
        checkout_url: session.checkout_url,
    }))
}

/// Handle a provider webhook.
///
/// The raw body and the signature header reach verification unaltered.
/// Verified-and-acknowledged events always return 200, even duplicates and
/// events this system will never act on; a retryable store failure returns
/// 503 so the provider redelivers.
#[instrument(skip_all)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HandlerError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Missing Stripe-Signature header", 400)),
            )
        })?;

    let outcome = state
        .lifecycle
        .apply_payment_event(&body, signature)
        .await
        .map_err(|e| {
            error!("Webhook processing failed: {e}");
            store_error_to_response(e)
        })?;

    info!(?outcome, "webhook acknowledged");
    Ok(Json(serde_json::json!({ "received": true })))
}

/// Admin: every order in the store
pub async fn admin_list_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<OrderView>>, HandlerError> {
    require_admin(&state, &headers)?;
    let orders = state.store.all_orders().map_err(store_error_to_response)?;
    let views: Vec<OrderView> = orders
        .iter()
        .map(order_view)
        .collect::<StoreResult<_>>()
        .map_err(store_error_to_response)?;
    Ok(Json(views))
}

/// Admin: move an order through the fulfilment machine.
///
/// The transition is validated; there is no way to write an arbitrary
/// status.
#[instrument(skip(state, headers, request), fields(order_id = order_id))]
pub async fn admin_update_order_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(order_id): Path<u64>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<OrderView>, HandlerError> {
    require_admin(&state, &headers)?;
    let order = state
        .store
        .update_order_status(order_id, request.status)
        .map_err(store_error_to_response)?;
    let view = order_view(&order).map_err(store_error_to_response)?;
    Ok(Json(view))
}
