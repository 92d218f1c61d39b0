//! # Routes
//!
//! Axum router configuration for the storefront API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Catalog (read-only collaborator data):
///   - GET  /products - List active products
///   - GET  /products/{id} - Get product by ID
///
/// - Cart (authenticated by X-User-Id):
///   - GET    /cart - Cart snapshot, priced live
///   - POST   /cart/add - Add or merge a line
///   - PUT    /cart/update/{item_id}?quantity=N - Set or remove (N <= 0)
///   - DELETE /cart/remove/{item_id} - Remove a line
///
/// - Orders:
///   - POST /orders - Create order from cart
///   - GET  /orders - Order history, newest first
///   - GET  /orders/{id} - Single order
///
/// - Checkout:
///   - POST /checkout/session - Create payment session
///   - POST /checkout/webhook - Provider webhook (signature-verified)
///
/// - Admin (X-Admin-Key):
///   - GET /admin/orders - All orders
///   - PUT /admin/orders/{id}/status - Validated status transition
pub fn create_router(state: AppState) -> Router {
    // CORS stays permissive; the storefront frontend lives on another origin.
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/products", get(handlers::list_products))
        .route("/products/{product_id}", get(handlers::get_product))
        .route("/cart", get(handlers::get_cart))
        .route("/cart/add", post(handlers::add_to_cart))
        .route("/cart/update/{item_id}", put(handlers::update_cart_item))
        .route("/cart/remove/{item_id}", delete(handlers::remove_cart_item))
        .route("/orders", post(handlers::create_order).get(handlers::list_orders))
        .route("/orders/{order_id}", get(handlers::get_order))
        .route("/checkout/session", post(handlers::create_checkout_session))
        // The webhook handler must see the raw body; nothing here
        // re-serializes it.
        .route("/checkout/webhook", post(handlers::payment_webhook))
        .route("/admin/orders", get(handlers::admin_list_orders))
        .route("/admin/orders/{order_id}/status", put(handlers::admin_update_order_status))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
