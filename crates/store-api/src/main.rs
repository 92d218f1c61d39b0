//! # storefront-rs
//!
//! Online-store order lifecycle and payment service.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export STRIPE_SECRET_KEY=sk_test_...
//! export STRIPE_WEBHOOK_SECRET=whsec_...
//!
//! # Run the server
//! storefront
//! ```

use store_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Products loaded: {}", state.store.catalog().products.len());
    info!("Customers known: {}", state.store.customers().customers.len());

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("Storefront starting on http://{}", addr);

    if !is_prod {
        info!("Cart:     POST http://{}/cart/add", addr);
        info!("Orders:   POST http://{}/orders", addr);
        info!("Checkout: POST http://{}/checkout/session", addr);
        info!("Webhook:  POST http://{}/checkout/webhook", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
