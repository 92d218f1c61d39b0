//! # store-api
//!
//! HTTP API layer for storefront-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - REST endpoints for cart, orders, and checkout
//! - Signature-verified webhook handler for payment events
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/products` | List products |
//! | GET | `/cart` | Cart snapshot |
//! | POST | `/cart/add` | Add/merge cart line |
//! | PUT | `/cart/update/{item_id}` | Set/remove quantity |
//! | POST | `/orders` | Create order from cart |
//! | POST | `/checkout/session` | Create payment session |
//! | POST | `/checkout/webhook` | Provider webhook |

pub mod auth;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
