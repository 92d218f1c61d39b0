//! # Application State
//!
//! Shared state for the Axum application. The store, lifecycle, and
//! checkout services are composed here, with the payment gateway
//! constructed explicitly and injected rather than configured globally.

use std::sync::Arc;
use store_core::{
    CheckoutService, CheckoutUrls, CommerceStore, CustomerDirectory, OrderLifecycle,
    ProductCatalog, SharedGateway,
};
use store_stripe::StripeGateway;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Base URL for checkout redirect callbacks
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Shared key for the admin surface; admin routes refuse everything
    /// when unset
    pub admin_key: Option<String>,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(8080),
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            admin_key: std::env::var("ADMIN_API_KEY").ok(),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Cart and order store
    pub store: Arc<CommerceStore>,
    /// Order creation and webhook reconciliation
    pub lifecycle: Arc<OrderLifecycle>,
    /// Payment-session orchestration
    pub checkout: Arc<CheckoutService>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create state from the environment: TOML collaborator data plus a
    /// Stripe gateway built from env vars
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();

        let catalog = load_product_catalog()?;
        let customers = load_customer_directory()?;

        let gateway = StripeGateway::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {e}"))?;

        Ok(Self::compose(customers, catalog, Arc::new(gateway), config))
    }

    /// Wire the services together around an explicit gateway.
    ///
    /// Tests compose with a scripted gateway through this.
    pub fn compose(
        customers: CustomerDirectory,
        catalog: ProductCatalog,
        gateway: SharedGateway,
        config: AppConfig,
    ) -> Self {
        let store = Arc::new(CommerceStore::new(customers, Arc::new(catalog)));
        let urls = CheckoutUrls::new(&config.base_url);

        let lifecycle = Arc::new(OrderLifecycle::new(store.clone(), gateway.clone()));
        let checkout = Arc::new(CheckoutService::new(store.clone(), gateway, urls));

        Self { store, lifecycle, checkout, config }
    }
}

/// Load product catalog from config file
fn load_product_catalog() -> anyhow::Result<ProductCatalog> {
    let config_paths =
        ["config/products.toml", "../config/products.toml", "../../config/products.toml"];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let catalog = ProductCatalog::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {path}: {e}"))?;
            tracing::info!("Loaded {} products from {}", catalog.products.len(), path);
            return Ok(catalog);
        }
    }

    tracing::warn!("No product catalog found, using empty catalog");
    Ok(ProductCatalog::new())
}

/// Load the known-customer directory from config file
fn load_customer_directory() -> anyhow::Result<CustomerDirectory> {
    let config_paths =
        ["config/customers.toml", "../config/customers.toml", "../../config/customers.toml"];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let directory = CustomerDirectory::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {path}: {e}"))?;
            tracing::info!("Loaded {} customers from {}", directory.customers.len(), path);
            return Ok(directory);
        }
    }

    tracing::warn!("No customer directory found; every caller will be unknown");
    Ok(CustomerDirectory::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            environment: "test".to_string(),
            admin_key: None,
        };

        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn test_is_production() {
        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            base_url: "http://localhost:8080".to_string(),
            environment: "production".to_string(),
            admin_key: None,
        };
        assert!(config.is_production());
    }
}
