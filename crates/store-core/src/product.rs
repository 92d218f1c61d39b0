//! # Product Catalog
//!
//! Catalog types for storefront-rs. Products are collaborator data, loaded
//! once from `config/products.toml` and immutable at runtime; catalog CRUD
//! lives outside this system.

use crate::money::Money;
use serde::{Deserialize, Serialize};

/// A product in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier (e.g., "walnut-desk-organizer")
    pub id: String,

    /// Display name
    pub name: String,

    /// Short description
    #[serde(default)]
    pub description: String,

    /// Unit price
    pub price: Money,

    /// Whether this product is active and available for purchase
    #[serde(default = "default_true")]
    pub active: bool,

    /// Optional image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Product {
    /// Create a new active product
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Money) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price,
            active: true,
            image_url: None,
        }
    }

    /// Builder: set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Builder: set image URL
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Builder: mark inactive
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Product catalog (loaded from config)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductCatalog {
    pub products: Vec<Product>,
}

impl ProductCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self { products: Vec::new() }
    }

    /// Add a product to the catalog
    pub fn add(&mut self, product: Product) {
        self.products.push(product);
    }

    /// Builder: add a product
    pub fn with_product(mut self, product: Product) -> Self {
        self.add(product);
        self
    }

    /// Find a product by ID, active or not
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Find an active product by ID
    pub fn get_active(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id && p.active)
    }

    /// Get all active products
    pub fn active_products(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.active)
    }

    /// Load catalog from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    #[test]
    fn test_catalog_lookup() {
        let catalog = ProductCatalog::new()
            .with_product(Product::new(
                "desk-lamp",
                "Desk Lamp",
                Money::from_minor(2499, Currency::USD),
            ))
            .with_product(
                Product::new(
                    "retired-mug",
                    "Retired Mug",
                    Money::from_minor(999, Currency::USD),
                )
                .inactive(),
            );

        assert!(catalog.get("desk-lamp").is_some());
        assert!(catalog.get_active("desk-lamp").is_some());
        assert!(catalog.get("retired-mug").is_some());
        assert!(catalog.get_active("retired-mug").is_none());
        assert!(catalog.get("nonexistent").is_none());
        assert_eq!(catalog.active_products().count(), 1);
    }

    #[test]
    fn test_catalog_from_toml() {
        let toml_str = r#"
            [[products]]
            id = "desk-lamp"
            name = "Desk Lamp"
            description = "Brushed steel"
            price = { amount = 2499, currency = "usd" }

            [[products]]
            id = "retired-mug"
            name = "Retired Mug"
            price = { amount = 999, currency = "usd" }
            active = false
        "#;

        let catalog = ProductCatalog::from_toml(toml_str).unwrap();
        assert_eq!(catalog.products.len(), 2);
        assert_eq!(
            catalog.get("desk-lamp").unwrap().price,
            Money::from_minor(2499, Currency::USD)
        );
        assert!(!catalog.get("retired-mug").unwrap().active);
    }
}
