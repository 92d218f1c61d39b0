//! # Customer Directory
//!
//! Registration and authentication live outside this system; the directory
//! is the id space the cart and order layers resolve callers against.
//! Loaded from `config/customers.toml` at startup.

use serde::{Deserialize, Serialize};

/// A known customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Customer id, as issued by the (external) account system
    pub id: u64,

    /// Contact email
    pub email: String,
}

/// Directory of known customers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerDirectory {
    #[serde(default)]
    pub customers: Vec<Customer>,
}

impl CustomerDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self { customers: Vec::new() }
    }

    /// Add a customer
    pub fn add(&mut self, customer: Customer) {
        self.customers.push(customer);
    }

    /// Builder: add a customer
    pub fn with_customer(mut self, id: u64, email: impl Into<String>) -> Self {
        self.add(Customer { id, email: email.into() });
        self
    }

    /// Look up a customer by id
    pub fn get(&self, id: u64) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }

    /// Whether the id resolves to a known customer
    pub fn contains(&self, id: u64) -> bool {
        self.get(id).is_some()
    }

    /// Load directory from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_lookup() {
        let directory = CustomerDirectory::new()
            .with_customer(1, "ada@example.com")
            .with_customer(2, "mo@example.com");

        assert!(directory.contains(1));
        assert_eq!(directory.get(2).unwrap().email, "mo@example.com");
        assert!(!directory.contains(99));
    }

    #[test]
    fn test_directory_from_toml() {
        let toml_str = r#"
            [[customers]]
            id = 1
            email = "ada@example.com"
        "#;
        let directory = CustomerDirectory::from_toml(toml_str).unwrap();
        assert!(directory.contains(1));
    }
}
