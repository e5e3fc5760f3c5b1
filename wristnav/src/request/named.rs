//! Named address substitution ("Home", "Work", ...).

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A user-defined alias for an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedAddress {
    /// Alias typed on the watch.
    pub name: String,
    /// Address sent to the routing backend instead.
    pub address: String,
}

impl NamedAddress {
    /// Create a named address.
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// Source of named addresses, enumerated in a stable order.
pub trait NamedAddressProvider: Send + Sync {
    /// All named addresses, in lookup order.
    fn named_addresses(&self) -> Vec<NamedAddress>;
}

impl NamedAddressProvider for Vec<NamedAddress> {
    fn named_addresses(&self) -> Vec<NamedAddress> {
        self.clone()
    }
}

/// Replace `search` with a stored address when it matches a name.
///
/// Names compare case-insensitively; the first match in enumeration order
/// wins. Unmatched text is returned unchanged.
pub fn normalize_address(search: &str, provider: &dyn NamedAddressProvider) -> String {
    let wanted = search.to_lowercase();
    match provider
        .named_addresses()
        .into_iter()
        .find(|entry| entry.name.to_lowercase() == wanted)
    {
        Some(entry) => {
            debug!(name = %entry.name, address = %entry.address, "Search text was a named address");
            entry.address
        }
        None => search.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> Vec<NamedAddress> {
        vec![
            NamedAddress::new("Home", "1 Main St"),
            NamedAddress::new("Work", "Hafenstraße 12"),
            NamedAddress::new("home", "2 Side St"),
        ]
    }

    #[test]
    fn test_match_is_case_insensitive() {
        assert_eq!(normalize_address("home", &book()), "1 Main St");
        assert_eq!(normalize_address("WORK", &book()), "Hafenstraße 12");
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(normalize_address("HOME", &book()), "1 Main St");
    }

    #[test]
    fn test_unmatched_text_unchanged() {
        assert_eq!(normalize_address("Brockhofweg 9", &book()), "Brockhofweg 9");
        assert_eq!(normalize_address("Home ", &book()), "Home ");
    }

    #[test]
    fn test_empty_provider() {
        let empty: Vec<NamedAddress> = Vec::new();
        assert_eq!(normalize_address("home", &empty), "home");
    }
}
