//! Seed data loaded when a service starts.

use crate::store::types::{CatalogEntry, Preferences, UserRecord};
use crate::store::{CatalogStore, UserStore};

fn entry(id: u64, name: &str, category: &str, price: f64, rating: f64, inventory: u32) -> CatalogEntry {
    CatalogEntry {
        id,
        name: name.to_string(),
        category: category.to_string(),
        price,
        rating,
        inventory,
    }
}

pub fn catalog_entries() -> Vec<CatalogEntry> {
    vec![
        entry(1, "Laptop Pro", "electronics", 1299.99, 4.5, 25),
        entry(2, "Wireless Headphones", "electronics", 199.99, 4.3, 120),
        entry(3, "4K Monitor", "electronics", 449.00, 4.4, 40),
        entry(4, "Smartphone X", "electronics", 999.00, 4.7, 60),
        entry(5, "Bluetooth Speaker", "electronics", 79.99, 4.2, 200),
        entry(6, "Programming Book", "books", 49.99, 4.8, 75),
        entry(7, "Distributed Systems Handbook", "books", 64.50, 4.6, 30),
        entry(8, "Espresso Machine", "home", 349.00, 4.1, 15),
        entry(9, "Standing Desk", "home", 529.00, 4.4, 10),
    ]
}

pub fn users() -> Vec<UserRecord> {
    vec![
        UserRecord {
            id: 1,
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            preferences: Preferences {
                category: Some("electronics".to_string()),
                ..Preferences::default()
            },
        },
        UserRecord {
            id: 2,
            name: "Jane Smith".to_string(),
            email: "jane@example.com".to_string(),
            preferences: Preferences {
                category: Some("books".to_string()),
                ..Preferences::default()
            },
        },
        UserRecord {
            id: 3,
            name: "Alex Kim".to_string(),
            email: "alex@example.com".to_string(),
            preferences: Preferences::default(),
        },
    ]
}

pub fn catalog_store() -> CatalogStore {
    CatalogStore::with_records(catalog_entries())
}

pub fn user_store() -> UserStore {
    UserStore::with_records(users())
}
