//! Record types owned by the catalog and user stores.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: u64,
    pub name: String,
    pub category: String,
    pub price: f64,
    /// Average rating, 0.0 to 5.0.
    pub rating: f64,
    pub inventory: u32,
}

/// Create payload for a catalog entry. The id is assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCatalogEntry {
    pub name: String,
    pub category: String,
    pub price: f64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub inventory: u32,
}

impl NewCatalogEntry {
    /// Field-level checks. Returns every problem found.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "must not be empty"));
        }
        if self.category.trim().is_empty() {
            errors.push(FieldError::new("category", "must not be empty"));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            errors.push(FieldError::new("price", "must be a non-negative number"));
        }
        if !(0.0..=5.0).contains(&self.rating) {
            errors.push(FieldError::new("rating", "must be between 0.0 and 5.0"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn into_entry(self, id: u64) -> CatalogEntry {
        CatalogEntry {
            id,
            name: self.name.trim().to_string(),
            category: self.category.trim().to_string(),
            price: self.price,
            rating: self.rating,
            inventory: self.inventory,
        }
    }
}

/// User preferences: a typed category plus forward-compatible extras.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub preferences: Preferences,
}

/// Create payload for a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub preferences: Preferences,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "must not be empty"));
        }
        let email = self.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
            _ => errors.push(FieldError::new("email", "must be a valid email address")),
        }
        if let Some(category) = &self.preferences.category {
            if category.trim().is_empty() {
                errors.push(FieldError::new("preferences.category", "must not be empty when set"));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn into_record(self, id: u64) -> UserRecord {
        UserRecord {
            id,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            preferences: self.preferences,
        }
    }
}
