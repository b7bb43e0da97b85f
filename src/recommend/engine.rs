//! Ranking and scoring.

use serde::{Deserialize, Serialize};

use crate::store::{CatalogEntry, UserRecord};

/// Category value meaning "no filter".
pub const GENERAL_CATEGORY: &str = "general";

/// Upper bound of [`score`].
pub const MAX_SCORE: f64 = 0.95;

// Scores are computed in hundredths to keep the bounds exact.
const BASE_SCORE_CENTS: usize = 70;
const PER_ITEM_CENTS: usize = 5;
const MAX_SCORE_CENTS: usize = 95;

/// Result of a personalized recommendation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub user: UserRecord,
    pub products: Vec<CatalogEntry>,
    pub score: f64,
}

impl Recommendation {
    pub fn new(user: UserRecord, products: Vec<CatalogEntry>) -> Self {
        let score = score(products.len());
        Self {
            user,
            products,
            score,
        }
    }
}

/// Filter by `category`, rank by rating (descending, stable) and keep `limit`.
pub fn recommend(catalog: &[CatalogEntry], category: &str, limit: usize) -> Vec<CatalogEntry> {
    let category = category.trim();
    let unfiltered = category.is_empty() || category == GENERAL_CATEGORY;

    let mut ranked: Vec<CatalogEntry> = catalog
        .iter()
        .filter(|entry| unfiltered || entry.category == category)
        .cloned()
        .collect();

    // `sort_by` is stable: equal ratings keep their input order.
    ranked.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    ranked.truncate(limit);
    ranked
}

/// `min(0.95, 0.7 + count * 0.05)`.
pub fn score(count: usize) -> f64 {
    let cents = count
        .saturating_mul(PER_ITEM_CENTS)
        .saturating_add(BASE_SCORE_CENTS)
        .min(MAX_SCORE_CENTS);
    cents as f64 / 100.0
}
