//! Catalog service operations.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::error::ServiceError;
use crate::orchestrator::{
    self, checked_limit, finish_span, Page, DEFAULT_LIST_LIMIT, DEFAULT_RECOMMEND_LIMIT,
};
use crate::recommend::{self, GENERAL_CATEGORY};
use crate::store::{CatalogEntry, NewCatalogEntry, Repository};
use crate::trace::{TraceContext, Tracer};

pub const LIST_PRODUCTS: &str = "list_products";
pub const GET_PRODUCT: &str = "get_product";
pub const CREATE_PRODUCT: &str = "create_product";
pub const LIST_BY_CATEGORY: &str = "list_products_by_category";
pub const RECOMMEND_PRODUCTS: &str = "recommend_products";
pub const LIST_CATEGORIES: &str = "list_categories";

/// Number of entries in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Filter for the product listing, as received. Limits are checked inside
/// the operation's span.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub category: Option<String>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

#[derive(Clone)]
pub struct CatalogService {
    tracer: Tracer,
    store: Arc<dyn Repository<CatalogEntry>>,
}

impl CatalogService {
    pub fn new(tracer: Tracer, store: Arc<dyn Repository<CatalogEntry>>) -> Self {
        Self { tracer, store }
    }

    /// Fail `operation` with `err` before it runs, recording it on the
    /// operation's span.
    pub fn reject<T>(
        &self,
        ctx: &TraceContext,
        operation: &'static str,
        err: ServiceError,
    ) -> Result<T, ServiceError> {
        orchestrator::reject(&self.tracer, ctx, operation, err)
    }

    pub fn list(&self, ctx: &TraceContext, filter: &ListFilter) -> Result<Vec<CatalogEntry>, ServiceError> {
        let (mut span, _) = self.tracer.start_span(LIST_PRODUCTS, ctx);
        let category = filter
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        if let Some(category) = category {
            span.set_attribute("catalog.category", category);
        }

        let result = Page::new(filter.limit, filter.skip, DEFAULT_LIST_LIMIT).map(|page| {
            let entries = self
                .store
                .list(&|e: &CatalogEntry| category.map_or(true, |c| e.category == c));
            page.apply(entries)
        });
        if let Ok(entries) = &result {
            span.set_attribute("result.count", entries.len());
        }
        finish_span(span, result)
    }

    pub fn get(&self, ctx: &TraceContext, id: u64) -> Result<CatalogEntry, ServiceError> {
        let (mut span, _) = self.tracer.start_span(GET_PRODUCT, ctx);
        span.set_attribute("product.id", id);

        let result = self
            .store
            .get(id)
            .ok_or_else(|| ServiceError::not_found("Product", id));
        if result.is_err() {
            tracing::info!(trace_id = %ctx.trace_id, product_id = id, "Product not found");
        }
        finish_span(span, result)
    }

    pub fn create(&self, ctx: &TraceContext, new: NewCatalogEntry) -> Result<CatalogEntry, ServiceError> {
        let (mut span, _) = self.tracer.start_span(CREATE_PRODUCT, ctx);

        let result = new
            .validate()
            .map_err(ServiceError::Validation)
            .map(|()| self.store.create(new));
        if let Ok(entry) = &result {
            span.set_attribute("product.id", entry.id);
            tracing::info!(
                trace_id = %ctx.trace_id,
                product_id = entry.id,
                category = %entry.category,
                "Product created"
            );
        }
        finish_span(span, result)
    }

    pub fn by_category(
        &self,
        ctx: &TraceContext,
        category: &str,
        limit: Option<usize>,
        skip: Option<usize>,
    ) -> Result<Vec<CatalogEntry>, ServiceError> {
        let (mut span, _) = self.tracer.start_span(LIST_BY_CATEGORY, ctx);
        span.set_attribute("catalog.category", category);

        let result = Page::new(limit, skip, DEFAULT_LIST_LIMIT)
            .map(|page| page.apply(self.store.list(&|e: &CatalogEntry| e.category == category)));
        if let Ok(entries) = &result {
            span.set_attribute("result.count", entries.len());
        }
        finish_span(span, result)
    }

    /// Ranked products for `category` (`"general"` or empty for all).
    pub fn recommend(
        &self,
        ctx: &TraceContext,
        category: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<CatalogEntry>, ServiceError> {
        let (mut span, _) = self.tracer.start_span(RECOMMEND_PRODUCTS, ctx);
        let category = category.unwrap_or(GENERAL_CATEGORY);
        span.set_attribute("recommend.category", category);

        let limit = match checked_limit(limit, DEFAULT_RECOMMEND_LIMIT) {
            Ok(limit) => limit,
            Err(err) => return finish_span(span, Err(err)),
        };
        span.set_attribute("recommend.limit", limit);

        let catalog = self.store.list(&|_: &CatalogEntry| true);
        let ranked = recommend::recommend(&catalog, category, limit);

        span.set_attribute("recommend.count", ranked.len());
        tracing::debug!(
            trace_id = %ctx.trace_id,
            category = %category,
            count = ranked.len(),
            "Recommendations computed"
        );
        finish_span(span, Ok(ranked))
    }

    /// Categories with their entry counts, sorted by name.
    pub fn categories(&self, ctx: &TraceContext) -> Result<Vec<CategoryCount>, ServiceError> {
        let (mut span, _) = self.tracer.start_span(LIST_CATEGORIES, ctx);

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for entry in self.store.list(&|_: &CatalogEntry| true) {
            *counts.entry(entry.category).or_default() += 1;
        }
        let categories: Vec<CategoryCount> = counts
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect();

        span.set_attribute("result.count", categories.len());
        finish_span(span, Ok(categories))
    }
}
