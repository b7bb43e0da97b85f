//! Catalog service routes.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Response,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::ServiceError;
use crate::http::middleware::track_requests;
use crate::http::request::{body_error, path_error, query_error, InboundTrace};
use crate::http::response::respond;
use crate::http::server::{health, metrics_snapshot, AppState};
use crate::orchestrator::catalog::{
    CREATE_PRODUCT, GET_PRODUCT, LIST_BY_CATEGORY, LIST_PRODUCTS, RECOMMEND_PRODUCTS,
};
use crate::orchestrator::{CatalogService, ListFilter};
use crate::store::NewCatalogEntry;

type CatalogState = AppState<CatalogService>;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecommendParams {
    pub category: Option<String>,
    pub limit: Option<usize>,
}

pub fn routes(state: CatalogState) -> Router {
    Router::new()
        .route("/health", get(health::<CatalogService>))
        .route("/products", get(list_products).post(create_product))
        .route("/products/recommend", get(recommend_products))
        .route("/products/category/{category}", get(products_by_category))
        .route("/products/{id}", get(get_product))
        .route("/categories", get(list_categories))
        .route("/metrics", get(metrics_snapshot::<CatalogService>))
        .route_layer(from_fn_with_state(state.tally.clone(), track_requests))
        .with_state(state)
}

async fn list_products(
    State(state): State<CatalogState>,
    InboundTrace(ctx): InboundTrace,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Response {
    let result = match params {
        Ok(Query(params)) => {
            let filter = ListFilter {
                category: params.category,
                limit: params.limit,
                skip: params.skip,
            };
            state.service.list(&ctx, &filter)
        }
        Err(rejection) => state.service.reject(
            &ctx,
            LIST_PRODUCTS,
            ServiceError::Validation(vec![query_error(&rejection)]),
        ),
    };
    respond(&ctx, StatusCode::OK, result)
}

async fn get_product(
    State(state): State<CatalogState>,
    InboundTrace(ctx): InboundTrace,
    id: Result<Path<u64>, PathRejection>,
) -> Response {
    let result = match id {
        Ok(Path(id)) => state.service.get(&ctx, id),
        Err(rejection) => state.service.reject(
            &ctx,
            GET_PRODUCT,
            ServiceError::Validation(vec![path_error(&rejection)]),
        ),
    };
    respond(&ctx, StatusCode::OK, result)
}

async fn create_product(
    State(state): State<CatalogState>,
    InboundTrace(ctx): InboundTrace,
    payload: Result<Json<NewCatalogEntry>, JsonRejection>,
) -> Response {
    let result = match payload {
        Ok(Json(new)) => state.service.create(&ctx, new),
        Err(rejection) => state.service.reject(
            &ctx,
            CREATE_PRODUCT,
            ServiceError::Validation(vec![body_error(&rejection)]),
        ),
    };
    respond(&ctx, StatusCode::CREATED, result)
}

async fn products_by_category(
    State(state): State<CatalogState>,
    InboundTrace(ctx): InboundTrace,
    Path(category): Path<String>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Response {
    let result = match params {
        Ok(Query(params)) => {
            state
                .service
                .by_category(&ctx, &category, params.limit, params.skip)
        }
        Err(rejection) => state.service.reject(
            &ctx,
            LIST_BY_CATEGORY,
            ServiceError::Validation(vec![query_error(&rejection)]),
        ),
    };
    respond(&ctx, StatusCode::OK, result)
}

async fn recommend_products(
    State(state): State<CatalogState>,
    InboundTrace(ctx): InboundTrace,
    params: Result<Query<RecommendParams>, QueryRejection>,
) -> Response {
    let result = match params {
        Ok(Query(params)) => {
            state
                .service
                .recommend(&ctx, params.category.as_deref(), params.limit)
        }
        Err(rejection) => state.service.reject(
            &ctx,
            RECOMMEND_PRODUCTS,
            ServiceError::Validation(vec![query_error(&rejection)]),
        ),
    };
    respond(&ctx, StatusCode::OK, result)
}

async fn list_categories(
    State(state): State<CatalogState>,
    InboundTrace(ctx): InboundTrace,
) -> Response {
    respond(&ctx, StatusCode::OK, state.service.categories(&ctx))
}
