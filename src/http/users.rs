//! User service routes.

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
use crate::orchestrator::users::{CREATE_USER, GET_USER, USER_RECOMMENDATIONS};
use crate::orchestrator::UserService;
use crate::store::NewUser;

type UserState = AppState<UserService>;

#[derive(Debug, Default, Deserialize)]
pub struct RecommendationParams {
    pub limit: Option<usize>,
}

pub fn routes(state: UserState) -> Router {
    Router::new()
        .route("/health", get(health::<UserService>))
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/recommendations", get(user_recommendations))
        .route("/metrics", get(metrics_snapshot::<UserService>))
        .route_layer(from_fn_with_state(state.tally.clone(), track_requests))
        .with_state(state)
}

async fn list_users(State(state): State<UserState>, InboundTrace(ctx): InboundTrace) -> Response {
    respond(&ctx, StatusCode::OK, state.service.list(&ctx))
}

async fn get_user(
    State(state): State<UserState>,
    InboundTrace(ctx): InboundTrace,
    id: Result<Path<u64>, PathRejection>,
) -> Response {
    let result = match id {
        Ok(Path(id)) => state.service.get(&ctx, id),
        Err(rejection) => state.service.reject(
            &ctx,
            GET_USER,
            ServiceError::Validation(vec![path_error(&rejection)]),
        ),
    };
    respond(&ctx, StatusCode::OK, result)
}

async fn create_user(
    State(state): State<UserState>,
    InboundTrace(ctx): InboundTrace,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Response {
    let result = match payload {
        Ok(Json(new)) => state.service.create(&ctx, new),
        Err(rejection) => state.service.reject(
            &ctx,
            CREATE_USER,
            ServiceError::Validation(vec![body_error(&rejection)]),
        ),
    };
    respond(&ctx, StatusCode::CREATED, result)
}

async fn user_recommendations(
    State(state): State<UserState>,
    InboundTrace(ctx): InboundTrace,
    id: Result<Path<u64>, PathRejection>,
    params: Result<Query<RecommendationParams>, QueryRejection>,
) -> Response {
    let result = match (id, params) {
        (Ok(Path(id)), Ok(Query(params))) => {
            state.service.recommendations(&ctx, id, params.limit).await
        }
        (id, params) => {
            let mut errors = Vec::new();
            if let Err(rejection) = &id {
                errors.push(path_error(rejection));
            }
            if let Err(rejection) = &params {
                errors.push(query_error(rejection));
            }
            state
                .service
                .reject(&ctx, USER_RECOMMENDATIONS, ServiceError::Validation(errors))
        }
    };
    respond(&ctx, StatusCode::OK, result)
}
