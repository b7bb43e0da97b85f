//! User service operations, including the cross-service recommendation.

use std::sync::Arc;
use std::time::Duration;

use crate::downstream::CatalogClient;
use crate::error::ServiceError;
use crate::orchestrator::{self, checked_limit, finish_span, DEFAULT_RECOMMEND_LIMIT};
use crate::recommend::{self, Recommendation, GENERAL_CATEGORY};
use crate::store::{CatalogEntry, NewUser, Repository, UserRecord};
use crate::trace::{Span, TraceContext, Tracer};

pub const LIST_USERS: &str = "list_users";
pub const GET_USER: &str = "get_user";
pub const CREATE_USER: &str = "create_user";
pub const USER_RECOMMENDATIONS: &str = "get_user_recommendations";

#[derive(Clone)]
pub struct UserService {
    tracer: Tracer,
    store: Arc<dyn Repository<UserRecord>>,
    catalog: CatalogClient,
    deadline: Duration,
}

impl UserService {
    /// `deadline` bounds the downstream step of a recommendation request.
    pub fn new(
        tracer: Tracer,
        store: Arc<dyn Repository<UserRecord>>,
        catalog: CatalogClient,
        deadline: Duration,
    ) -> Self {
        Self {
            tracer,
            store,
            catalog,
            deadline,
        }
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

    pub fn list(&self, ctx: &TraceContext) -> Result<Vec<UserRecord>, ServiceError> {
        let (mut span, _) = self.tracer.start_span(LIST_USERS, ctx);
        let users = self.store.list(&|_: &UserRecord| true);
        span.set_attribute("result.count", users.len());
        finish_span(span, Ok(users))
    }

    pub fn get(&self, ctx: &TraceContext, id: u64) -> Result<UserRecord, ServiceError> {
        let (mut span, _) = self.tracer.start_span(GET_USER, ctx);
        span.set_attribute("user.id", id);
        let result = self.lookup(id);
        finish_span(span, result)
    }

    pub fn create(&self, ctx: &TraceContext, new: NewUser) -> Result<UserRecord, ServiceError> {
        let (mut span, _) = self.tracer.start_span(CREATE_USER, ctx);
        let result = new
            .validate()
            .map_err(ServiceError::Validation)
            .map(|()| self.store.create(new));
        if let Ok(user) = &result {
            span.set_attribute("user.id", user.id);
            tracing::info!(trace_id = %ctx.trace_id, user_id = user.id, "User created");
        }
        finish_span(span, result)
    }

    /// Resolve the user, ask the catalog for products in the preferred
    /// category and compose the scored recommendation.
    pub async fn recommendations(
        &self,
        ctx: &TraceContext,
        user_id: u64,
        limit: Option<usize>,
    ) -> Result<Recommendation, ServiceError> {
        let (mut span, span_ctx) = self.tracer.start_span(USER_RECOMMENDATIONS, ctx);
        span.set_attribute("user.id", user_id);

        let result = match checked_limit(limit, DEFAULT_RECOMMEND_LIMIT) {
            Ok(limit) => {
                span.set_attribute("recommend.limit", limit);
                self.compose(&mut span, &span_ctx, user_id, limit).await
            }
            Err(err) => Err(err),
        };
        match &result {
            Ok(rec) => tracing::info!(
                trace_id = %ctx.trace_id,
                user_id,
                count = rec.products.len(),
                score = rec.score,
                "Recommendation composed"
            ),
            Err(err) => tracing::warn!(
                trace_id = %ctx.trace_id,
                user_id,
                error = %err,
                "Recommendation failed"
            ),
        }
        finish_span(span, result)
    }

    async fn compose(
        &self,
        span: &mut Span,
        span_ctx: &TraceContext,
        user_id: u64,
        limit: usize,
    ) -> Result<Recommendation, ServiceError> {
        // LocalLookup: fail before any network work.
        let user = self.lookup(user_id)?;
        let category = user
            .preferences
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(GENERAL_CATEGORY)
            .to_string();
        span.set_attribute("recommend.category", category.as_str());

        // DownstreamCall, aborted when our own deadline passes.
        let call = self.catalog.recommend(&category, limit, span_ctx);
        let body = match tokio::time::timeout(self.deadline, call).await {
            Ok(result) => result?,
            Err(_) => {
                span.add_event(
                    "deadline_exceeded",
                    [("deadline_ms", self.deadline.as_millis() as u64)],
                );
                return Err(ServiceError::DownstreamUnavailable);
            }
        };

        let products: Vec<CatalogEntry> = body.json().map_err(|e| {
            ServiceError::Internal(format!("undecodable catalog response: {}", e))
        })?;
        span.add_event("catalog.response", [("count", products.len())]);

        // Compose
        let products = recommend::recommend(&products, &category, limit);
        span.set_attribute("recommend.count", products.len());
        Ok(Recommendation::new(user, products))
    }

    fn lookup(&self, id: u64) -> Result<UserRecord, ServiceError> {
        self.store
            .get(id)
            .ok_or_else(|| ServiceError::not_found("User", id))
    }
}
