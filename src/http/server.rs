//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the service for the configured role (catalog or user)
//! - Wire up middleware (request ID, tracing, timeout, CORS, metrics)
//! - Bind the router to a listener and drain on shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::FromRef, extract::State, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use url::Url;

use crate::config::{ConfigError, ServiceConfig, ServiceRole, TracingConfig};
use crate::downstream::{CatalogClient, DownstreamClient};
use crate::http::request::{self, TraceSettings};
use crate::http::{catalog, middleware, users};
use crate::observability::metrics::{MetricsSnapshot, RequestMetrics};
use crate::orchestrator::{CatalogService, UserService};
use crate::store::fixtures;
use crate::trace::{FanoutSink, LogSink, SpanSink, Tracer};

/// Extra time the outer timeout layer allows past the request deadline, so
/// the orchestrator reports its own deadline first.
const RESPONSE_GRACE: Duration = Duration::from_secs(1);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState<S> {
    pub service: S,
    pub tally: Arc<RequestMetrics>,
    pub trace: TraceSettings,
    pub name: Arc<str>,
}

impl<S> FromRef<AppState<S>> for TraceSettings {
    fn from_ref(state: &AppState<S>) -> Self {
        state.trace
    }
}

/// Span sink selected by the tracing config.
pub fn span_sink(config: &TracingConfig) -> Arc<dyn SpanSink> {
    if config.export_spans {
        Arc::new(LogSink)
    } else {
        Arc::new(FanoutSink::new())
    }
}

/// HTTP server for one service role.
pub struct ServiceServer {
    router: Router,
    config: ServiceConfig,
}

impl ServiceServer {
    /// Build the server for `config.service.role`. Finished spans go to `sink`.
    pub fn new(config: ServiceConfig, sink: Arc<dyn SpanSink>) -> Result<Self, ConfigError> {
        let tracer = Tracer::new(config.service.name.as_str(), sink);
        let name: Arc<str> = Arc::from(config.service.name.as_str());
        let tally = Arc::new(RequestMetrics::new(config.service.name.as_str()));
        let trace = TraceSettings {
            sample_new_traces: config.tracing.sampled,
        };

        let routes = match config.service.role {
            ServiceRole::Catalog => {
                let service = CatalogService::new(tracer, Arc::new(fixtures::catalog_store()));
                catalog::routes(AppState {
                    service,
                    tally,
                    trace,
                    name,
                })
            }
            ServiceRole::User => {
                let client = DownstreamClient::new(
                    tracer.clone(),
                    Duration::from_secs(config.downstream.timeout_secs),
                );
                let base = Url::parse(&config.downstream.catalog_url)?;
                let catalog = CatalogClient::new(client, &base)?;
                let service = UserService::new(
                    tracer,
                    Arc::new(fixtures::user_store()),
                    catalog,
                    Duration::from_secs(config.timeouts.request_secs),
                );
                users::routes(AppState {
                    service,
                    tally,
                    trace,
                    name,
                })
            }
        };

        let router = Self::build_router(&config, routes);
        Ok(Self { router, config })
    }

    /// Wrap the role's routes in the shared middleware stack.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, routes: Router) -> Router {
        let deadline = Duration::from_secs(config.timeouts.request_secs) + RESPONSE_GRACE;
        routes
            .layer(request::propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(deadline))
            .layer(request::set_request_id_layer())
            .layer(middleware::cors_layer(&config.cors))
    }

    /// The assembled router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight
    /// requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            service = %self.config.service.name,
            role = ?self.config.service.role,
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!(service = %self.config.service.name, "HTTP server stopped");
        Ok(())
    }
}

pub(crate) async fn health<S>(State(state): State<AppState<S>>) -> Json<Value> {
    Json(json!({ "status": "healthy", "service": &*state.name }))
}

pub(crate) async fn metrics_snapshot<S>(State(state): State<AppState<S>>) -> Json<MetricsSnapshot> {
    Json(state.tally.snapshot())
}
