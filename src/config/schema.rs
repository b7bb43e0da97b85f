//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for both services.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Which of the two services a process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServiceRole {
    #[default]
    Catalog,
    User,
}

impl ServiceRole {
    pub fn default_name(&self) -> &'static str {
        match self {
            ServiceRole::Catalog => "catalog-service",
            ServiceRole::User => "user-service",
        }
    }

    pub fn default_bind_address(&self) -> &'static str {
        match self {
            ServiceRole::Catalog => "0.0.0.0:8002",
            ServiceRole::User => "0.0.0.0:8001",
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service identity.
    pub service: ServiceSettings,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Peer service used by the user service.
    pub downstream: DownstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Span recording settings.
    pub tracing: TracingConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Cross-origin settings.
    pub cors: CorsConfig,
}

impl ServiceConfig {
    /// Defaults for `role`, with role-specific name and bind address.
    pub fn for_role(role: ServiceRole) -> Self {
        Self {
            service: ServiceSettings {
                name: role.default_name().to_string(),
                role,
            },
            listener: ListenerConfig {
                bind_address: role.default_bind_address().to_string(),
            },
            ..Self::default()
        }
    }
}

/// Service identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Name reported in logs, spans and `/health`.
    pub name: String,

    pub role: ServiceRole,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: ServiceRole::Catalog.default_name().to_string(),
            role: ServiceRole::Catalog,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8002").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: ServiceRole::Catalog.default_bind_address().to_string(),
        }
    }
}

/// Downstream (catalog) service settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownstreamConfig {
    /// Base URL of the catalog service.
    pub catalog_url: String,

    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            catalog_url: "http://localhost:8002".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for a whole inbound request in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Span recording settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Sampled flag for traces minted by this service.
    pub sampled: bool,

    /// Log finished spans.
    pub export_spans: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            sampled: true,
            export_spans: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Prometheus endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins; `*` allows any.
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}
