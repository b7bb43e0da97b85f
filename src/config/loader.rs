//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{LogFormat, ServiceConfig, ServiceRole};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {message}")]
    Env { var: &'static str, message: String },

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration for `role`: optional TOML file, then environment
/// overrides, then validation.
pub fn load_config(path: Option<&Path>, role: ServiceRole) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => ServiceConfig::default(),
    };
    apply_role(&mut config, role);
    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Parse a TOML document. Missing sections fall back to defaults.
pub fn parse_config(content: &str) -> Result<ServiceConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Force `role`; name and bind address left at another role's defaults
/// follow the selected role.
pub fn apply_role(config: &mut ServiceConfig, role: ServiceRole) {
    let previous = config.service.role;
    if config.service.name == previous.default_name() || config.service.name.is_empty() {
        config.service.name = role.default_name().to_string();
    }
    if config.listener.bind_address == previous.default_bind_address() {
        config.listener.bind_address = role.default_bind_address().to_string();
    }
    config.service.role = role;
}

/// Apply environment overrides read through `lookup`.
///
/// Recognized: `SERVICE_NAME`, `BIND_ADDRESS`, `CATALOG_SERVICE_URL`
/// (or `PRODUCT_SERVICE_URL`), `DOWNSTREAM_TIMEOUT_SECS`, `LOG_LEVEL`,
/// `LOG_FORMAT`.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(name) = lookup("SERVICE_NAME") {
        config.service.name = name;
    }
    if let Some(addr) = lookup("BIND_ADDRESS") {
        config.listener.bind_address = addr;
    }
    if let Some(url) = lookup("CATALOG_SERVICE_URL").or_else(|| lookup("PRODUCT_SERVICE_URL")) {
        config.downstream.catalog_url = url;
    }
    if let Some(raw) = lookup("DOWNSTREAM_TIMEOUT_SECS") {
        config.downstream.timeout_secs = raw.trim().parse().map_err(|_| ConfigError::Env {
            var: "DOWNSTREAM_TIMEOUT_SECS",
            message: format!("'{}' is not a number of seconds", raw),
        })?;
    }
    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    if let Some(format) = lookup("LOG_FORMAT") {
        config.observability.log_format = match format.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" | "text" => LogFormat::Pretty,
            _ => {
                return Err(ConfigError::Env {
                    var: "LOG_FORMAT",
                    message: format!("'{}' is not one of json, pretty", format),
                })
            }
        };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_partial_file() {
        let config = parse_config(
            r#"
            [service]
            role = "user"

            [downstream]
            catalog_url = "http://catalog:8002"
            timeout_secs = 5

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.service.role, ServiceRole::User);
        assert_eq!(config.downstream.catalog_url, "http://catalog:8002");
        assert_eq!(config.downstream.timeout_secs, 5);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.timeouts.request_secs, 30);
        assert!(config.tracing.sampled);
    }

    #[test]
    fn test_parse_error_is_reported() {
        assert!(matches!(
            parse_config("[service\nname = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_role_defaults_follow_selected_role() {
        let mut config = ServiceConfig::default();
        apply_role(&mut config, ServiceRole::User);
        assert_eq!(config.service.name, "user-service");
        assert_eq!(config.listener.bind_address, "0.0.0.0:8001");

        let mut custom = ServiceConfig::default();
        custom.service.name = "recs".into();
        custom.listener.bind_address = "127.0.0.1:9000".into();
        apply_role(&mut custom, ServiceRole::User);
        assert_eq!(custom.service.name, "recs");
        assert_eq!(custom.listener.bind_address, "127.0.0.1:9000");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ServiceConfig::for_role(ServiceRole::User);
        apply_env_overrides(
            &mut config,
            env(&[
                ("PRODUCT_SERVICE_URL", "http://products:8000"),
                ("DOWNSTREAM_TIMEOUT_SECS", "3"),
                ("LOG_FORMAT", "JSON"),
                ("SERVICE_NAME", "users"),
            ]),
        )
        .unwrap();

        assert_eq!(config.downstream.catalog_url, "http://products:8000");
        assert_eq!(config.downstream.timeout_secs, 3);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.service.name, "users");
    }

    #[test]
    fn test_catalog_url_takes_precedence_over_legacy_name() {
        let mut config = ServiceConfig::for_role(ServiceRole::User);
        apply_env_overrides(
            &mut config,
            env(&[
                ("CATALOG_SERVICE_URL", "http://catalog:1"),
                ("PRODUCT_SERVICE_URL", "http://products:2"),
            ]),
        )
        .unwrap();
        assert_eq!(config.downstream.catalog_url, "http://catalog:1");
    }

    #[test]
    fn test_bad_env_value_is_an_error() {
        let mut config = ServiceConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("DOWNSTREAM_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "DOWNSTREAM_TIMEOUT_SECS", .. }));
    }
}
