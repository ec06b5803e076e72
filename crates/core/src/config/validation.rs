//! Configuration validation rules.

use crate::config::WorkerConfig;
use crate::http;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl WorkerConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` for empty names and
    /// `ConfigError::Invalid` if:
    /// - `origin` is not an absolute http(s) URL
    /// - `api_prefix` does not start with `/`
    /// - a static asset cannot be resolved against the origin
    /// - `timeout_ms` is set below 100ms or above 5 minutes
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_name.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "app_name".into(),
                hint: "Set SWCACHE_APP_NAME environment variable".into(),
            });
        }
        if self.cache_version.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "cache_version".into(),
                hint: "Set SWCACHE_CACHE_VERSION environment variable".into(),
            });
        }

        let origin = http::parse_origin(&self.origin).map_err(|e| invalid("origin", e.to_string()))?;

        if !self.api_prefix.starts_with('/') {
            return Err(invalid("api_prefix", "must start with '/'"));
        }

        for asset in &self.static_assets {
            http::resolve(&origin, asset).map_err(|e| invalid("static_assets", format!("{asset}: {e}")))?;
        }
        if self.static_assets.is_empty() {
            tracing::warn!("static_assets is empty; install will cache nothing");
        }

        if let Some(timeout_ms) = self.timeout_ms {
            if timeout_ms < 100 {
                return Err(invalid("timeout_ms", "must be at least 100ms"));
            }
            if timeout_ms > 300_000 {
                return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
            }
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(WorkerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_app_name() {
        let config = WorkerConfig { app_name: "  ".into(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Missing { field, .. }) if field == "app_name"));
    }

    #[test]
    fn test_validate_empty_version() {
        let config = WorkerConfig { cache_version: String::new(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Missing { field, .. }) if field == "cache_version"));
    }

    #[test]
    fn test_validate_relative_origin() {
        let config = WorkerConfig { origin: "localhost:8080/app".into(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }

    #[test]
    fn test_validate_bad_static_asset() {
        let config = WorkerConfig {
            static_assets: vec!["/".into(), "ftp://files.example/app.js".into()],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "static_assets"));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let low = WorkerConfig { timeout_ms: Some(50), ..Default::default() };
        assert!(matches!(low.validate(), Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));

        let high = WorkerConfig { timeout_ms: Some(301_000), ..Default::default() };
        assert!(matches!(high.validate(), Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));

        let edge = WorkerConfig { timeout_ms: Some(100), ..Default::default() };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = WorkerConfig { user_agent: String::new(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }
}
