// src/config.rs
// =============================================================================
// Process-wide settings, assembled once in main from flags and environment
// and then handed down. Nothing reads the environment after startup.
// =============================================================================

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::cache::{CacheConfig, ResponseCache};
use crate::github::{ClientConfig, GitHubClient, GitHubError};
use crate::service::{DocsService, DEFAULT_RATE_LIMIT_TTL};

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid API URL {url}: {reason}")]
    ApiUrl { url: String, reason: String },

    #[error("invalid bind address {0}: expected host:port")]
    Bind(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error(transparent)]
    Client(#[from] GitHubError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub client: ClientConfig,
    pub cache: CacheConfig,
    pub rate_limit_ttl: Duration,
    pub bind: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            client: ClientConfig::default(),
            cache: CacheConfig::default(),
            rate_limit_ttl: DEFAULT_RATE_LIMIT_TTL,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let api_url = &self.client.api_url;
        let parsed = Url::parse(api_url).map_err(|e| ConfigError::ApiUrl {
            url: api_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::ApiUrl {
                url: api_url.clone(),
                reason: "scheme must be http or https".to_string(),
            });
        }

        let port_ok = self
            .bind
            .rsplit_once(':')
            .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
        if !port_ok {
            return Err(ConfigError::Bind(self.bind.clone()));
        }

        // reqwest treats a zero timeout as "expire immediately"
        if self.client.timeout.is_zero() {
            return Err(ConfigError::Zero("request timeout"));
        }
        if self.cache.max_entries == 0 {
            return Err(ConfigError::Zero("cache max entries"));
        }
        if self.cache.max_bytes == 0 {
            return Err(ConfigError::Zero("cache max bytes"));
        }
        if self.cache.ttl.is_zero() {
            return Err(ConfigError::Zero("cache TTL"));
        }
        Ok(())
    }

    /// Validates and wires up the client, cache and service
    pub fn build_service(&self) -> Result<DocsService, ConfigError> {
        self.validate()?;
        let client = GitHubClient::new(self.client.clone())?;
        Ok(DocsService::new(
            client,
            ResponseCache::new(self.cache),
            self.rate_limit_ttl,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.max_entries, 500);
        assert_eq!(config.rate_limit_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = Config::default();
        config.client.api_url = "ftp://example.com".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::ApiUrl { .. })));

        let mut config = Config::default();
        config.bind = "3000".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Bind(_))));

        let mut config = Config::default();
        config.cache.max_entries = 0;
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "cache max entries must be greater than zero"
        );
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let mut config = Config::default();
        config.client.timeout = Duration::ZERO;
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "request timeout must be greater than zero"
        );
        assert!(config.build_service().is_err());
    }

    #[test]
    fn test_build_service() {
        let mut config = Config::default();
        config.cache.max_entries = 3;
        let service = config.build_service().unwrap();
        assert_eq!(service.cache().config().max_entries, 3);
    }
}
