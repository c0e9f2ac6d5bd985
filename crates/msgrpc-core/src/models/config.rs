//! Client configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Content type the message server answers with
pub const DEFAULT_RESPONSE_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

pub const DEFAULT_USER_AGENT: &str = concat!("msgrpc/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Sent as the `User-Agent` header
    pub user_agent: String,
    /// Exact `Content-Type` a response must carry to be decoded
    pub response_content_type: String,
    /// Upper bound on the wait for a single request
    pub timeout_ms: u64,
}

impl ClientConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.user_agent.trim().is_empty() {
            return Err(Error::Validation("User agent cannot be empty".to_string()));
        }

        if self.response_content_type.trim().is_empty() {
            return Err(Error::Validation(
                "Response content type cannot be empty".to_string(),
            ));
        }

        if self.timeout_ms == 0 {
            return Err(Error::Validation(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        const MAX_TIMEOUT_MS: u64 = 3_600_000; // 1 hour
        if self.timeout_ms > MAX_TIMEOUT_MS {
            return Err(Error::Validation(format!(
                "Timeout too long (max {} ms)",
                MAX_TIMEOUT_MS
            )));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_response_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.response_content_type = content_type.into();
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            response_content_type: DEFAULT_RESPONSE_CONTENT_TYPE.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.response_content_type, "text/plain; charset=utf-8");
        assert!(config.user_agent.starts_with("msgrpc/"));
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::default().with_user_agent("  ");
        assert!(config.validate().is_err());

        config.user_agent = "agent".to_string();
        config.response_content_type = String::new();
        assert!(config.validate().is_err());

        config.response_content_type = "application/json".to_string();
        config.timeout_ms = 0;
        assert!(config.validate().is_err());

        config.timeout_ms = 10_000_000; // Too long
        assert!(config.validate().is_err());

        config.timeout_ms = 500;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_timeout() {
        let config = ClientConfig::default().with_timeout(Duration::from_millis(250));
        assert_eq!(config.timeout_ms, 250);
        assert_eq!(config.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{"timeout_ms": 1000}"#).unwrap();
        assert_eq!(config.timeout_ms, 1000);
        assert_eq!(config.response_content_type, DEFAULT_RESPONSE_CONTENT_TYPE);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }
}
