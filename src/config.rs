// Client configuration

use std::time::Duration;

use serde::Deserialize;

use crate::error::ClientError;

pub const SERVICES_API_URL: &str = "https://services-api.ryanair.com/farfnd/v4/";
pub const AVAILABILITY_API_URL: &str = "https://www.ryanair.com/api/booking/v4/";
pub const LOCATE_API_URL: &str = "https://www.ryanair.com/api/";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Requested fare currency. The API falls back to the departure
    /// airport's local currency when this is unset.
    pub currency: Option<String>,
    /// Per-request timeout; `None` keeps reqwest's default.
    pub timeout_ms: Option<u64>,
    pub services_api_url: String,
    pub availability_api_url: String,
    pub locate_api_url: String,
    pub locale: String,
    pub market: String,
    pub retry: RetryConfig,
    pub circuit_breaker: Option<CircuitBreakerConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            currency: None,
            timeout_ms: None,
            services_api_url: SERVICES_API_URL.to_string(),
            availability_api_url: AVAILABILITY_API_URL.to_string(),
            locate_api_url: LOCATE_API_URL.to_string(),
            locale: "en-ie".to_string(),
            market: "en-gb".to_string(),
            retry: RetryConfig::default(),
            circuit_breaker: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 1000,
            max_backoff_ms: 60_000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub reset_timeout_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 1,
            reset_timeout_ms: 30_000,
        }
    }
}

impl ClientConfig {
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Defaults overlaid with `RYANAIR_*` environment variables. Nested keys
    /// use a double underscore, e.g. `RYANAIR_RETRY__MAX_ATTEMPTS=3`.
    pub fn from_env() -> Result<Self, ClientError> {
        let config: Self = ::config::Config::builder()
            .add_source(
                ::config::Environment::with_prefix("RYANAIR")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| ClientError::ConfigError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.retry.max_attempts == 0 {
            return Err(ClientError::ConfigError(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        for (name, url) in [
            ("services_api_url", &self.services_api_url),
            ("availability_api_url", &self.availability_api_url),
            ("locate_api_url", &self.locate_api_url),
        ] {
            if url.trim().is_empty() {
                return Err(ClientError::ConfigError(format!("{name} is empty")));
            }
        }
        Ok(())
    }
}
