//! Resilient HTTP client configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout; a request exceeding it is treated as a
    /// transport failure
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_timeout"
    )]
    pub timeout: Duration,

    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whether to verify SSL certificates
    #[serde(default = "crate::domains::utils::default_true")]
    pub verify_ssl: bool,

    /// Retry policy for classified-retryable failures
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Linear backoff step: delay before attempt n is `interval * n`
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_retry_interval"
    )]
    pub interval: Duration,

    /// Retry attempts before escalating
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Upper bound of the randomized sleep taken between exhaustive-retry
    /// rounds for transport failures
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_exhaustive_sleep_cap"
    )]
    pub exhaustive_sleep_cap: Duration,

    /// Tick interval of the retry liveness indicator
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_heartbeat_interval"
    )]
    pub heartbeat_interval: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            user_agent: default_user_agent(),
            verify_ssl: true,
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            interval: default_retry_interval(),
            max_attempts: default_max_attempts(),
            exhaustive_sleep_cap: default_exhaustive_sleep_cap(),
            heartbeat_interval: default_heartbeat_interval(),
        }
    }
}

impl Validatable for HttpConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.timeout.as_secs(), "timeout", self.domain_name())?;
        validate_required_string(&self.user_agent, "user_agent", self.domain_name())?;
        self.retry.validate()?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "http"
    }
}

impl Validatable for RetryConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.max_attempts, "max_attempts", self.domain_name())?;
        validate_positive(
            self.exhaustive_sleep_cap.as_millis(),
            "exhaustive_sleep_cap",
            self.domain_name(),
        )?;
        validate_positive(
            self.heartbeat_interval.as_millis(),
            "heartbeat_interval",
            self.domain_name(),
        )?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "http.retry"
    }
}

// Default value functions
fn default_timeout() -> Duration {
    Duration::from_secs(200)
}

fn default_user_agent() -> String {
    "Stampede/0.3".to_string()
}

fn default_retry_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_max_attempts() -> u32 {
    10
}

fn default_exhaustive_sleep_cap() -> Duration {
    Duration::from_secs(30)
}

fn default_heartbeat_interval() -> Duration {
    Duration::from_secs(1)
}
