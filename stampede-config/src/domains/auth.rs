//! Identity provider and token lifecycle configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, validate_url, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identity provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Identity provider endpoint
    #[serde(default = "default_provider_url")]
    pub provider_url: String,

    /// OAuth client id sent with every credential exchange
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Domain appended to usernames to form login emails
    #[serde(default = "default_email_domain")]
    pub email_domain: String,

    /// Shared secret for seeded identities
    #[serde(default = "default_secret")]
    pub default_secret: String,

    /// Credential exchange retry policy
    #[serde(default)]
    pub acquire: AcquireConfig,

    /// Token refresh retry policy
    #[serde(default)]
    pub refresh: RefreshConfig,
}

/// Credential exchange retry policy: fixed delay between attempts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquireConfig {
    #[serde(default = "default_acquire_attempts")]
    pub max_attempts: u32,

    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_acquire_delay"
    )]
    pub delay: Duration,
}

/// Token refresh retry policy: delay grows linearly with the attempt number
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    #[serde(default = "default_refresh_attempts")]
    pub max_attempts: u32,

    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_refresh_interval"
    )]
    pub interval: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            provider_url: default_provider_url(),
            client_id: default_client_id(),
            email_domain: default_email_domain(),
            default_secret: default_secret(),
            acquire: AcquireConfig::default(),
            refresh: RefreshConfig::default(),
        }
    }
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_acquire_attempts(),
            delay: default_acquire_delay(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_refresh_attempts(),
            interval: default_refresh_interval(),
        }
    }
}

impl Validatable for AuthConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_url(&self.provider_url, "provider_url", self.domain_name())?;
        validate_required_string(&self.client_id, "client_id", self.domain_name())?;
        validate_required_string(&self.email_domain, "email_domain", self.domain_name())?;
        self.acquire.validate()?;
        self.refresh.validate()?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "auth"
    }
}

impl Validatable for AcquireConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.max_attempts, "max_attempts", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "auth.acquire"
    }
}

impl Validatable for RefreshConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.max_attempts, "max_attempts", self.domain_name())?;
        validate_positive(self.interval.as_secs(), "interval", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "auth.refresh"
    }
}

// Default value functions
fn default_provider_url() -> String {
    "https://idp.example.com".to_string()
}

fn default_client_id() -> String {
    "stampede-client".to_string()
}

fn default_email_domain() -> String {
    "example.com".to_string()
}

fn default_secret() -> String {
    "change-me".to_string()
}

fn default_acquire_attempts() -> u32 {
    6
}

fn default_acquire_delay() -> Duration {
    Duration::from_secs(3)
}

fn default_refresh_attempts() -> u32 {
    6
}

fn default_refresh_interval() -> Duration {
    Duration::from_secs(5)
}
