//! Domain-specific configuration modules

pub mod auth;
pub mod http;
pub mod logging;
pub mod scenario;
pub mod target;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main Stampede configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StampedeConfig {
    /// Resilient HTTP client configuration
    #[serde(default)]
    pub http: http::HttpConfig,

    /// Identity provider and token lifecycle configuration
    #[serde(default)]
    pub auth: auth::AuthConfig,

    /// Target service endpoints and API revisions
    #[serde(default)]
    pub target: target::TargetConfig,

    /// Scenario sampling ratios and timing windows
    #[serde(default)]
    pub scenario: scenario::ScenarioConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl StampedeConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.http.validate()?;
        self.auth.validate()?;
        self.target.validate()?;
        self.scenario.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
