//! Target service endpoints and API revision headers
//!
//! Every call the virtual actor makes carries an `x-version-id` header
//! selecting an API revision; the values here must match the target
//! platform byte-for-byte.

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, validate_url, Validatable};
use serde::{Deserialize, Serialize};

/// Target platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Header name carrying the API revision
    #[serde(default = "default_version_header")]
    pub version_header: String,

    /// Content service (newsfeed, posts, comments, reactions, quizzes)
    #[serde(default = "default_content")]
    pub content: ServiceEndpoint,

    /// Group service (communities, membership)
    #[serde(default = "default_group")]
    pub group: ServiceEndpoint,

    /// User service (profiles, login)
    #[serde(default = "default_user")]
    pub user: ServiceEndpoint,
}

/// One upstream service: base URL plus its latest API revision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub host: String,
    pub latest_version: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            version_header: default_version_header(),
            content: default_content(),
            group: default_group(),
            user: default_user(),
        }
    }
}

impl Validatable for TargetConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.version_header, "version_header", self.domain_name())?;
        for (field, endpoint) in [
            ("content", &self.content),
            ("group", &self.group),
            ("user", &self.user),
        ] {
            validate_url(&endpoint.host, field, self.domain_name())?;
            validate_required_string(&endpoint.latest_version, field, self.domain_name())?;
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "target"
    }
}

// Default value functions
fn default_version_header() -> String {
    "x-version-id".to_string()
}

fn default_content() -> ServiceEndpoint {
    ServiceEndpoint {
        host: "https://api.example.com/v1/content".to_string(),
        latest_version: "1.16.0".to_string(),
    }
}

fn default_group() -> ServiceEndpoint {
    ServiceEndpoint {
        host: "https://api.example.com/v1/group".to_string(),
        latest_version: "2.0.0".to_string(),
    }
}

fn default_user() -> ServiceEndpoint {
    ServiceEndpoint {
        host: "https://api.example.com/v1/user".to_string(),
        latest_version: "2.2.0".to_string(),
    }
}
