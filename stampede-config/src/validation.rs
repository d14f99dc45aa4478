//! Configuration validation traits and utilities

use crate::error::{ConfigError, ConfigResult};

/// Trait for validatable configuration
pub trait Validatable {
    /// Validate the configuration
    fn validate(&self) -> ConfigResult<()>;

    /// Get the domain name for error reporting
    fn domain_name(&self) -> &'static str;

    /// Helper to create a domain-specific validation error
    fn validation_error(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::DomainError {
            domain: self.domain_name().to_string(),
            message: message.into(),
        }
    }
}

/// Validate a required string field
pub fn validate_required_string(value: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value.is_empty() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} cannot be empty", field_name),
        });
    }
    Ok(())
}

/// Validate a positive number
pub fn validate_positive<T>(value: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    if value <= T::default() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be greater than 0, got {}", field_name, value),
        });
    }
    Ok(())
}

/// Validate a URL
pub fn validate_url(url: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} cannot be empty", field_name),
        });
    }

    url::Url::parse(url).map_err(|e| ConfigError::DomainError {
        domain: domain.to_string(),
        message: format!("{} has invalid URL format: {}", field_name, e),
    })?;

    Ok(())
}

/// Validate a ratio in the closed unit interval
pub fn validate_ratio(value: f64, field_name: &str, domain: &str) -> ConfigResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be within [0, 1], got {}", field_name, value),
        });
    }
    Ok(())
}

/// Validate an inclusive range expressed as a (min, max) pair
pub fn validate_range(min: u64, max: u64, field_name: &str, domain: &str) -> ConfigResult<()> {
    if min > max {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} has min {} greater than max {}", field_name, min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required_string() {
        assert!(validate_required_string("value", "field", "domain").is_ok());
        assert!(validate_required_string("", "field", "domain").is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://api.example.com/v1", "host", "target").is_ok());
        assert!(validate_url("not a url", "host", "target").is_err());
        assert!(validate_url("", "host", "target").is_err());
    }

    #[test]
    fn test_validate_ratio() {
        assert!(validate_ratio(0.08, "reaction_ratio", "scenario").is_ok());
        assert!(validate_ratio(1.0, "reaction_ratio", "scenario").is_ok());
        assert!(validate_ratio(1.5, "reaction_ratio", "scenario").is_err());
        assert!(validate_ratio(-0.1, "reaction_ratio", "scenario").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range(5, 25, "page_iterations", "scenario").is_ok());
        assert!(validate_range(25, 5, "page_iterations", "scenario").is_err());
    }
}
