//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that access-control ranges parse as addresses/CIDR blocks
//! - Check that the selected auth mode has its credentials
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: SyncConfig -> Result<(), Vec<ValidationError>>
//! - Runs before the config is accepted into the system

use crate::config::schema::{AuthMode, PatternFilterConfig, SyncConfig};
use crate::filter::origin::parse_range;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field (e.g., "access_control.allow_ranges").
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &SyncConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.is_empty() {
        errors.push(ValidationError {
            field: "listener.host".into(),
            message: "must not be empty".into(),
        });
    }

    for (field, ranges) in [
        ("access_control.allow_ranges", &config.access_control.allow_ranges),
        ("access_control.deny_ranges", &config.access_control.deny_ranges),
    ] {
        for range in ranges {
            if parse_range(range).is_none() {
                errors.push(ValidationError {
                    field: field.into(),
                    message: format!("'{range}' is not an address or CIDR range"),
                });
            }
        }
    }

    validate_pattern_filter(&config.pattern_filter, &mut errors);

    match config.auth.mode {
        AuthMode::None => {}
        AuthMode::Token => {
            if config.auth.token.is_empty() {
                errors.push(ValidationError {
                    field: "auth.token".into(),
                    message: "required when auth.mode = \"token\"".into(),
                });
            }
        }
        AuthMode::Basic => {
            if config.auth.username.is_empty() || config.auth.password.is_empty() {
                errors.push(ValidationError {
                    field: "auth.username/auth.password".into(),
                    message: "required when auth.mode = \"basic\"".into(),
                });
            }
        }
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError {
            field: "limits.max_body_bytes".into(),
            message: "must be greater than zero".into(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError {
            field: "timeouts.request_secs".into(),
            message: "must be greater than zero".into(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_pattern_filter(config: &PatternFilterConfig, errors: &mut Vec<ValidationError>) {
    if !config.enabled {
        return;
    }
    for (field, path) in [
        ("pattern_filter.allow_file", &config.allow_file),
        ("pattern_filter.deny_file", &config.deny_file),
    ] {
        if let Some(path) = path {
            if !path.is_file() {
                errors.push(ValidationError {
                    field: field.into(),
                    message: format!("rule file '{}' does not exist", path.display()),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::AccessMode;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&SyncConfig::default()).is_ok());
    }

    #[test]
    fn bad_range_is_reported_with_field_path() {
        let mut config = SyncConfig::default();
        config.access_control.mode = AccessMode::Whitelist;
        config.access_control.allow_ranges = vec!["not-an-address".into()];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "access_control.allow_ranges");
    }

    #[test]
    fn token_mode_requires_token() {
        let mut config = SyncConfig::default();
        config.auth.mode = AuthMode::Token;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "auth.token"));
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = SyncConfig::default();
        config.auth.mode = AuthMode::Basic;
        config.limits.max_body_bytes = 0;
        config.access_control.deny_ranges = vec!["999.0.0.1".into()];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
