// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Every problem is collected before reporting, so one run shows them all.

use crate::{ConfigError, ConfigResult, Ts300Config};

/// Log levels accepted by `logging.level`
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Every problem found in `config`, in section order
pub fn collect_validation_errors(config: &Ts300Config) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_device(config, &mut errors);
    validate_reconnect(config, &mut errors);
    validate_logging(config, &mut errors);
    errors
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &Ts300Config) -> ConfigResult<()> {
    let errors = collect_validation_errors(config);
    if errors.is_empty() {
        return Ok(());
    }

    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

fn validate_device(config: &Ts300Config, errors: &mut Vec<ConfigValidationError>) {
    if config.device.host.trim().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "device.host".to_string(),
        });
    }
    if config.device.port == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "device.port".to_string(),
            reason: "must be positive".to_string(),
        });
    }
    if config.device.receive_buffer_size == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "device.receive_buffer_size".to_string(),
            reason: "must be positive".to_string(),
        });
    }
}

fn validate_reconnect(config: &Ts300Config, errors: &mut Vec<ConfigValidationError>) {
    if config.reconnect.delay_ms == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "reconnect.delay_ms".to_string(),
            reason: "must be positive".to_string(),
        });
    }
}

fn validate_logging(config: &Ts300Config, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!(
                "'{}' is not one of {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Ts300Config {
        let mut config = Ts300Config::default();
        config.device.host = "192.168.1.50".to_string();
        config.device.port = 5000;
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_default_config_needs_endpoint() {
        let errors = collect_validation_errors(&Ts300Config::default());
        assert_eq!(
            errors,
            vec![
                ConfigValidationError::MissingRequired {
                    field: "device.host".to_string()
                },
                ConfigValidationError::InvalidValue {
                    field: "device.port".to_string(),
                    reason: "must be positive".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_all_problems_reported_together() {
        let mut config = valid_config();
        config.device.receive_buffer_size = 0;
        config.reconnect.delay_ms = 0;
        config.logging.level = "loud".to_string();

        let errors = collect_validation_errors(&config);
        assert_eq!(errors.len(), 3);

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("device.receive_buffer_size"));
        assert!(message.contains("reconnect.delay_ms"));
        assert!(message.contains("logging.level"));
    }

    #[test]
    fn test_log_level_is_case_insensitive() {
        let mut config = valid_config();
        config.logging.level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
