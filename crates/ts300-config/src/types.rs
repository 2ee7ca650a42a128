// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to a section in `ts300_configuration.toml`. Missing keys
//! fall back to the defaults below.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Ts300Config {
    pub device: DeviceConfig,
    pub reconnect: ReconnectConfig,
    pub logging: LoggingConfig,
}

/// Where the conference unit listens. Host and port have no usable default
/// and must come from the file, the environment or the command line.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub host: String,
    pub port: u16,
    /// Bytes read per receive
    pub receive_buffer_size: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 0,
            receive_buffer_size: 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectPolicyConfig {
    #[default]
    WhenConnected,
    Always,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub delay_ms: u64,
    pub disconnect_policy: DisconnectPolicyConfig,
}

impl ReconnectConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay_ms: 10_000,
            disconnect_policy: DisconnectPolicyConfig::WhenConnected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Log rejected commands and every frame sent
    pub diagnostics: bool,
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            diagnostics: false,
            log_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_file() {
        let config: Ts300Config = toml::from_str(
            r#"
            [device]
            host = "10.1.1.20"
            port = 4001
            receive_buffer_size = 512

            [reconnect]
            delay_ms = 2500
            disconnect_policy = "always"

            [logging]
            level = "debug"
            diagnostics = true
            log_dir = "/var/log/ts300"
            "#,
        )
        .unwrap();

        assert_eq!(config.device.host, "10.1.1.20");
        assert_eq!(config.device.port, 4001);
        assert_eq!(config.device.receive_buffer_size, 512);
        assert_eq!(config.reconnect.delay(), Duration::from_millis(2500));
        assert_eq!(config.reconnect.disconnect_policy, DisconnectPolicyConfig::Always);
        assert!(config.logging.diagnostics);
        assert_eq!(config.logging.log_dir, Some(PathBuf::from("/var/log/ts300")));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Ts300Config = toml::from_str("[device]\nhost = \"unit\"\n").unwrap();
        assert_eq!(config.device.port, 0);
        assert_eq!(config.reconnect, ReconnectConfig::default());
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let parsed: Result<Ts300Config, _> =
            toml::from_str("[reconnect]\ndisconnect_policy = \"sometimes\"\n");
        assert!(parsed.is_err());
    }
}
