// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later ones win:
//! 1. TOML file (base values)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{ConfigError, ConfigResult, Ts300Config, CONFIG_FILE_NAME};

fn parse_flag(value: &str) -> bool {
    let value = value.to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

/// Find the bridge configuration file
///
/// Search order:
/// 1. `TS300_CONFIG_PATH` environment variable
/// 2. Current working directory: `./ts300_configuration.toml`
/// 3. Parent directory and up to five ancestors
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("TS300_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by TS300_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.as_path();
        for _ in 0..6 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|path| path.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet TS300_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from a TOML file and apply overrides
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, the file is searched for.
/// * `cli_args` - Optional CLI argument overrides
///
/// Validation is left to [`validate_config`](crate::validate_config) so
/// callers can still patch values before checking.
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<Ts300Config> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: Ts300Config = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `TS300_DEVICE_HOST` -> `device.host`
/// - `TS300_DEVICE_PORT` -> `device.port`
/// - `TS300_RECEIVE_BUFFER_SIZE` -> `device.receive_buffer_size`
/// - `TS300_RECONNECT_DELAY_MS` -> `reconnect.delay_ms`
/// - `TS300_LOG_LEVEL` -> `logging.level`
/// - `TS300_DIAGNOSTICS` -> `logging.diagnostics`
///
/// Values that do not parse are ignored.
pub fn apply_environment_overrides(config: &mut Ts300Config) {
    if let Ok(value) = env::var("TS300_DEVICE_HOST") {
        config.device.host = value;
    }
    if let Ok(value) = env::var("TS300_DEVICE_PORT") {
        if let Ok(port) = value.parse::<u16>() {
            config.device.port = port;
        }
    }
    if let Ok(value) = env::var("TS300_RECEIVE_BUFFER_SIZE") {
        if let Ok(size) = value.parse::<usize>() {
            config.device.receive_buffer_size = size;
        }
    }
    if let Ok(value) = env::var("TS300_RECONNECT_DELAY_MS") {
        if let Ok(delay) = value.parse::<u64>() {
            config.reconnect.delay_ms = delay;
        }
    }
    if let Ok(value) = env::var("TS300_LOG_LEVEL") {
        config.logging.level = value;
    }
    if let Ok(value) = env::var("TS300_DIAGNOSTICS") {
        config.logging.diagnostics = parse_flag(&value);
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - e.g. `{"device_host": "10.0.0.5", "device_port": "5000"}`
pub fn apply_cli_overrides(config: &mut Ts300Config, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("device_host") {
        config.device.host = value.clone();
    }
    if let Some(value) = cli_args.get("device_port") {
        if let Ok(port) = value.parse::<u16>() {
            config.device.port = port;
        }
    }
    if let Some(value) = cli_args.get("receive_buffer_size") {
        if let Ok(size) = value.parse::<usize>() {
            config.device.receive_buffer_size = size;
        }
    }
    if let Some(value) = cli_args.get("reconnect_delay_ms") {
        if let Ok(delay) = value.parse::<u64>() {
            config.reconnect.delay_ms = delay;
        }
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
    if let Some(value) = cli_args.get("diagnostics") {
        config.logging.diagnostics = parse_flag(value);
    }
}
