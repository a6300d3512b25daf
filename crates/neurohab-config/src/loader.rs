// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Loading order:
//! 1. TOML file (base values)
//! 2. Environment variables (runtime overrides)

use crate::{ConfigError, ConfigResult, HabConfig, HabMethod};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file searched for by default
pub const CONFIG_FILE_NAME: &str = "neurohab.toml";

/// Find the NEUROHAB configuration file
///
/// Search order:
/// 1. `NEUROHAB_CONFIG_PATH` environment variable
/// 2. Current working directory: `./neurohab.toml`
/// 3. Ancestor directories (up to 5 levels)
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    // 1. Check environment variable first
    if let Ok(env_path) = env::var("NEUROHAB_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        } else {
            return Err(ConfigError::FileNotFound(format!(
                "Config file specified by NEUROHAB_CONFIG_PATH not found: {}",
                path.display()
            )));
        }
    }

    // 2. Search current directory and ancestors
    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "NEUROHAB configuration file '{}' not found in any of these locations:\n{}\n\nSet NEUROHAB_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
///
/// # Returns
///
/// Complete `HabConfig` with environment overrides applied
///
/// # Errors
///
/// Returns error if config file is not found or contains invalid TOML
pub fn load_config(config_path: Option<&Path>) -> ConfigResult<HabConfig> {
    let config_file = if let Some(path) = config_path {
        path.to_path_buf()
    } else {
        find_config_file()?
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: HabConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `NEUROHAB_INPUT_DIR` -> `study.input_dir`
/// - `NEUROHAB_OUTPUT_DIR` -> `study.output_dir`
/// - `NEUROHAB_METHOD` -> `run.method` (`reg` or `fml`)
/// - `NEUROHAB_REPLACE_NAN` -> `run.replace_nan`
/// - `NEUROHAB_LOG_LEVEL` -> `logging.level`
pub fn apply_environment_overrides(config: &mut HabConfig) {
    if let Ok(dir) = env::var("NEUROHAB_INPUT_DIR") {
        config.study.input_dir = PathBuf::from(dir);
    }
    if let Ok(dir) = env::var("NEUROHAB_OUTPUT_DIR") {
        config.study.output_dir = PathBuf::from(dir);
    }
    if let Ok(method) = env::var("NEUROHAB_METHOD") {
        match method.to_ascii_lowercase().as_str() {
            "reg" => config.run.method = HabMethod::Reg,
            "fml" => config.run.method = HabMethod::Fml,
            _ => {} // unknown values are ignored; validation reports the file value
        }
    }
    if let Ok(flag) = env::var("NEUROHAB_REPLACE_NAN") {
        config.run.replace_nan = flag == "1" || flag.eq_ignore_ascii_case("true");
    }
    if let Ok(level) = env::var("NEUROHAB_LOG_LEVEL") {
        config.logging.level = level;
    }
}
