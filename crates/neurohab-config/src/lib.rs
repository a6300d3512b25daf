// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # NEUROHAB Configuration System
//!
//! Type-safe configuration loader for habituation-mapping runs with support
//! for:
//! - TOML file parsing
//! - Environment variable overrides
//! - Eager, collected validation of the study design
//!
//! ## Usage
//!
//! ```rust,no_run
//! use neurohab_config::{load_config, validate_config};
//!
//! // Load configuration with automatic file discovery and overrides
//! let config = load_config(None).expect("Failed to load config");
//! validate_config(&config).expect("Invalid study configuration");
//!
//! // Access type-safe configuration values
//! println!("Input: {}", config.study.input_dir.display());
//! println!("Method: {:?}", config.run.method);
//! ```
//!
//! The study design (subject list, per-block condition sequence, seed
//! regions, zero-pad width) lives in a single `neurohab.toml` — there is no
//! process-wide mutable state; the loaded record is passed explicitly into
//! the engine.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{apply_environment_overrides, find_config_file, load_config};
pub use types::*;
pub use validation::{validate_config, ConfigValidationError};

/// Re-export for convenience
pub use serde;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found. Searched: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
