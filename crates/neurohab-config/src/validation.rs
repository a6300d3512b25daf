// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! This module provides validation logic to ensure the study design is
//! consistent before any file is touched. A mislabeled neuroimaging output
//! is worse than an explicit failure, so every violation is collected and
//! reported eagerly.

use crate::{ConfigError, ConfigResult, HabConfig};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
    PadWidthTooSmall { family: String, id: u32, width: usize },
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
            Self::PadWidthTooSmall { family, id, width } => {
                write!(
                    f,
                    "pad_width = {} is too small for {} {}: its token would also match longer numbers by substring",
                    width, family, id
                )
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - Non-empty condition sequence, region list, and subject set
/// - A sane subject range when no explicit list is given
/// - A positive output volume shape
/// - A pad width wide enough that no token is a prefix of another
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` with all collected violations
pub fn validate_config(config: &HabConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_study(config, &mut errors);
    validate_volume(config, &mut errors);
    validate_pad_width(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_study(config: &HabConfig, errors: &mut Vec<ConfigValidationError>) {
    let study = &config.study;

    if study.conditions.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "study.conditions".to_string(),
        });
    }
    if study.regions.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "study.regions".to_string(),
        });
    }
    if study.subjects.is_empty() && study.first_subject > study.last_subject {
        errors.push(ConfigValidationError::InvalidValue {
            field: "study.first_subject/last_subject".to_string(),
            reason: format!(
                "range {}..={} is empty and no explicit subject list was given",
                study.first_subject, study.last_subject
            ),
        });
    }
}

fn validate_volume(config: &HabConfig, errors: &mut Vec<ConfigValidationError>) {
    let shape = config.volume.shape;
    if shape.iter().any(|&d| d == 0) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "volume.shape".to_string(),
            reason: format!("all dimensions must be positive, got {:?}", shape),
        });
    }
}

/// File matching works by substring containment of zero-padded tokens, so a
/// token narrower than an ID's digit count would also match every longer ID
/// sharing its prefix (`Subject1` matches `Subject10`). Zero-padding never
/// truncates, which makes "width >= digits of the widest ID" the exact
/// collision-freedom condition per token family.
fn validate_pad_width(config: &HabConfig, errors: &mut Vec<ConfigValidationError>) {
    let width = config.study.effective_pad_width();

    let families: [(&str, Vec<u32>); 3] = [
        ("subject", config.study.subject_list()),
        (
            "block",
            (1..=config.study.conditions.len() as u32).collect(),
        ),
        ("region", config.study.regions.clone()),
    ];

    for (family, ids) in families {
        for id in ids {
            if digits(id) > width {
                errors.push(ConfigValidationError::PadWidthTooSmall {
                    family: family.to_string(),
                    id,
                    width,
                });
                break; // one report per family is enough
            }
        }
    }
}

fn digits(id: u32) -> usize {
    id.to_string().len()
}
