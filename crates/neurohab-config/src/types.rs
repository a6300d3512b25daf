// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `neurohab.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HabConfig {
    pub study: StudyConfig,
    pub volume: VolumeConfig,
    pub run: RunConfig,
    pub logging: LoggingConfig,
}

/// Study design: who was scanned, in what block/condition sequence, and
/// which seed regions are analyzed.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StudyConfig {
    /// Directory holding the per-block `BETA*` input volumes
    pub input_dir: PathBuf,
    /// Directory the habituation maps are written to
    pub output_dir: PathBuf,
    /// First subject number of a contiguous range (used when `subjects` is empty)
    pub first_subject: u32,
    /// Last subject number of the range, inclusive
    pub last_subject: u32,
    /// Explicit subject numbers; takes precedence over the range when non-empty
    pub subjects: Vec<u32>,
    /// Condition label of each block/scan, in design-sequence order
    pub conditions: Vec<u32>,
    /// Seed/ROI numbers to include
    pub regions: Vec<u32>,
    /// Digits making up the subject/condition/source tokens in file names.
    /// Derived from the design sizes when absent.
    pub pad_width: Option<usize>,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            first_subject: 1,
            last_subject: 1,
            subjects: Vec::new(),
            conditions: Vec::new(),
            regions: Vec::new(),
            pad_width: None,
        }
    }
}

impl StudyConfig {
    /// Subjects to analyze: the explicit list when given, otherwise the
    /// inclusive `first_subject..=last_subject` range.
    pub fn subject_list(&self) -> Vec<u32> {
        if !self.subjects.is_empty() {
            self.subjects.clone()
        } else {
            (self.first_subject..=self.last_subject).collect()
        }
    }

    /// Effective zero-pad width for file-name tokens.
    ///
    /// When `pad_width` is not set it is derived as
    /// `ceil(log10(max(n_subjects, n_blocks, n_regions)))`, matching the
    /// token widths conventionally produced by the beta-export step, floored
    /// at one digit so even a single-cell design forms valid tokens.
    pub fn effective_pad_width(&self) -> usize {
        if let Some(width) = self.pad_width {
            return width;
        }
        let n_subjects = self.subject_list().len();
        let n_blocks = self.conditions.len();
        let n_regions = self.regions.len();
        let mv = n_subjects.max(n_blocks).max(n_regions);
        if mv <= 1 {
            1
        } else {
            (mv as f64).log10().ceil() as usize
        }
    }
}

/// Geometry shared by every input and output volume. Shape and affine are
/// declared here, not inferred from the input files.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VolumeConfig {
    /// Voxel grid dimensions of the 3-D volumes
    pub shape: [usize; 3],
    /// 4x4 voxel-to-world affine stamped onto every output volume
    pub affine: [[f32; 4]; 4],
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            shape: [91, 109, 91],
            affine: [
                [-2.0, 0.0, 0.0, 90.0],
                [0.0, 2.0, 0.0, -126.0],
                [0.0, 0.0, 2.0, -72.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }
}

/// Habituation estimator selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HabMethod {
    /// Regression on log block rank with cross-subject bias correction
    Reg,
    /// First-block-minus-last-block difference
    Fml,
}

impl Default for HabMethod {
    fn default() -> Self {
        HabMethod::Reg
    }
}

/// Run-level switches
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    pub method: HabMethod,
    /// Replace NaN voxels in REG maps with zero (background voxels regress
    /// 0 on 0 and come out NaN)
    pub replace_nan: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            method: HabMethod::Reg,
            replace_nan: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
