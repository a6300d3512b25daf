// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # NEUROHAB - Voxel-Wise Habituation Mapping
//!
//! NEUROHAB computes voxel-wise habituation maps from repeated-measures
//! brain-imaging data: for each subject, experimental condition, and seed
//! region it quantifies how the region's functional-connectivity signal
//! changes across the repeated blocks of a condition, and writes one NIfTI
//! map per cell.
//!
//! Two estimators are provided (Plichta et al., 2014):
//! - **REG**: per-voxel OLS on the log block rank, with a cross-subject
//!   correction removing the baseline-dependent bias from the slope
//! - **FmL**: first-block-minus-last-block signal difference
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! neurohab = "0.1"
//! ```
//!
//! ```rust,no_run
//! use neurohab::prelude::*;
//!
//! let config = load_config(None)?;
//! validate_config(&config)?;
//!
//! let subjects = config.study.subject_list();
//! let pad = config.study.effective_pad_width();
//!
//! let files = scan_input_dir(&config.study.input_dir)?;
//! let index = FileIndex::build(&files, &config.study.conditions, &config.study.regions, &subjects, pad);
//!
//! let source = NiftiSource::new(config.volume.shape);
//! let grid = reg(&source, &index, config.run.replace_nan)?;
//!
//! save_maps(&config.study.output_dir, &grid, config.volume.shape, config.volume.affine, pad)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The `hab_map` binary (`tools/hab_map.rs`) wraps exactly this pipeline
//! behind a `neurohab.toml` configuration file.

pub use neurohab_config as config;
pub use neurohab_engine as engine;
pub use neurohab_volume as volume;

/// Commonly used items for a full habituation run
pub mod prelude {
    pub use neurohab_config::{
        load_config, validate_config, ConfigError, HabConfig, HabMethod,
    };
    pub use neurohab_engine::{
        fml, reg, save_maps, scan_input_dir, EngineError, FileIndex, HabituationGrid,
        NiftiSource, VolumeSource,
    };
    pub use neurohab_volume::{VolumeArray, VolumeError};
}
