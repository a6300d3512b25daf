// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurohab-engine
//!
//! The habituation computation engine. For each subject, experimental
//! condition, and seed region it quantifies how the region's
//! functional-connectivity signal changes across the repeated blocks of a
//! condition, via one of two estimators:
//!
//! - **REG** ([`reg`]): per-voxel OLS of the signal on the natural log of
//!   the 1-based block rank, followed by a cross-subject bias correction of
//!   the slope (Plichta et al., 2014).
//! - **FmL** ([`fml`]): first-block-minus-last-block difference per voxel.
//!
//! The pipeline is: [`FileIndex::build`] resolves scattered per-block files
//! into a keyed (condition, region, subject) grid; [`reg`] or [`fml`]
//! produces a [`HabituationGrid`] of flat per-voxel maps; [`save_maps`]
//! reshapes them and writes one NIfTI volume per cell.
//!
//! Execution is a single synchronous batch. The per-voxel loops are
//! embarrassingly parallel and run across all cores via rayon; everything
//! else is sequential.

pub mod index;
pub mod methods;
pub mod regression;
pub mod writer;

mod error;

pub use error::{EngineError, EngineResult};
pub use index::{scan_input_dir, FileIndex, CANDIDATE_PREFIX};
pub use methods::{fml, reg, HabituationGrid, NiftiSource, VolumeSource};
pub use regression::{compute_correction, regress_voxels};
pub use writer::{save_maps, OUTPUT_PREFIX};
