// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use neurohab_volume::VolumeError;

/// Engine error type.
///
/// Per-voxel numerical degeneracies never surface here — they are absorbed
/// as NaN in the output maps. Everything below aborts the run, since a
/// partial or mislabeled output set is worse than an explicit failure.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A (condition, region, subject) cell had a block with no matching
    /// input file. Surfaced when the cell is first consumed, not at index
    /// time (the index itself stays permissive).
    #[error("No input file matched condition {condition}, block {block}, region {region}, subject {subject}")]
    UnresolvedCell {
        condition: u32,
        block: u32,
        region: u32,
        subject: u32,
    },

    /// A loaded volume's voxel count disagrees with the declared shape or
    /// with the other blocks of the same matrix.
    #[error("Volume {path} holds {actual} voxels, expected {expected}")]
    VoxelCountMismatch {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    #[error("Failed to list input directory {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Volume(#[from] VolumeError),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
