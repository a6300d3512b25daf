// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! REG and FmL habituation estimators
//!
//! Both estimators walk the [`FileIndex`] and produce one flat habituation
//! map per (condition, region, subject) cell. They are mutually exclusive
//! alternatives — a run uses exactly one.
//!
//! Volumes are pulled through the [`VolumeSource`] seam so the estimators
//! stay independent of the on-disk format; production code uses
//! [`NiftiSource`], tests substitute in-memory sources.

use std::collections::BTreeMap;
use std::path::Path;

use ndarray::{Array1, Array2, Axis};
use tracing::{debug, info};

use crate::index::FileIndex;
use crate::regression::{compute_correction, regress_voxels};
use crate::{EngineError, EngineResult};

/// One flat habituation map per (condition, region, subject) cell.
///
/// `BTreeMap` keys iterate in ascending (condition, region, subject) order,
/// which is also the order maps are written out in.
pub type HabituationGrid = BTreeMap<(u32, u32, u32), Array1<f64>>;

/// Source of flattened volume data, the seam between the estimators and the
/// image format.
pub trait VolumeSource {
    /// Load the volume at `path` as a flat voxel vector in the engine's
    /// canonical (row-major) raster order.
    fn load_flat(&self, path: &Path) -> EngineResult<Vec<f64>>;
}

/// Production [`VolumeSource`] backed by `neurohab-volume`, enforcing the
/// configured grid shape on every loaded file.
pub struct NiftiSource {
    expected_voxels: usize,
}

impl NiftiSource {
    pub fn new(shape: [usize; 3]) -> Self {
        Self {
            expected_voxels: shape.iter().product(),
        }
    }
}

impl VolumeSource for NiftiSource {
    fn load_flat(&self, path: &Path) -> EngineResult<Vec<f64>> {
        let volume = neurohab_volume::load(path)?;
        if volume.data.len() != self.expected_voxels {
            return Err(EngineError::VoxelCountMismatch {
                path: path.to_path_buf(),
                expected: self.expected_voxels,
                actual: volume.data.len(),
            });
        }
        Ok(volume.data)
    }
}

/// Load one cell's block matrix: one row per block-in-condition, one column
/// per voxel.
fn block_matrix<S: VolumeSource>(
    source: &S,
    index: &FileIndex,
    condition: u32,
    region: u32,
    subject: u32,
) -> EngineResult<Array2<f64>> {
    let paths = index.resolved_cell(condition, region, subject)?;
    let n_blocks = paths.len();

    let mut data = Vec::new();
    let mut n_voxels = None;
    for path in paths {
        let flat = source.load_flat(path)?;
        match n_voxels {
            None => n_voxels = Some(flat.len()),
            Some(expected) if expected != flat.len() => {
                return Err(EngineError::VoxelCountMismatch {
                    path: path.to_path_buf(),
                    expected,
                    actual: flat.len(),
                });
            }
            Some(_) => {}
        }
        data.extend_from_slice(&flat);
    }

    let n_voxels = n_voxels.unwrap_or(0);
    Ok(Array2::from_shape_vec((n_blocks, n_voxels), data)
        .expect("row lengths verified above"))
}

/// REG estimator: regression-based habituation with cross-subject bias
/// correction (Plichta et al., 2014).
///
/// Per (condition, region), every subject's block matrix is fitted per voxel
/// ([`regress_voxels`]), the correction factor `c` is derived across
/// subjects ([`compute_correction`]), and each subject's corrected map is
/// `slope - c * (intercept - ahat)` with `ahat` the group-mean intercept.
/// Subjects with an atypically high or low baseline have their slope pulled
/// toward what it would be at the group-mean baseline.
///
/// NaN voxels (background 0-on-0 fits, undefined `c`) are replaced with
/// zero when `replace_nan` is set, and passed through unchanged otherwise.
pub fn reg<S: VolumeSource>(
    source: &S,
    index: &FileIndex,
    replace_nan: bool,
) -> EngineResult<HabituationGrid> {
    let subjects = index.subjects().to_vec();
    let mut grid = HabituationGrid::new();

    for &condition in index.conditions() {
        for &region in index.regions() {
            let mut slope_rows: Vec<f64> = Vec::new();
            let mut intercept_rows: Vec<f64> = Vec::new();
            let mut n_voxels = 0;

            for &subject in &subjects {
                let matrix = block_matrix(source, index, condition, region, subject)?;
                let (slope, intercept) = regress_voxels(&matrix);
                n_voxels = slope.len();
                slope_rows.extend(slope.iter());
                intercept_rows.extend(intercept.iter());
                debug!(condition, region, subject, "fitted block matrix");
            }

            let b = Array2::from_shape_vec((subjects.len(), n_voxels), slope_rows)
                .expect("one slope row per subject");
            let a = Array2::from_shape_vec((subjects.len(), n_voxels), intercept_rows)
                .expect("one intercept row per subject");

            let c = compute_correction(&b, &a);
            let ahat = a.mean_axis(Axis(0)).expect("at least one subject");

            for (row, &subject) in subjects.iter().enumerate() {
                let deviation = &a.row(row).to_owned() - &ahat;
                let mut map = &b.row(row).to_owned() - &(&c * &deviation);
                if replace_nan {
                    map.mapv_inplace(|v| if v.is_nan() { 0.0 } else { v });
                }
                grid.insert((condition, region, subject), map);
            }

            info!(
                condition,
                region,
                subjects = subjects.len(),
                "computed REG habituation maps"
            );
        }
    }

    Ok(grid)
}

/// FmL estimator: first-block-minus-last-block difference per voxel.
///
/// Only the first and the last block of each cell are loaded; intermediate
/// blocks never influence the result. A single-block condition yields an
/// all-zero map (the block is subtracted from itself).
pub fn fml<S: VolumeSource>(source: &S, index: &FileIndex) -> EngineResult<HabituationGrid> {
    let mut grid = HabituationGrid::new();

    for &condition in index.conditions() {
        for &region in index.regions() {
            for &subject in index.subjects() {
                let paths = index.resolved_cell(condition, region, subject)?;
                let first_path = paths.first().ok_or(EngineError::UnresolvedCell {
                    condition,
                    block: 0,
                    region,
                    subject,
                })?;
                let last_path = paths.last().expect("non-empty checked above");

                let first = source.load_flat(first_path)?;
                let last = source.load_flat(last_path)?;
                if first.len() != last.len() {
                    return Err(EngineError::VoxelCountMismatch {
                        path: last_path.to_path_buf(),
                        expected: first.len(),
                        actual: last.len(),
                    });
                }

                let map: Array1<f64> = first
                    .iter()
                    .zip(last.iter())
                    .map(|(f, l)| f - l)
                    .collect();
                grid.insert((condition, region, subject), map);
                debug!(condition, region, subject, "computed FmL map");
            }
            info!(
                condition,
                region,
                subjects = index.subjects().len(),
                "computed FmL habituation maps"
            );
        }
    }

    Ok(grid)
}
