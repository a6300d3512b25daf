// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurohab-volume
//!
//! NIfTI volume container and I/O for NEUROHAB.
//!
//! The engine never touches the NIfTI format directly; it exchanges
//! [`VolumeArray`] values with this crate. A `VolumeArray` holds the voxel
//! data as a flat `f64` buffer in row-major (logical) order together with the
//! grid shape and the 4x4 voxel-to-world affine. [`load`] and [`save`] use
//! the same flattening order, so a saved map reloads to the identical buffer.

use std::path::{Path, PathBuf};

use ndarray::Array3;
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use tracing::{debug, warn};

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Volume I/O error types. All are fatal and name the offending path.
#[derive(Debug, thiserror::Error)]
pub enum VolumeError {
    #[error("Failed to read volume {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: nifti::NiftiError,
    },

    #[error("Failed to write volume {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Volume {path} is {ndim}-dimensional, expected 3")]
    NotThreeDimensional { path: PathBuf, ndim: usize },
}

/// Result type for volume operations
pub type VolumeResult<T> = Result<T, VolumeError>;

/// A decoded 3-D volume: flat voxel buffer, grid shape, and spatial affine.
///
/// `data` is in row-major order over `shape` (last axis fastest). The affine
/// carries f32 components because that is the precision the NIfTI sform rows
/// store.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeArray {
    pub data: Vec<f64>,
    pub shape: [usize; 3],
    pub affine: [[f32; 4]; 4],
}

impl VolumeArray {
    /// Number of voxels implied by the shape
    pub fn voxel_count(&self) -> usize {
        self.shape.iter().product()
    }
}

/// Load a NIfTI file into a [`VolumeArray`].
///
/// The voxel data is converted to `f64` regardless of the on-disk datatype
/// (scl slope/inter are applied by the decoder). The affine is taken from the
/// sform rows; when the file carries no sform, the voxel sizes fall back onto
/// the diagonal.
///
/// # Errors
///
/// Fails on unreadable/undecodable files and on volumes that are not 3-D.
pub fn load(path: &Path) -> VolumeResult<VolumeArray> {
    let object = ReaderOptions::new()
        .read_file(path)
        .map_err(|source| VolumeError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let affine = affine_from_header(object.header());

    let array = object
        .into_volume()
        .into_ndarray::<f64>()
        .map_err(|source| VolumeError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    if array.ndim() != 3 {
        return Err(VolumeError::NotThreeDimensional {
            path: path.to_path_buf(),
            ndim: array.ndim(),
        });
    }

    let shape = [array.shape()[0], array.shape()[1], array.shape()[2]];
    // Logical (row-major) iteration order, independent of the decoder's
    // in-memory layout. `save` reshapes with the same order.
    let data: Vec<f64> = array.iter().copied().collect();

    debug!(path = %path.display(), ?shape, "loaded volume");
    Ok(VolumeArray { data, shape, affine })
}

/// Save a [`VolumeArray`] as a NIfTI file, stamping its affine onto the
/// header (sform rows, `sform_code = 1`).
///
/// Existing files of the same name are overwritten without warning.
///
/// # Errors
///
/// Fails when the buffer length does not match the shape product or when the
/// file cannot be written.
pub fn save(path: &Path, volume: &VolumeArray) -> VolumeResult<()> {
    let [nx, ny, nz] = volume.shape;
    let array = Array3::from_shape_vec((nx, ny, nz), volume.data.clone()).map_err(|e| {
        VolumeError::Write {
            path: path.to_path_buf(),
            reason: format!(
                "buffer of {} voxels does not fit shape {:?}: {}",
                volume.data.len(),
                volume.shape,
                e
            ),
        }
    })?;

    let header = header_with_affine(volume.affine);

    WriterOptions::new(path)
        .reference_header(&header)
        .write_nifti(&array)
        .map_err(|e| VolumeError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    debug!(path = %path.display(), "wrote volume");
    Ok(())
}

fn affine_from_header(header: &NiftiHeader) -> [[f32; 4]; 4] {
    if header.sform_code > 0 {
        [
            header.srow_x,
            header.srow_y,
            header.srow_z,
            [0.0, 0.0, 0.0, 1.0],
        ]
    } else {
        warn!("volume header carries no sform; falling back to voxel sizes");
        let p = header.pixdim;
        [
            [p[1], 0.0, 0.0, 0.0],
            [0.0, p[2], 0.0, 0.0],
            [0.0, 0.0, p[3], 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]
    }
}

fn header_with_affine(affine: [[f32; 4]; 4]) -> NiftiHeader {
    NiftiHeader {
        sform_code: 1,
        srow_x: affine[0],
        srow_y: affine[1],
        srow_z: affine[2],
        ..NiftiHeader::default()
    }
}
