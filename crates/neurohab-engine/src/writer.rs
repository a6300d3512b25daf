// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Habituation map output
//!
//! Reshapes each flat per-voxel map back into the declared 3-D grid and
//! writes it as `HAB_Subject<NNN>_Condition<NNN>_Source<NNN>.nii`. The
//! condition token carries the unique condition *label*, not a block
//! position, and every token uses the same zero-pad width the index was
//! built with — the file name is derived from the grid key itself, so a map
//! can never be written under another cell's label.

use std::path::Path;

use neurohab_volume::VolumeArray;
use tracing::{debug, info};

use crate::index::token;
use crate::methods::HabituationGrid;
use crate::EngineResult;

/// Fixed file-name prefix of output maps
pub const OUTPUT_PREFIX: &str = "HAB";

/// Compose the output file name for one grid cell
fn map_file_name(condition: u32, region: u32, subject: u32, pad: usize) -> String {
    format!(
        "{}_{}_{}_{}.nii",
        OUTPUT_PREFIX,
        token("Subject", subject, pad),
        token("Condition", condition, pad),
        token("Source", region, pad)
    )
}

/// Write every habituation map in `grid` to `dir`.
///
/// Each flat vector is reshaped to `shape` in the same row-major raster
/// order the loader flattened with, tagged with `affine`, and saved through
/// `neurohab-volume`. Existing files of the same name are overwritten
/// without warning.
///
/// # Errors
///
/// Fails on the first map whose length does not match `shape` or that
/// cannot be written; earlier maps stay on disk.
pub fn save_maps(
    dir: &Path,
    grid: &HabituationGrid,
    shape: [usize; 3],
    affine: [[f32; 4]; 4],
    pad: usize,
) -> EngineResult<()> {
    for (&(condition, region, subject), map) in grid {
        let path = dir.join(map_file_name(condition, region, subject, pad));
        let volume = VolumeArray {
            data: map.to_vec(),
            shape,
            affine,
        };
        neurohab_volume::save(&path, &volume)?;
        debug!(condition, region, subject, path = %path.display(), "wrote habituation map");
    }

    info!(maps = grid.len(), dir = %dir.display(), "saved habituation maps");
    Ok(())
}
