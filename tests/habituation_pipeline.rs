// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Integration Tests: Complete Habituation Pipeline
//!
//! End-to-end tests over real NIfTI files on disk:
//! - Beta export layout → scan → index → REG/FmL → map writer
//! - Cross-subject bias correction against hand-computed values
//! - NaN semantics for degenerate voxels
//! - Output naming and affine round-trip

use std::path::{Path, PathBuf};

use neurohab::prelude::*;
use neurohab::volume;

const SHAPE: [usize; 3] = [2, 2, 1];
const PAD: usize = 3;

fn test_affine() -> [[f32; 4]; 4] {
    [
        [-2.0, 0.0, 0.0, 90.0],
        [0.0, 2.0, 0.0, -126.0],
        [0.0, 0.0, 2.0, -72.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

fn write_beta(dir: &Path, subject: u32, block: u32, region: u32, data: Vec<f64>) {
    let name = format!(
        "BETA_Subject{:03}_Condition{:03}_Source{:03}.nii",
        subject, block, region
    );
    let volume = VolumeArray {
        data,
        shape: SHAPE,
        affine: test_affine(),
    };
    volume::save(&dir.join(name), &volume).unwrap();
}

/// 2 subjects, design [1, 1, 2, 2], 1 region, 4 voxels.
///
/// Condition 1 (blocks 1-2), voxel layout per block:
///   voxel 0: subject 1 -> [1, 2], subject 2 -> [2, 4] (differing intercepts)
///   voxel 1: both subjects [3, 5] (identical intercepts, varying signal)
///   voxel 2: zeros (background)
///   voxel 3: constant 7 (flat signal)
fn write_fixture(dir: &Path) {
    for subject in 1..=2 {
        let scale = subject as f64;
        // condition 1 blocks at design positions 1 and 2
        write_beta(dir, subject, 1, 1, vec![1.0 * scale, 3.0, 0.0, 7.0]);
        write_beta(dir, subject, 2, 1, vec![2.0 * scale, 5.0, 0.0, 7.0]);
        // condition 2 blocks at positions 3 and 4
        write_beta(dir, subject, 3, 1, vec![6.0, 1.0, 0.0, 7.0]);
        write_beta(dir, subject, 4, 1, vec![4.0, 1.0, 0.0, 7.0]);
    }
}

fn run_pipeline(input: &Path, output: &Path, method: HabMethod) -> HabituationGrid {
    let files = scan_input_dir(input).unwrap();
    let index = FileIndex::build(&files, &[1, 1, 2, 2], &[1], &[1, 2], PAD);
    let source = NiftiSource::new(SHAPE);

    let grid = match method {
        HabMethod::Reg => reg(&source, &index, false).unwrap(),
        HabMethod::Fml => fml(&source, &index).unwrap(),
    };

    std::fs::create_dir_all(output).unwrap();
    save_maps(output, &grid, SHAPE, test_affine(), PAD).unwrap();
    grid
}

fn load_map(output: &Path, subject: u32, condition: u32, region: u32) -> VolumeArray {
    let name = format!(
        "HAB_Subject{:03}_Condition{:03}_Source{:03}.nii",
        subject, condition, region
    );
    volume::load(&output.join(name)).unwrap()
}

#[test]
fn reg_end_to_end_bias_correction() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out");
    write_fixture(dir.path());

    run_pipeline(dir.path(), &output, HabMethod::Reg);

    let map_1 = load_map(&output, 1, 1, 1);
    let map_2 = load_map(&output, 2, 1, 1);

    // Voxel 0, condition 1: subject 1 fits slope 1/ln2 (intercept 1),
    // subject 2 fits 2/ln2 (intercept 2). c = 1/ln2, ahat = 1.5, so both
    // corrected slopes land on the group-mean-baseline value 1.5/ln2 —
    // different from either raw slope.
    let ln2 = 2.0_f64.ln();
    let expected = 1.5 / ln2;
    assert!((map_1.data[0] - expected).abs() < 1e-6, "{}", map_1.data[0]);
    assert!((map_2.data[0] - expected).abs() < 1e-6, "{}", map_2.data[0]);
    assert!((map_1.data[0] - 1.0 / ln2).abs() > 1e-3); // raw slope was corrected

    // Voxel 1: identical intercepts across subjects make the correction
    // undefined; without replace_nan the NaN sentinel reaches the file.
    assert!(map_1.data[1].is_nan());
    assert!(map_2.data[1].is_nan());

    // Voxel 2 (background zeros): 0-on-0 regression propagates NaN too.
    assert!(map_1.data[2].is_nan());

    // Affine round-trips exactly.
    assert_eq!(map_1.affine, test_affine());
}

#[test]
fn reg_replace_nan_zeroes_degenerate_voxels() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    let files = scan_input_dir(dir.path()).unwrap();
    let index = FileIndex::build(&files, &[1, 1, 2, 2], &[1], &[1, 2], PAD);
    let source = NiftiSource::new(SHAPE);
    let grid = reg(&source, &index, true).unwrap();

    for map in grid.values() {
        assert!(map.iter().all(|v| v.is_finite()));
    }
    // flat voxel 3: slope 0 everywhere, so zeroing the NaN equals the
    // uncorrected slope
    assert_eq!(grid[&(1, 1, 1)][3], 0.0);
}

#[test]
fn fml_end_to_end_first_minus_last() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out");
    write_fixture(dir.path());

    run_pipeline(dir.path(), &output, HabMethod::Fml);

    // Condition 1, subject 2: first block [2,3,0,7], last [4,5,0,7]
    let map = load_map(&output, 2, 1, 1);
    assert_eq!(map.data, vec![-2.0, -2.0, 0.0, 0.0]);

    // Condition 2 (blocks 3 and 4): first [6,1,0,7], last [4,1,0,7]
    let map = load_map(&output, 1, 2, 1);
    assert_eq!(map.data, vec![2.0, 0.0, 0.0, 0.0]);
}

#[test]
fn reg_is_idempotent_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    let files = scan_input_dir(dir.path()).unwrap();
    let index = FileIndex::build(&files, &[1, 1, 2, 2], &[1], &[1, 2], PAD);
    let source = NiftiSource::new(SHAPE);

    let first = reg(&source, &index, false).unwrap();
    let second = reg(&source, &index, false).unwrap();

    for (key, map) in &first {
        for (v1, v2) in map.iter().zip(second[key].iter()) {
            assert!(v1 == v2 || (v1.is_nan() && v2.is_nan()));
        }
    }
}

#[test]
fn output_set_covers_every_cell() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out");
    write_fixture(dir.path());

    let grid = run_pipeline(dir.path(), &output, HabMethod::Reg);
    assert_eq!(grid.len(), 4); // 2 conditions x 1 region x 2 subjects

    let mut written: Vec<PathBuf> = std::fs::read_dir(&output)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    written.sort();
    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "HAB_Subject001_Condition001_Source001.nii",
            "HAB_Subject001_Condition002_Source001.nii",
            "HAB_Subject002_Condition001_Source001.nii",
            "HAB_Subject002_Condition002_Source001.nii",
        ]
    );
}

#[test]
fn unresolved_cell_aborts_with_its_coordinates() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    // subject 3 has no files at all
    let files = scan_input_dir(dir.path()).unwrap();
    let index = FileIndex::build(&files, &[1, 1, 2, 2], &[1], &[1, 2, 3], PAD);
    let source = NiftiSource::new(SHAPE);

    let err = reg(&source, &index, false).unwrap_err();
    match err {
        EngineError::UnresolvedCell { subject, .. } => assert_eq!(subject, 3),
        other => panic!("expected UnresolvedCell, got {other}"),
    }
}
