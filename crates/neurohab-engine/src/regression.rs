// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-voxel ordinary least squares
//!
//! The habituation model regresses each voxel's signal on the natural log of
//! the 1-based block rank: the log transform encodes the assumed decay form
//! (rapid early change, slower later change). Both the per-subject fit and
//! the cross-subject bias-correction fit use the same closed-form OLS:
//! `slope = cov(x, y) / var(x)`, `intercept = mean(y) - slope * mean(x)`.
//!
//! Voxels are independent, so both entry points parallelize the column loop
//! with rayon. Each column writes one disjoint output slot; there is no
//! shared mutable state.

use ndarray::parallel::prelude::*;
use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Closed-form OLS fit of `y` on `x`. Returns `(slope, intercept)`.
///
/// With fewer than two samples (or a constant `x`) the variance is zero and
/// the slope comes out non-finite; callers that need to avoid that must
/// check their inputs first.
fn ols_fit(x: ArrayView1<f64>, y: ArrayView1<f64>) -> (f64, f64) {
    let n = x.len() as f64;
    let mean_x = x.sum() / n;
    let mean_y = y.sum() / n;

    let mut cov = 0.0;
    let mut var = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        cov += dx * (yi - mean_y);
        var += dx * dx;
    }

    let slope = cov / var;
    (slope, mean_y - slope * mean_x)
}

/// Fit the habituation model at every voxel of one block matrix.
///
/// `matrix` has one row per block-in-condition and one column per voxel.
/// For each column, `y = slope * ln(block_rank) + intercept` is fitted
/// across the rows; returns the per-voxel slope and intercept vectors.
///
/// A matrix with fewer than two rows is degenerate: `var(x)` is zero and
/// every fit comes out non-finite. That case is deliberately not
/// special-cased here — single-block conditions are a design error, and the
/// NaNs surface in the output map where `replace_nan` can zero them.
pub fn regress_voxels(matrix: &Array2<f64>) -> (Array1<f64>, Array1<f64>) {
    let n_blocks = matrix.nrows();
    let x: Array1<f64> = (1..=n_blocks).map(|rank| (rank as f64).ln()).collect();

    let fits: Vec<(f64, f64)> = matrix
        .axis_iter(Axis(1))
        .into_par_iter()
        .map(|column| ols_fit(x.view(), column))
        .collect();

    let slope = fits.iter().map(|&(s, _)| s).collect();
    let intercept = fits.iter().map(|&(_, i)| i).collect();
    (slope, intercept)
}

/// Compute the per-voxel bias-correction factor `c`.
///
/// For each voxel, the subjects' slopes (`slopes` row per subject) are
/// regressed on the subjects' intercepts; only the slope of that second fit
/// is kept. Where every subject shares an identical intercept the fit is
/// undefined, and `c` is set to NaN explicitly instead of reaching the
/// division — the NaN is absorbed downstream, never raised.
///
/// Both matrices are subject × voxel and must agree in shape.
pub fn compute_correction(slopes: &Array2<f64>, intercepts: &Array2<f64>) -> Array1<f64> {
    debug_assert_eq!(slopes.dim(), intercepts.dim());

    let c: Vec<f64> = slopes
        .axis_iter(Axis(1))
        .into_par_iter()
        .zip(intercepts.axis_iter(Axis(1)).into_par_iter())
        .map(|(b, a)| {
            let first = a[0];
            if a.iter().all(|&v| v == first) {
                f64::NAN
            } else {
                ols_fit(a, b).0
            }
        })
        .collect();

    Array1::from_vec(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    const TOL: f64 = 1e-10;

    #[test]
    fn recovers_linear_in_log_signal() {
        // y = 2 * ln(block) + 5 at every voxel
        let n_blocks = 5;
        let n_voxels = 4;
        let matrix = Array2::from_shape_fn((n_blocks, n_voxels), |(block, _)| {
            2.0 * ((block + 1) as f64).ln() + 5.0
        });

        let (slope, intercept) = regress_voxels(&matrix);
        for voxel in 0..n_voxels {
            assert!((slope[voxel] - 2.0).abs() < TOL, "slope {}", slope[voxel]);
            assert!(
                (intercept[voxel] - 5.0).abs() < TOL,
                "intercept {}",
                intercept[voxel]
            );
        }
    }

    #[test]
    fn two_blocks_fit_exactly() {
        // with two points the fit passes through both
        let matrix = array![[1.0], [2.0]];
        let (slope, intercept) = regress_voxels(&matrix);
        let x2 = 2.0_f64.ln();
        assert!((slope[0] * x2 + intercept[0] - 2.0).abs() < TOL);
        assert!((intercept[0] - 1.0).abs() < TOL); // ln(1) = 0
    }

    #[test]
    fn single_block_is_degenerate() {
        let matrix = array![[3.0, 7.0]];
        let (slope, _) = regress_voxels(&matrix);
        assert!(!slope[0].is_finite());
        assert!(!slope[1].is_finite());
    }

    #[test]
    fn correction_nan_iff_constant_intercepts() {
        // voxel 0: identical intercepts; voxel 1: varying
        let intercepts = array![[1.0, 1.0], [1.0, 2.0], [1.0, 3.0]];
        let slopes = array![[0.5, 0.5], [0.5, 1.0], [0.5, 1.5]];

        let c = compute_correction(&slopes, &intercepts);
        assert!(c[0].is_nan());
        assert!(c[1].is_finite());
        // voxel 1: b increases 0.5 per unit a
        assert!((c[1] - 0.5).abs() < TOL);
    }

    #[test]
    fn correction_zero_for_uncorrelated() {
        // slopes constant while intercepts vary: cov = 0
        let intercepts = array![[1.0], [2.0], [3.0]];
        let slopes = array![[4.0], [4.0], [4.0]];
        let c = compute_correction(&slopes, &intercepts);
        assert!(c[0].abs() < TOL);
    }
}
