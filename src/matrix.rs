/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Fixed-size 3×3 linear algebra for the colour model.
//!
//! Everything here is written out by cofactors rather than looped so that the
//! floating-point evaluation order is fixed. Fitted parameters and densities are
//! compared bit-for-bit against stored models, and a different summation order
//! would change the last ulp.
//!
//! Matrices are row-major: `m[r][c]`.

/// A colour sample or mean: three real channels.
pub type Vec3 = [f64; 3];

/// A 3×3 matrix, row-major.
pub type Mat3 = [[f64; 3]; 3];

/// The all-zero matrix.
pub const ZERO_MAT3: Mat3 = [[0.0; 3]; 3];

/// Determinant by cofactor expansion along the first row.
#[inline]
pub fn determinant(c: &Mat3) -> f64 {
    c[0][0] * (c[1][1] * c[2][2] - c[1][2] * c[2][1])
        - c[0][1] * (c[1][0] * c[2][2] - c[1][2] * c[2][0])
        + c[0][2] * (c[1][0] * c[2][1] - c[1][1] * c[2][0])
}

/// Inverse via the adjugate, given a precomputed non-zero determinant.
///
/// The caller owns the singularity check; this function divides blindly.
pub fn inverse_with_determinant(c: &Mat3, det: f64) -> Mat3 {
    let inv_det = 1.0 / det;
    let mut inv = ZERO_MAT3;
    inv[0][0] = (c[1][1] * c[2][2] - c[1][2] * c[2][1]) * inv_det;
    inv[1][0] = -(c[1][0] * c[2][2] - c[1][2] * c[2][0]) * inv_det;
    inv[2][0] = (c[1][0] * c[2][1] - c[1][1] * c[2][0]) * inv_det;
    inv[0][1] = -(c[0][1] * c[2][2] - c[0][2] * c[2][1]) * inv_det;
    inv[1][1] = (c[0][0] * c[2][2] - c[0][2] * c[2][0]) * inv_det;
    inv[2][1] = -(c[0][0] * c[2][1] - c[0][1] * c[2][0]) * inv_det;
    inv[0][2] = (c[0][1] * c[1][2] - c[0][2] * c[1][1]) * inv_det;
    inv[1][2] = -(c[0][0] * c[1][2] - c[0][2] * c[1][0]) * inv_det;
    inv[2][2] = (c[0][0] * c[1][1] - c[0][1] * c[1][0]) * inv_det;
    inv
}

/// Mahalanobis quadratic form `dᵀ · A · d`.
///
/// Accumulated column by column of `A`, which matters only for non-symmetric
/// inverses produced from a rounding-asymmetric covariance.
#[inline]
pub fn quadratic_form(d: &Vec3, a: &Mat3) -> f64 {
    d[0] * (d[0] * a[0][0] + d[1] * a[1][0] + d[2] * a[2][0])
        + d[1] * (d[0] * a[0][1] + d[1] * a[1][1] + d[2] * a[2][1])
        + d[2] * (d[0] * a[0][2] + d[1] * a[1][2] + d[2] * a[2][2])
}

/// Adds `s` to each diagonal entry in place.
#[inline]
pub fn add_to_diagonal(m: &mut Mat3, s: f64) {
    m[0][0] += s;
    m[1][1] += s;
    m[2][2] += s;
}

/// Element-wise difference `a - b`.
#[inline]
pub fn sub(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Accumulates `x` into `acc` and the full outer product `x·xᵀ` into `prod`.
///
/// All nine products are formed independently (no symmetry shortcut).
#[inline]
pub fn accumulate_moments(acc: &mut Vec3, prod: &mut Mat3, x: &Vec3) {
    for r in 0..3 {
        acc[r] += x[r];
        for c in 0..3 {
            prod[r][c] += x[r] * x[c];
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
