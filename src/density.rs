/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Read-only density queries on a fitted [`ColorMixture`].
//!
//! The per-component density is the multivariate normal kernel scaled by
//! `1 / sqrt(det Σ)` only. The `(2π)^{-3/2}` constant is omitted: callers
//! compare and rank densities (or take log ratios between two models of the
//! same shape), and stored energies depend on this exact scaling.

use crate::matrix::{quadratic_form, sub, Vec3};
use crate::model::ColorMixture;

impl<const K: usize> ColorMixture<K> {
    /// Density of component `ci` at `color`; 0 for an inactive component.
    ///
    /// ```text
    /// p_i(x) = exp(-½ (x-μ)ᵀ Σ⁻¹ (x-μ)) / sqrt(det Σ)
    /// ```
    ///
    /// # Panics
    ///
    /// If `ci >= K`, or if an active component's cached determinant is not
    /// above `f64::EPSILON`. The constructors and `end_learning` never leave
    /// the model in that state.
    pub fn component_density(&self, ci: usize, color: Vec3) -> f64 {
        if !(self.weights[ci] > 0.0) {
            return 0.0;
        }
        let det = self.cov_determs[ci];
        assert!(
            det > f64::EPSILON,
            "component {} queried with unfitted covariance (det={})",
            ci,
            det
        );
        let diff = sub(&color, &self.means[ci]);
        let mult = quadratic_form(&diff, &self.inverse_covs[ci]);
        1.0 / libm::sqrt(det) * libm::exp(-0.5 * mult)
    }

    /// Mixture density `Σ wᵢ · pᵢ(color)`.
    pub fn density(&self, color: Vec3) -> f64 {
        let mut res = 0.0;
        for ci in 0..K {
            res += self.weights[ci] * self.component_density(ci, color);
        }
        res
    }

    /// Index of the component with the highest density at `color`.
    ///
    /// Scans from a running maximum of 0 and only moves on a strictly larger
    /// density, so ties keep the lower index and an all-zero scan returns 0.
    pub fn which_component(&self, color: Vec3) -> usize {
        let mut k = 0;
        let mut max = 0.0;
        for ci in 0..K {
            let p = self.component_density(ci, color);
            if p > max {
                k = ci;
                max = p;
            }
        }
        k
    }

    /// Posterior responsibility of each component for `color`:
    /// `wᵢ·pᵢ / Σⱼ wⱼ·pⱼ`.
    ///
    /// Returns all zeros when the mixture density at `color` is zero (no
    /// active component, or `color` underflows every kernel).
    pub fn responsibilities(&self, color: Vec3) -> [f64; K] {
        let mut out = [0.0; K];
        let mut total = 0.0;
        for (ci, r) in out.iter_mut().enumerate() {
            *r = self.weights[ci] * self.component_density(ci, color);
            total += *r;
        }
        if total > 0.0 {
            for r in out.iter_mut() {
                *r /= total;
            }
        }
        out
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
