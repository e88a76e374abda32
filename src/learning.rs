/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Sufficient statistics for one learning pass.
//!
//! A [`SampleAccumulator`] keeps, per component, the sample count, the running
//! vector sum and the running sum of outer products. Those three values fully
//! determine the refitted mean and covariance, so raw samples are never kept.
//!
//! The accumulator is write-only during a pass. It is consumed by
//! [`ColorMixture::end_learning`](crate::ColorMixture::end_learning) or
//! [`ColorMixture::end_learning_from`](crate::ColorMixture::end_learning_from).
//!
//! # Parallel passes
//!
//! `add_sample` on the same component is not synchronised. To assign pixels
//! on several threads, give each worker its own accumulator, then fold them
//! together with [`SampleAccumulator::merge`] and commit the result:
//!
//! ```rust,ignore
//! let mut total = SampleAccumulator::<5>::new();
//! for part in &per_worker {
//!     total.merge(part);
//! }
//! model.end_learning_from(&total)?;
//! ```

use crate::config::DEFAULT_COMPONENTS;
use crate::matrix::{accumulate_moments, Mat3, Vec3, ZERO_MAT3};

/// Per-component first and second moment sums for a learning pass.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleAccumulator<const K: usize = DEFAULT_COMPONENTS> {
    sums: [Vec3; K],
    prods: [Mat3; K],
    sample_counts: [usize; K],
    total_sample_count: usize,
}

impl<const K: usize> SampleAccumulator<K> {
    /// An empty accumulator.
    pub fn new() -> Self {
        Self {
            sums: [[0.0; 3]; K],
            prods: [ZERO_MAT3; K],
            sample_counts: [0; K],
            total_sample_count: 0,
        }
    }

    /// Zero every sum and count.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Add one colour to component `ci`.
    ///
    /// # Panics
    ///
    /// If `ci >= K`.
    pub fn add_sample(&mut self, ci: usize, color: Vec3) {
        accumulate_moments(&mut self.sums[ci], &mut self.prods[ci], &color);
        self.sample_counts[ci] += 1;
        self.total_sample_count += 1;
    }

    /// Fold another accumulator's statistics into this one.
    ///
    /// Sums are added component by component, so the result equals a single
    /// accumulator fed both sample streams (up to floating-point
    /// reassociation).
    pub fn merge(&mut self, other: &Self) {
        for ci in 0..K {
            for r in 0..3 {
                self.sums[ci][r] += other.sums[ci][r];
                for c in 0..3 {
                    self.prods[ci][r][c] += other.prods[ci][r][c];
                }
            }
            self.sample_counts[ci] += other.sample_counts[ci];
        }
        self.total_sample_count += other.total_sample_count;
    }

    /// Samples recorded for component `ci`.
    pub fn sample_count(&self, ci: usize) -> usize {
        self.sample_counts[ci]
    }

    /// Samples recorded across all components.
    pub fn total_sample_count(&self) -> usize {
        self.total_sample_count
    }

    /// `Σ x` over the samples of component `ci`.
    pub fn sum(&self, ci: usize) -> &Vec3 {
        &self.sums[ci]
    }

    /// `Σ x·xᵀ` over the samples of component `ci`.
    pub fn outer_product_sum(&self, ci: usize) -> &Mat3 {
        &self.prods[ci]
    }

    /// `true` when no samples have been recorded.
    pub fn is_empty(&self) -> bool {
        self.total_sample_count == 0
    }
}

impl<const K: usize> Default for SampleAccumulator<K> {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
