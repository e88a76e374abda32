/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! The mixture model: persisted parameters plus their derived inverse cache.
//!
//! # Parameter layout
//!
//! Externally a `K`-component model is one flat `f64` buffer of `K * 13` values:
//!
//! ```text
//!   [0 .. K)        weights
//!   [K .. 4K)       means, 3 per component
//!   [4K .. 13K)     covariances, 9 per component, row-major
//! ```
//!
//! Internally the three blocks are owned arrays. The flat form exists only at
//! the persistence boundary ([`ColorMixture::from_params`] /
//! [`ColorMixture::write_params`]).
//!
//! # Invariants
//!
//! - Every component with `weight > 0` has a cached determinant strictly above
//!   `f64::EPSILON` and the matching inverse covariance.
//! - Components with `weight == 0` are inactive; their cache is never read.
//! - `end_learning` either commits a complete refit or leaves the model untouched.

use crate::config::{params_len, LearningConfig, DEFAULT_COMPONENTS};
use crate::error::MixtureError;
use crate::learning::SampleAccumulator;
use crate::matrix::{add_to_diagonal, determinant, inverse_with_determinant, Mat3, Vec3, ZERO_MAT3};

// ─── Covariance factorisation ──────────────────────────────────────────────

/// Determinant and inverse of `cov`, regularising it in place when it is
/// singular and `singular_fix > 0`.
fn factorize(
    component: usize,
    cov: &mut Mat3,
    singular_fix: f64,
    determinant_floor: f64,
) -> Result<(f64, Mat3), MixtureError> {
    let mut det = determinant(cov);
    if det <= determinant_floor && singular_fix > 0.0 {
        // white noise on the diagonal
        add_to_diagonal(cov, singular_fix);
        let fixed = determinant(cov);
        log::debug!(
            "component {}: regularised covariance (det {:e} -> {:e}, fix {})",
            component,
            det,
            fixed,
            singular_fix
        );
        det = fixed;
    }

    // NaN fails this comparison as well.
    if !(det > f64::EPSILON) {
        return Err(MixtureError::SingularCovariance {
            component,
            determinant: det,
        });
    }
    Ok((det, inverse_with_determinant(cov, det)))
}

// ─── ColorMixture ──────────────────────────────────────────────────────────

/// A fixed-size Gaussian mixture over 3-channel colours.
///
/// `K` is the component count, [`DEFAULT_COMPONENTS`] (5) unless stated.
/// The model owns its accumulator for the learning pass; see
/// [`ColorMixture::init_learning`], [`ColorMixture::add_sample`] and
/// [`ColorMixture::end_learning`].
///
/// Readers (`density`, `component_density`, `which_component`) take `&self`
/// and may run concurrently. Refits take `&mut self`, so the borrow checker
/// provides the reader/writer exclusion around the fit boundary.
#[derive(Clone, Debug)]
pub struct ColorMixture<const K: usize = DEFAULT_COMPONENTS> {
    pub(crate) weights: [f64; K],
    pub(crate) means: [Vec3; K],
    pub(crate) covs: [Mat3; K],
    pub(crate) inverse_covs: [Mat3; K],
    pub(crate) cov_determs: [f64; K],
    pub(crate) learning: SampleAccumulator<K>,
    config: LearningConfig,
}

impl<const K: usize> ColorMixture<K> {
    /// Length of the flat parameter buffer for this mixture size.
    pub const PARAMS_LEN: usize = params_len(K);

    /// Construct a zero-initialised model: every component inactive.
    pub fn new() -> Self {
        Self::with_config(LearningConfig::default())
    }

    /// Construct a zero-initialised model with custom learning knobs.
    pub fn with_config(config: LearningConfig) -> Self {
        Self {
            weights: [0.0; K],
            means: [[0.0; 3]; K],
            covs: [ZERO_MAT3; K],
            inverse_covs: [ZERO_MAT3; K],
            cov_determs: [0.0; K],
            learning: SampleAccumulator::new(),
            config,
        }
    }

    /// Load a previously fitted model from a flat parameter buffer.
    ///
    /// An empty slice yields a fresh zero-initialised model, as [`new`](Self::new).
    /// The cache of every active component is rebuilt with no singularity fix;
    /// the stored covariances are assumed to be well conditioned already.
    ///
    /// # Errors
    ///
    /// - [`MixtureError::InvalidArgument`] if `params` is non-empty and
    ///   `params.len() != K * 13`.
    /// - [`MixtureError::SingularCovariance`] if an active component's stored
    ///   covariance has determinant ≤ `f64::EPSILON`.
    pub fn from_params(params: &[f64]) -> Result<Self, MixtureError> {
        Self::from_params_with_config(params, LearningConfig::default())
    }

    /// [`from_params`](Self::from_params) with custom learning knobs.
    pub fn from_params_with_config(
        params: &[f64],
        config: LearningConfig,
    ) -> Result<Self, MixtureError> {
        let mut model = Self::with_config(config);
        if params.is_empty() {
            return Ok(model);
        }
        check_len::<K>(params.len())?;

        let (weights, rest) = params.split_at(K);
        let (means, covs) = rest.split_at(3 * K);

        model.weights.copy_from_slice(weights);
        for ci in 0..K {
            model.means[ci].copy_from_slice(&means[3 * ci..3 * ci + 3]);
            let c = &covs[9 * ci..9 * ci + 9];
            for r in 0..3 {
                model.covs[ci][r].copy_from_slice(&c[3 * r..3 * r + 3]);
            }
        }

        for ci in 0..K {
            if model.weights[ci] > 0.0 {
                model.recompute_cache(ci, 0.0)?;
            }
        }
        Ok(model)
    }

    /// Write the model into a flat buffer using the layout documented above.
    ///
    /// # Errors
    ///
    /// [`MixtureError::InvalidArgument`] if `out.len() != K * 13`.
    pub fn write_params(&self, out: &mut [f64]) -> Result<(), MixtureError> {
        check_len::<K>(out.len())?;
        self.write_blocks(out);
        Ok(())
    }

    /// Writes the three parameter blocks; `out` must be `PARAMS_LEN` long.
    fn write_blocks(&self, out: &mut [f64]) {
        let (weights, rest) = out.split_at_mut(K);
        let (means, covs) = rest.split_at_mut(3 * K);

        weights.copy_from_slice(&self.weights);
        for ci in 0..K {
            means[3 * ci..3 * ci + 3].copy_from_slice(&self.means[ci]);
            for r in 0..3 {
                let at = 9 * ci + 3 * r;
                covs[at..at + 3].copy_from_slice(&self.covs[ci][r]);
            }
        }
    }

    /// The model as a freshly allocated flat parameter buffer.
    #[cfg(feature = "std")]
    pub fn to_params(&self) -> std::vec::Vec<f64> {
        let mut out = std::vec![0.0; Self::PARAMS_LEN];
        self.write_blocks(&mut out);
        out
    }

    /// Recompute the inverse covariance and determinant of component `ci`.
    ///
    /// Does nothing for an inactive component. When the determinant is at or
    /// below the configured floor and `singular_fix > 0`, `singular_fix` is
    /// first added to the covariance diagonal and the regularised covariance
    /// is stored.
    ///
    /// # Errors
    ///
    /// [`MixtureError::SingularCovariance`] if the determinant is still
    /// ≤ `f64::EPSILON`. Covariance and cache of `ci` are both left as they were.
    ///
    /// # Panics
    ///
    /// If `ci >= K`.
    pub fn recompute_cache(&mut self, ci: usize, singular_fix: f64) -> Result<(), MixtureError> {
        if self.weights[ci] > 0.0 {
            let mut cov = self.covs[ci];
            let (det, inv) = factorize(ci, &mut cov, singular_fix, self.config.determinant_floor)?;
            self.covs[ci] = cov;
            self.cov_determs[ci] = det;
            self.inverse_covs[ci] = inv;
        }
        Ok(())
    }

    // ── Learning pass ──────────────────────────────────────────────────────

    /// Start a learning pass: clear all accumulated statistics.
    ///
    /// Safe to call repeatedly; a second call discards a partial pass.
    pub fn init_learning(&mut self) {
        self.learning.reset();
    }

    /// Record that `color` belongs to component `ci` in the current pass.
    ///
    /// The component's density cache is stale from this point until
    /// [`end_learning`](Self::end_learning) commits.
    ///
    /// # Panics
    ///
    /// If `ci >= K`.
    pub fn add_sample(&mut self, ci: usize, color: Vec3) {
        self.learning.add_sample(ci, color);
    }

    /// Finish the pass: refit weights, means and covariances from the
    /// accumulated statistics and rebuild the cache.
    ///
    /// Components that received no samples become inactive (weight 0). The
    /// accumulator is cleared on success and kept on failure.
    ///
    /// # Errors
    ///
    /// See [`end_learning_from`](Self::end_learning_from).
    pub fn end_learning(&mut self) -> Result<(), MixtureError> {
        let pass = core::mem::replace(&mut self.learning, SampleAccumulator::new());
        match self.end_learning_from(&pass) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.learning = pass;
                Err(e)
            }
        }
    }

    /// Refit the model from an externally built accumulator.
    ///
    /// Used when samples were gathered in several accumulators (one per
    /// worker) and combined with [`SampleAccumulator::merge`]. The model's own
    /// accumulator is not touched.
    ///
    /// # Errors
    ///
    /// - [`MixtureError::EmptyPass`] if `pass` holds no samples at all.
    /// - [`MixtureError::SingularCovariance`] if a refitted covariance stays
    ///   singular after adding `config.singular_fix` to its diagonal.
    ///
    /// On error the model is unchanged.
    pub fn end_learning_from(&mut self, pass: &SampleAccumulator<K>) -> Result<(), MixtureError> {
        let total = pass.total_sample_count();
        if total == 0 {
            log::warn!("end_learning: pass holds no samples; model left unchanged");
            return Err(MixtureError::EmptyPass);
        }

        let mut weights = self.weights;
        let mut means = self.means;
        let mut covs = self.covs;
        let mut inverse_covs = self.inverse_covs;
        let mut cov_determs = self.cov_determs;

        for ci in 0..K {
            let n = pass.sample_count(ci);
            if n == 0 {
                if weights[ci] > 0.0 {
                    log::debug!("component {}: no samples, deactivated", ci);
                }
                weights[ci] = 0.0;
                continue;
            }

            let inv_n = 1.0 / n as f64;
            weights[ci] = n as f64 / total as f64;

            let sum = pass.sum(ci);
            let m = [sum[0] * inv_n, sum[1] * inv_n, sum[2] * inv_n];

            let prod = pass.outer_product_sum(ci);
            let c = &mut covs[ci];
            for r in 0..3 {
                for col in 0..3 {
                    c[r][col] = prod[r][col] * inv_n - m[r] * m[col];
                }
            }
            means[ci] = m;

            let (det, inv) = factorize(
                ci,
                c,
                self.config.singular_fix,
                self.config.determinant_floor,
            )?;
            cov_determs[ci] = det;
            inverse_covs[ci] = inv;
        }

        self.weights = weights;
        self.means = means;
        self.covs = covs;
        self.inverse_covs = inverse_covs;
        self.cov_determs = cov_determs;

        log::trace!(
            "end_learning: {} samples over {} active components",
            total,
            self.active_components().len()
        );
        Ok(())
    }

    /// Run a whole learning pass over `(component, colour)` pairs.
    ///
    /// Equivalent to `init_learning`, `add_sample` for each pair, then
    /// `end_learning`.
    pub fn learn<I>(&mut self, samples: I) -> Result<(), MixtureError>
    where
        I: IntoIterator<Item = (usize, Vec3)>,
    {
        self.init_learning();
        for (ci, color) in samples {
            self.add_sample(ci, color);
        }
        self.end_learning()
    }

    /// Statistics of the pass in progress.
    pub fn learning(&self) -> &SampleAccumulator<K> {
        &self.learning
    }

    // ── Read accessors ─────────────────────────────────────────────────────

    /// Mixing coefficient of component `ci`.
    pub fn weight(&self, ci: usize) -> f64 {
        self.weights[ci]
    }

    /// All mixing coefficients.
    pub fn weights(&self) -> &[f64; K] {
        &self.weights
    }

    /// Mean colour of component `ci`.
    pub fn mean(&self, ci: usize) -> Vec3 {
        self.means[ci]
    }

    /// Covariance of component `ci`, including any applied singularity fix.
    pub fn covariance(&self, ci: usize) -> Mat3 {
        self.covs[ci]
    }

    /// Cached inverse covariance of component `ci`. Meaningless when inactive.
    pub fn inverse_covariance(&self, ci: usize) -> Mat3 {
        self.inverse_covs[ci]
    }

    /// Cached covariance determinant of component `ci`. Meaningless when inactive.
    pub fn determinant(&self, ci: usize) -> f64 {
        self.cov_determs[ci]
    }

    /// `true` if component `ci` has positive weight.
    pub fn is_active(&self, ci: usize) -> bool {
        self.weights[ci] > 0.0
    }

    /// Indices of all active components, ascending.
    pub fn active_components(&self) -> heapless::Vec<usize, K> {
        let mut out = heapless::Vec::new();
        for ci in (0..K).filter(|&ci| self.is_active(ci)) {
            // capacity is K
            let _ = out.push(ci);
        }
        out
    }

    /// Learning configuration in use.
    pub fn config(&self) -> &LearningConfig {
        &self.config
    }
}

impl<const K: usize> Default for ColorMixture<K> {
    fn default() -> Self {
        Self::new()
    }
}

fn check_len<const K: usize>(got: usize) -> Result<(), MixtureError> {
    let expected = params_len(K);
    if got != expected {
        return Err(MixtureError::InvalidArgument { expected, got });
    }
    Ok(())
}

// ─── Tests ──────────────────────────────────────────────────────────────────
