//! Mixture size constants and learning configuration.

/// Number of Gaussian components in the reference colour model.
pub const DEFAULT_COMPONENTS: usize = 5;

/// Flat parameters per component: 1 weight + 3 mean + 9 covariance.
pub const PARAMS_PER_COMPONENT: usize = 13;

/// Determinant at or below which a covariance is treated as singular.
pub const DETERMINANT_FLOOR: f64 = 1e-6;

/// Diagonal ridge added to a singular covariance at the end of a learning pass.
pub const SINGULAR_FIX: f64 = 0.01;

/// Length of the flat parameter buffer for a `K`-component mixture.
pub const fn params_len(components: usize) -> usize {
    components * PARAMS_PER_COMPONENT
}

/// Numerical knobs used while refitting the mixture.
///
/// The defaults reproduce the classic GrabCut colour model. Tests with
/// synthetic data occasionally want a different ridge magnitude.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LearningConfig {
    /// Value added to each covariance diagonal entry when `end_learning`
    /// finds a determinant at or below `determinant_floor`. Default: 0.01.
    pub singular_fix: f64,

    /// Singularity threshold on the covariance determinant. Default: 1e-6.
    pub determinant_floor: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            singular_fix: SINGULAR_FIX,
            determinant_floor: DETERMINANT_FLOOR,
        }
    }
}
