//! Error type shared by every fallible mixture operation.
//!
//! All three variants are contract violations by the caller (or, for
//! [`MixtureError::SingularCovariance`], a pathological fit). None of them is
//! expected in a correctly driven refinement loop, and none is retryable: the
//! operations are deterministic, so calling again with the same state yields
//! the same error.

use core::fmt;

/// Errors raised by [`ColorMixture`](crate::ColorMixture) and
/// [`SampleAccumulator`](crate::SampleAccumulator) consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum MixtureError {
    /// A flat parameter buffer did not have exactly `K * 13` elements.
    InvalidArgument {
        /// Required buffer length (`K * PARAMS_PER_COMPONENT`).
        expected: usize,
        /// Length actually supplied.
        got: usize,
    },

    /// `end_learning` was called with no samples recorded for any component.
    EmptyPass,

    /// A covariance determinant stayed at or below machine epsilon even after
    /// the singularity fix was applied.
    SingularCovariance {
        /// Index of the offending component.
        component: usize,
        /// Determinant after regularisation.
        determinant: f64,
    },
}

impl fmt::Display for MixtureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { expected, got } => write!(
                f,
                "parameter buffer must hold exactly {} f64 values (13 per component), got {}",
                expected, got
            ),
            Self::EmptyPass => write!(f, "end_learning called with zero samples in the pass"),
            Self::SingularCovariance {
                component,
                determinant,
            } => write!(
                f,
                "covariance of component {} is singular (determinant {:e})",
                component, determinant
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MixtureError {}
