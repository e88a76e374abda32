//! Portable snapshot of a fitted [`ColorMixture`] for persistence and transport.
//!
//! The flat `f64` buffer ([`ColorMixture::write_params`]) is the compact
//! in-process form. A [`MixtureSnapshot`] is the self-describing one: a format
//! version plus one record per component, suitable for JSON or any other serde
//! format. The derived cache is never stored; [`MixtureSnapshot::to_mixture`]
//! rebuilds it.
//!
//! # no_std
//!
//! This module requires the `serde` feature. It uses `alloc::vec::Vec` and is
//! compatible with no_std + alloc environments.

extern crate alloc;

use alloc::vec::Vec;

use crate::config::{LearningConfig, PARAMS_PER_COMPONENT};
use crate::error::MixtureError;
use crate::matrix::{Mat3, Vec3};
use crate::model::ColorMixture;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u16 = 1;

/// A serialisable snapshot of a [`ColorMixture`].
///
/// # Example
///
/// ```rust,ignore
/// use colormix_core::snapshot::MixtureSnapshot;
///
/// let snapshot = MixtureSnapshot::from_mixture(&model);
/// let json = serde_json::to_string(&snapshot).unwrap();
/// let restored: MixtureSnapshot = serde_json::from_str(&json).unwrap();
/// let model: ColorMixture = restored.to_mixture()?;
/// ```
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct MixtureSnapshot {
    /// Format version, [`SNAPSHOT_VERSION`] for newly created snapshots.
    pub version: u16,
    /// Learning knobs the model was fitted with.
    pub config: LearningConfig,
    /// One record per component, in index order.
    pub components: Vec<ComponentRecord>,
}

/// Persisted parameters of one mixture component.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct ComponentRecord {
    /// Mixing coefficient; 0 marks an inactive component.
    pub weight: f64,
    /// Mean colour.
    pub mean: Vec3,
    /// Covariance, row-major, including any applied singularity fix.
    pub covariance: Mat3,
}

impl MixtureSnapshot {
    /// Capture the persisted parameters of `model`.
    pub fn from_mixture<const K: usize>(model: &ColorMixture<K>) -> Self {
        let components = (0..K)
            .map(|ci| ComponentRecord {
                weight: model.weight(ci),
                mean: model.mean(ci),
                covariance: model.covariance(ci),
            })
            .collect();

        Self {
            version: SNAPSHOT_VERSION,
            config: *model.config(),
            components,
        }
    }

    /// Number of component records.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Flatten into the `[weights][means][covariances]` parameter layout.
    pub fn to_params(&self) -> Vec<f64> {
        let n = self.components.len();
        let mut out = Vec::with_capacity(n * PARAMS_PER_COMPONENT);
        out.extend(self.components.iter().map(|c| c.weight));
        for c in &self.components {
            out.extend_from_slice(&c.mean);
        }
        for c in &self.components {
            for row in &c.covariance {
                out.extend_from_slice(row);
            }
        }
        out
    }

    /// Rebuild a live model, recomputing the inverse covariance cache.
    ///
    /// # Errors
    ///
    /// - [`MixtureError::InvalidArgument`] if the snapshot does not hold
    ///   exactly `K` components.
    /// - [`MixtureError::SingularCovariance`] if an active component's
    ///   covariance is singular.
    pub fn to_mixture<const K: usize>(&self) -> Result<ColorMixture<K>, MixtureError> {
        ColorMixture::from_params_with_config(&self.to_params(), self.config)
    }
}
