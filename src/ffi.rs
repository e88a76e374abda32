//! Python FFI bindings via PyO3.
//!
//! Exposes the default 5-component colour model to Python. Colours are
//! 3-element sequences of floats; parameter buffers are flat lists of 65 floats.
//! For other mixture sizes, use the Rust API directly.
//!
//! # Building the Python extension
//!
//! ```bash
//! pip install maturin
//! maturin develop --features python-ffi
//! ```
//!
//! # Usage
//!
//! ```python
//! from colormix_core import ColorMixture
//!
//! fg = ColorMixture()
//! fg.init_learning()
//! for ci, color in assignments:
//!     fg.add_sample(ci, color)
//! fg.end_learning()
//!
//! p = fg.density([120.0, 80.0, 30.0])
//! k = fg.which_component([120.0, 80.0, 30.0])
//! saved = fg.params()               # 65 floats
//! restored = ColorMixture(saved)
//! ```

#![allow(non_snake_case)]

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::config::DEFAULT_COMPONENTS;
use crate::error::MixtureError;
use crate::model::ColorMixture;

fn to_py_err(e: MixtureError) -> PyErr {
    match e {
        MixtureError::InvalidArgument { .. } => PyValueError::new_err(e.to_string()),
        MixtureError::EmptyPass | MixtureError::SingularCovariance { .. } => {
            PyRuntimeError::new_err(e.to_string())
        }
    }
}

fn check_component(ci: usize) -> PyResult<()> {
    if ci >= DEFAULT_COMPONENTS {
        return Err(PyValueError::new_err(format!(
            "component index must be < {DEFAULT_COMPONENTS}, got {ci}"
        )));
    }
    Ok(())
}

// ── ColorMixture ──────────────────────────────────────────────────────────────

/// Five-component Gaussian mixture over 3-channel colours.
///
/// Example::
///
///     gmm = ColorMixture()
///     gmm.init_learning()
///     gmm.add_sample(2, [100.0, 100.0, 100.0])
///     gmm.end_learning()
///     print(gmm.weights())   # [0.0, 0.0, 1.0, 0.0, 0.0]
#[pyclass(name = "ColorMixture")]
#[derive(Clone)]
pub struct PyColorMixture {
    inner: ColorMixture<DEFAULT_COMPONENTS>,
}

#[pymethods]
impl PyColorMixture {
    /// Create a mixture, zero-initialised or loaded from a flat buffer.
    ///
    /// Args:
    ///     params: optional list of 65 floats (weights, means, covariances)
    ///
    /// Raises:
    ///     ValueError: if params has the wrong length
    ///     RuntimeError: if an active component has a singular covariance
    #[new]
    #[pyo3(signature = (params=None))]
    pub fn new(params: Option<Vec<f64>>) -> PyResult<Self> {
        let inner = ColorMixture::from_params(&params.unwrap_or_default()).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Clear the statistics of the current learning pass.
    pub fn init_learning(&mut self) {
        self.inner.init_learning();
    }

    /// Assign a colour to component `ci` for the current pass.
    pub fn add_sample(&mut self, ci: usize, color: [f64; 3]) -> PyResult<()> {
        check_component(ci)?;
        self.inner.add_sample(ci, color);
        Ok(())
    }

    /// Refit the mixture from the pass statistics.
    ///
    /// Raises:
    ///     RuntimeError: if the pass is empty or a covariance stays singular
    pub fn end_learning(&mut self) -> PyResult<()> {
        self.inner.end_learning().map_err(to_py_err)
    }

    /// Mixture density at `color`.
    pub fn density(&self, color: [f64; 3]) -> f64 {
        self.inner.density(color)
    }

    /// Density of component `ci` at `color` (0.0 if the component is inactive).
    pub fn component_density(&self, ci: usize, color: [f64; 3]) -> PyResult<f64> {
        check_component(ci)?;
        Ok(self.inner.component_density(ci, color))
    }

    /// Index of the most likely component for `color`.
    pub fn which_component(&self, color: [f64; 3]) -> usize {
        self.inner.which_component(color)
    }

    /// Posterior responsibility of each component for `color`.
    pub fn responsibilities(&self, color: [f64; 3]) -> Vec<f64> {
        self.inner.responsibilities(color).to_vec()
    }

    /// Mixing coefficients.
    pub fn weights(&self) -> Vec<f64> {
        self.inner.weights().to_vec()
    }

    /// The model as a flat list of 65 floats.
    pub fn params(&self) -> Vec<f64> {
        self.inner.to_params()
    }

    /// Python repr string.
    pub fn __repr__(&self) -> String {
        format!(
            "ColorMixture(active={:?})",
            self.inner.active_components().as_slice()
        )
    }
}

// ── Module entry point ────────────────────────────────────────────────────────

/// Gaussian mixture colour models for interactive segmentation.
#[pymodule]
pub fn colormix_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyColorMixture>()?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add("COMPONENTS", DEFAULT_COMPONENTS)?;
    Ok(())
}
