//! # colormix-core
//!
//! Fixed-size Gaussian mixture colour models for iterative foreground/background
//! segmentation (GrabCut-style).
//!
//! ---
//!
//! ## What it does
//!
//! A [`ColorMixture`] models the colour distribution of one region (say, the
//! foreground) as `K` Gaussians over 3-channel colours. An outer segmentation
//! loop, which lives outside this crate, drives it EM-style:
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────┐
//!   │  which_component(x)  →  add_sample(k, x)  →  end_learning │
//!   │          ↑                                        │      │
//!   │          └────────── density(x) / energies ←──────┘      │
//!   └──────────────────────────────────────────────────────────┘
//! ```
//!
//! 1. assign each pixel to its most likely component,
//! 2. feed `(component, colour)` pairs to the learning pass,
//! 3. commit: weights, means and covariances are refitted from sufficient
//!    statistics and the inverse-covariance cache is rebuilt,
//! 4. re-evaluate densities for the next energy minimisation.
//!
//! ## Module overview
//!
//! | Module | Key types | What it does |
//! |--------|-----------|--------------|
//! | [`model`] | [`ColorMixture`] | Parameters, cache, flat-buffer persistence, learning pass |
//! | [`density`] | — | `component_density`, `density`, `which_component`, `responsibilities` |
//! | [`learning`] | [`SampleAccumulator`] | Mergeable per-component moment sums |
//! | [`matrix`] | [`Vec3`], [`Mat3`] | Cofactor determinant, adjugate inverse, quadratic form |
//! | [`config`] | [`LearningConfig`] | Component count, layout and regularisation constants |
//! | [`error`] | [`MixtureError`] | Contract violations |
//! | [`snapshot`] | [`snapshot::MixtureSnapshot`] | Serialisable model snapshot (requires `serde` feature) |
//!
//! ## Numerics
//!
//! - Densities omit the `(2π)^{-3/2}` constant; only `1/sqrt(det Σ)` scales
//!   the kernel. Energies computed from these values stay comparable with
//!   previously stored models.
//! - A component that received identical samples has a zero covariance. At the
//!   end of a pass, any covariance with `det ≤ 1e-6` gets `0.01` added to its
//!   diagonal before inversion.
//!
//! ## `no_std`
//!
//! This crate is `#![no_std]` by default with no heap required. `sqrt`/`exp`
//! come from `libm`. Enable the `std` feature for `Vec`-returning helpers and
//! `std::error::Error`. Enable `serde` for [`snapshot`] and `python-ffi` for the
//! PyO3 bindings.
//!
//! ## License
//!
//! Business Source License 1.1. Free for evaluation and non-production use.

#![cfg_attr(not(any(feature = "std", feature = "python-ffi")), no_std)]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Pull in std when the feature is enabled (for Vec helpers, etc.)
#[cfg(any(feature = "std", feature = "python-ffi"))]
extern crate std;

pub mod config;
pub mod density;
pub mod error;
pub mod learning;
pub mod matrix;
pub mod model;
#[cfg(feature = "serde")]
pub mod snapshot;

#[cfg(feature = "python-ffi")]
pub mod ffi;

pub use config::{LearningConfig, DEFAULT_COMPONENTS, PARAMS_PER_COMPONENT};
pub use error::MixtureError;
pub use learning::SampleAccumulator;
pub use matrix::{Mat3, Vec3};
pub use model::ColorMixture;
