//! Labeled dense tensors and the linear-algebra primitives used by HOTRG.
//!
//! This crate provides:
//! - [`DenseTensor`]: dense tensors whose legs are addressed by label
//! - [`ContractionPlan`]: fixed wiring templates contracted through einsum
//! - [`solve_environment`]: truncated eigen-projectors of environment matrices
//! - [`factorize`]: truncated SVD into isometries and a diagonal core
//! - [`TruncationParams`] and the process-wide eigenvalue threshold
//!
//! Numerics are delegated to a [`NumericBackend`](hotrg_tensorbackend::NumericBackend),
//! passed explicitly to every operation that needs one.

pub mod factorize;
pub mod global_default;
pub mod matrix;
pub mod network;
pub mod spectral;
pub mod tensor;
pub mod truncation;

pub use factorize::{
    factorize, is_isometry, FactorizeError, FactorizeOptions, FactorizeResult,
    DEFAULT_FACTORIZE_RANK,
};
pub use global_default::{validate_tolerance, GlobalDefault, InvalidToleranceError};
pub use matrix::Matrix;
pub use network::{ContractionPlan, ContractionPlanBuilder};
pub use spectral::{solve_environment, SpectralError, SpectralProjection};
pub use tensor::{DenseTensor, TensorError};
pub use truncation::{
    default_eigen_threshold, set_default_eigen_threshold, HasTruncationParams, TruncationParams,
};

pub use hotrg_tensorbackend::{DenseScalar, FaerBackend, NumericBackend};
