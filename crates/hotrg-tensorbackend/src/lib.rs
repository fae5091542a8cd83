//! Dense storage helpers and linear algebra backend for HOTRG.
//!
//! This crate provides:
//! - [`DenseScalar`]: scalar bound shared by every dense buffer (`f64`, `Complex64`)
//! - [`DenseStorage`]: mdarray-backed dense buffer with permute and GEMM contraction
//! - An ID-based [`einsum`](einsum::einsum) ordered by omeco's greedy optimizer
//! - The [`NumericBackend`] trait with the default [`FaerBackend`]
//!
//! The `mdarray-linalg` dependency is kept internal to isolate API changes.

pub mod backend;
pub mod einsum;
pub mod storage;

pub use backend::{EighResult, FaerBackend, NumericBackend, SvdResult};
pub use einsum::{einsum, EinsumOperand};
pub use storage::{frobenius_norm, gemm, DenseScalar, DenseStorage};

// Re-export underlying crates for downstream use
pub use faer_traits;
pub use mdarray;
pub use num_complex;
