//! Higher-Order Tensor Renormalization Group (HOTRG) for 2-D square lattices
//!
//! This crate coarse-grains a translation-invariant tensor network on the
//! square lattice, including:
//! - `SquareTensor`: rank-4 tensors with legs `u, d, l, r`
//! - `Direction`: the four merge directions and their axes
//! - `DirectionalTemplates`: environment and projector contractions per direction
//! - `Hotrg`: the engine (iterate, impurity replay, free-energy density)
//!
//! Truncated projectors come from [`hotrg_core::solve_environment`]; dense
//! linear algebra goes through a [`NumericBackend`], [`FaerBackend`] by
//! default.
//!
//! # Example
//!
//! ```
//! use hotrg::{Direction, Hotrg, HotrgOptions};
//!
//! // Every configuration has weight 1
//! let mut engine = Hotrg::from_array(vec![1.0_f64; 16], 2, HotrgOptions::new().with_chi(2)).unwrap();
//! let step = engine.iterate().unwrap();
//! assert_eq!(step.direction, Direction::Up);
//! assert_eq!(step.error, 0.0);
//! ```

pub mod direction;
pub mod engine;
pub mod error;
pub mod square;
pub mod templates;

pub use direction::{Axis, Direction};
pub use engine::{History, Hotrg, HotrgOptions, StepRecord, DEFAULT_CHI, IMPURITY_PARTS};
pub use error::{HotrgError, Result};
pub use square::{SquareTensor, SQUARE_LEGS};
pub use templates::DirectionalTemplates;

pub use hotrg_core::{
    default_eigen_threshold, set_default_eigen_threshold, DenseTensor, Matrix, SpectralProjection,
};
pub use hotrg_tensorbackend::{DenseScalar, FaerBackend, NumericBackend};
