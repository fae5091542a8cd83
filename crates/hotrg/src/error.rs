//! Error types for HOTRG coarse-graining

use hotrg_core::{InvalidToleranceError, SpectralError, TensorError};
use thiserror::Error;

/// Result type for HOTRG operations
pub type Result<T> = std::result::Result<T, HotrgError>;

/// Errors that can occur during HOTRG coarse-graining
///
/// Every variant except the wrapped numeric errors is a contract violation
/// detected before any state is changed.
#[derive(Error, Debug)]
pub enum HotrgError {
    /// Direction symbol outside `u, d, l, r`
    #[error("Invalid direction {0:?}: expected one of u, d, l, r")]
    InvalidDirection(String),

    /// Initial tensor without elements
    #[error("Initial tensor is empty")]
    EmptyTensor,

    /// Initial tensor with zero norm
    #[error("Initial tensor has zero norm")]
    ZeroTensor,

    /// Initial tensor with NaN or infinite entries
    #[error("Initial tensor has non-finite norm {0}")]
    NonFiniteTensor(f64),

    /// Tensor that is not a rank-4 square-lattice tensor
    #[error("Invalid square tensor: {message}")]
    InvalidTensor {
        /// What is wrong with the tensor
        message: String,
    },

    /// Leg dimensions incompatible with the recorded state
    #[error("Dimension mismatch: expected {expected:?}, got {got:?}")]
    DimensionMismatch {
        /// Expected dimensions
        expected: Vec<usize>,
        /// Dimensions provided
        got: Vec<usize>,
    },

    /// Wrong number of impurity tensors
    #[error("Impurity iteration takes exactly {expected} tensors, got {got}")]
    ImpurityArity {
        /// Required number of tensors
        expected: usize,
        /// Number of tensors provided
        got: usize,
    },

    /// Step index not yet performed
    #[error("Step {step} out of range: only {iterations} iterations performed")]
    StepOutOfRange {
        /// Requested step
        step: usize,
        /// Number of iterations performed
        iterations: usize,
    },

    /// Archive index out of range
    #[error("Archive index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Archive length
        len: usize,
    },

    /// Degree of freedom no longer fits in `u64`
    #[error("Degree of freedom overflows after {0}")]
    DegreeOfFreedomOverflow(u64),

    /// Invalid engine options
    #[error("Invalid options: {message}")]
    InvalidOptions {
        /// Description of the problem
        message: String,
    },

    /// Invalid eigenvalue threshold
    #[error(transparent)]
    InvalidTolerance(#[from] InvalidToleranceError),

    /// Tensor construction or contraction failure
    #[error("Tensor error: {0}")]
    Tensor(#[from] TensorError),

    /// Spectral truncation failure, including backend errors
    #[error("Spectral truncation failed: {0}")]
    Spectral(#[from] SpectralError),
}
