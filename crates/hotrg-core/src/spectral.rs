//! Truncated eigen-projectors of Hermitian environment matrices.
//!
//! [`solve_environment`] keeps the eigenvectors of the largest eigenvalues of
//! an environment matrix and reports the relative spectral weight that was
//! discarded.

use hotrg_tensorbackend::{DenseScalar, NumericBackend};
use thiserror::Error;

use crate::global_default::InvalidToleranceError;
use crate::matrix::Matrix;
use crate::truncation::TruncationParams;

// Relative tolerance for the Hermiticity check.
const HERMITIAN_RTOL: f64 = 1e-8;

/// Error type for spectral truncation.
#[derive(Debug, Error)]
pub enum SpectralError {
    #[error("Environment matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    #[error("Environment matrix is not Hermitian (max deviation {deviation:e})")]
    NotHermitian { deviation: f64 },

    #[error(transparent)]
    InvalidThreshold(#[from] InvalidToleranceError),

    #[error("Eigendecomposition failed: {0}")]
    ComputationError(#[from] anyhow::Error),
}

/// A truncated projector together with its truncation error.
#[derive(Debug, Clone)]
pub struct SpectralProjection<T> {
    /// n × k matrix with orthonormal columns, `k = min(χ, kept)`, ordered by
    /// descending eigenvalue.
    pub projector: Matrix<T>,
    /// `1 − Σ top-χ λ / Σ λ`, exactly 0 when nothing above the threshold was
    /// dropped.
    pub error: f64,
    /// All eigenvalues in descending order.
    pub eigenvalues: Vec<f64>,
    /// Number of eigenvalues above the threshold.
    pub kept: usize,
}

impl<T: DenseScalar> SpectralProjection<T> {
    /// Number of projector columns.
    pub fn rank(&self) -> usize {
        self.projector.cols()
    }
}

/// Build the truncated projector of a Hermitian environment matrix.
///
/// `params.max_rank` is the target rank χ (unlimited if unset) and
/// `params.threshold` the eigenvalue cutoff ε (defaults to
/// [`default_eigen_threshold`](crate::default_eigen_threshold)). Eigenvalues
/// `λ ≤ ε` are never kept.
///
/// If `χ ≥ kept` the error is exactly 0. Otherwise it is
/// `1 − Σ(top χ eigenvalues) / Σ(all eigenvalues)`.
///
/// A matrix whose eigenvalues are all below the threshold yields a valid
/// n × 0 projector.
///
/// # Errors
/// Returns `SpectralError` if the matrix is not square or not Hermitian, the
/// threshold is invalid, or the backend fails.
///
/// # Example
///
/// ```
/// use hotrg_core::{solve_environment, Matrix, TruncationParams};
/// use hotrg_tensorbackend::FaerBackend;
///
/// let env = Matrix::from_vec(2, 2, vec![2.0, 0.0, 0.0, 1.0]);
/// let params = TruncationParams::new().with_max_rank(1);
/// let result = solve_environment(&FaerBackend, &env, &params).unwrap();
/// assert_eq!(result.projector.shape(), (2, 1));
/// assert!((result.error - 1.0 / 3.0).abs() < 1e-12);
/// ```
pub fn solve_environment<T, B>(
    backend: &B,
    env: &Matrix<T>,
    params: &TruncationParams,
) -> Result<SpectralProjection<T>, SpectralError>
where
    T: DenseScalar,
    B: NumericBackend,
{
    let (rows, cols) = env.shape();
    if rows != cols {
        return Err(SpectralError::NotSquare { rows, cols });
    }
    let threshold = params.effective_threshold()?;
    let chi = params.effective_max_rank();

    let scale = env
        .as_slice()
        .iter()
        .map(|&x| num_complex::ComplexFloat::abs(x))
        .fold(0.0, f64::max);
    let deviation = env.max_abs_diff(&env.conj_transpose());
    if deviation > HERMITIAN_RTOL * scale.max(1.0) {
        return Err(SpectralError::NotHermitian { deviation });
    }

    let n = rows;
    let eig = backend.eigh(env.as_slice(), n)?;

    // Ascending from the backend
    let kept = eig.eigenvalues.iter().filter(|&&l| l > threshold).count();
    let error = if chi >= kept {
        0.0
    } else {
        let total: f64 = eig.eigenvalues.iter().sum();
        let top: f64 = eig.eigenvalues[n - chi..].iter().sum();
        if total == 0.0 {
            0.0
        } else {
            1.0 - top / total
        }
    };

    let rank = chi.min(kept);
    let projector = Matrix::from_fn(n, rank, |i, j| eig.eigenvectors[i * n + (n - 1 - j)]);
    if rank == 0 {
        tracing::warn!(n, threshold, "environment has no eigenvalue above the threshold");
    }

    let mut eigenvalues = eig.eigenvalues;
    eigenvalues.reverse();

    Ok(SpectralProjection {
        projector,
        error,
        eigenvalues,
        kept,
    })
}
