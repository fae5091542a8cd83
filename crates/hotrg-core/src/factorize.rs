//! SVD factorization of labeled tensors into isometries and a diagonal core.
//!
//! # Example
//!
//! ```
//! use hotrg_core::{factorize, DenseTensor, FactorizeOptions};
//! use hotrg_tensorbackend::FaerBackend;
//!
//! let a = DenseTensor::from_fn(&["i", "j", "k"], &[2, 2, 3], |idx| {
//!     (idx[0] + 2 * idx[1] + idx[2]) as f64
//! })
//! .unwrap();
//! let result = factorize(&FaerBackend, &a, &["i", "j"], &["k"], &FactorizeOptions::default()).unwrap();
//! assert_eq!(result.u.labels(), &["i|j", "inner:i|j"]);
//! assert_eq!(result.v.labels(), &["inner:k", "k"]);
//! assert_eq!(result.error, 0.0);
//! ```

use hotrg_tensorbackend::{DenseScalar, NumericBackend};
use thiserror::Error;

use crate::matrix::Matrix;
use crate::tensor::{DenseTensor, TensorError};
use crate::truncation::{HasTruncationParams, TruncationParams};

/// Bond dimension used when no `max_rank` is configured.
pub const DEFAULT_FACTORIZE_RANK: usize = 16;

/// Separator between leg names in a combined group label.
pub const GROUP_SEPARATOR: &str = "|";

/// Prefix of the default inner leg labels.
pub const INNER_PREFIX: &str = "inner:";

/// Error type for factorize operations.
#[derive(Debug, Error)]
pub enum FactorizeError {
    #[error("Tensor error: {0}")]
    Tensor(#[from] TensorError),

    #[error("Inner labels must be two distinct labels, got ({0:?}, {1:?})")]
    InvalidInnerLabels(String, String),

    #[error("Error order must be finite and positive, got {0}")]
    InvalidErrorOrder(f64),

    #[error("SVD computation failed: {0}")]
    ComputationError(#[from] anyhow::Error),
}

/// Options for [`factorize`].
#[derive(Debug, Clone, PartialEq)]
pub struct FactorizeOptions {
    /// Truncation parameters; `max_rank` is the bond dimension χ.
    pub truncation: TruncationParams,

    /// Exponent `p` of the truncation error `Σ dropped σ^p / Σ σ^p`.
    pub error_order: f64,

    /// Labels of the inner legs of `u` and `v`.
    ///
    /// If `None`, derived from the leg groups.
    pub inner_labels: Option<(String, String)>,
}

impl Default for FactorizeOptions {
    fn default() -> Self {
        Self {
            truncation: TruncationParams::new(),
            error_order: 2.0,
            inner_labels: None,
        }
    }
}

impl FactorizeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the error exponent.
    #[must_use]
    pub fn with_error_order(mut self, p: f64) -> Self {
        self.error_order = p;
        self
    }

    /// Set explicit inner leg labels.
    #[must_use]
    pub fn with_inner_labels(mut self, u_label: &str, v_label: &str) -> Self {
        self.inner_labels = Some((u_label.to_string(), v_label.to_string()));
        self
    }

    /// Bond dimension, falling back to [`DEFAULT_FACTORIZE_RANK`].
    pub fn effective_max_rank(&self) -> usize {
        self.truncation.max_rank.unwrap_or(DEFAULT_FACTORIZE_RANK)
    }
}

impl HasTruncationParams for FactorizeOptions {
    fn truncation_params(&self) -> &TruncationParams {
        &self.truncation
    }

    fn truncation_params_mut(&mut self) -> &mut TruncationParams {
        &mut self.truncation
    }
}

/// Result of [`factorize`].
///
/// `u · s · v` reproduces the matrix view of the input within the
/// truncation error.
#[derive(Debug, Clone)]
pub struct FactorizeResult<T> {
    /// Legs `[row group, inner_u]`; orthonormal columns.
    pub u: DenseTensor<T>,
    /// Diagonal core with legs `[inner_u, inner_v]`.
    pub s: DenseTensor<T>,
    /// Legs `[inner_v, column group]`; orthonormal rows.
    pub v: DenseTensor<T>,
    /// Relative weight of the dropped singular values.
    pub error: f64,
    /// Kept singular values, descending.
    pub singular_values: Vec<f64>,
}

impl<T> FactorizeResult<T> {
    /// Dimension of the inner bond.
    pub fn rank(&self) -> usize {
        self.singular_values.len()
    }
}

/// Factorize `tensor` by SVD of its `rows` × `cols` matrix view.
///
/// The row index combines `rows` in the given order and the column index
/// combines `cols` likewise, last leg fastest. The decomposition is
/// truncated to `min(χ, min(m, n))` singular values, keeping the largest.
///
/// # Errors
/// Returns `FactorizeError` if `rows` and `cols` do not partition the legs,
/// the inner labels are invalid, or the backend fails.
pub fn factorize<T, B, S>(
    backend: &B,
    tensor: &DenseTensor<T>,
    rows: &[S],
    cols: &[S],
    options: &FactorizeOptions,
) -> Result<FactorizeResult<T>, FactorizeError>
where
    T: DenseScalar,
    B: NumericBackend,
    S: AsRef<str>,
{
    let p = options.error_order;
    if !p.is_finite() || p <= 0.0 {
        return Err(FactorizeError::InvalidErrorOrder(p));
    }

    let row_name = join_group(rows);
    let col_name = join_group(cols);
    let (inner_u, inner_v) = match &options.inner_labels {
        Some((a, b)) if a == b || a.is_empty() || b.is_empty() => {
            return Err(FactorizeError::InvalidInnerLabels(a.clone(), b.clone()));
        }
        Some((a, b)) => (a.clone(), b.clone()),
        None => (
            format!("{INNER_PREFIX}{row_name}"),
            format!("{INNER_PREFIX}{col_name}"),
        ),
    };
    if inner_u == row_name || inner_v == col_name {
        return Err(FactorizeError::InvalidInnerLabels(inner_u, inner_v));
    }

    let matrix = tensor.to_matrix(rows, cols)?;
    let (m, n) = matrix.shape();
    let svd = backend.svd(matrix.as_slice(), m, n)?;
    let full = svd.rank();
    let k = options.effective_max_rank().min(full);

    let error = if k == full {
        0.0
    } else {
        let total: f64 = svd.s.iter().map(|&s| s.powf(p)).sum();
        let dropped: f64 = svd.s[k..].iter().map(|&s| s.powf(p)).sum();
        if total > 0.0 {
            dropped / total
        } else {
            0.0
        }
    };

    let u = Matrix::from_fn(m, k, |i, j| svd.u[i * full + j]);
    let v = Matrix::from_fn(k, n, |i, j| svd.vt[i * n + j]);
    let s = Matrix::from_fn(k, k, |i, j| {
        if i == j {
            <T as From<f64>>::from(svd.s[i])
        } else {
            T::zero()
        }
    });

    Ok(FactorizeResult {
        u: DenseTensor::from_matrix(&u, &row_name, &inner_u)?,
        s: DenseTensor::from_matrix(&s, &inner_u, &inner_v)?,
        v: DenseTensor::from_matrix(&v, &inner_v, &col_name)?,
        error,
        singular_values: svd.s[..k].to_vec(),
    })
}

/// Whether contracting `tensor` with its conjugate over `labels` gives the
/// identity on the remaining legs, within `eps`.
///
/// Concretely, the matrix view `M` with the remaining legs as rows and
/// `labels` as columns must satisfy `M M† = I`.
///
/// # Errors
/// Returns `TensorError` if a label is not a leg of `tensor`.
pub fn is_isometry<T, S>(tensor: &DenseTensor<T>, labels: &[S], eps: f64) -> Result<bool, TensorError>
where
    T: DenseScalar,
    S: AsRef<str>,
{
    for label in labels {
        tensor.position(label.as_ref())?;
    }
    let rows: Vec<&str> = tensor
        .labels()
        .iter()
        .map(String::as_str)
        .filter(|l| !labels.iter().any(|c| c.as_ref() == *l))
        .collect();
    let cols: Vec<&str> = labels.iter().map(|l| l.as_ref()).collect();
    let mat = tensor.to_matrix(&rows, &cols)?;
    let gram = mat.matmul(&mat.conj_transpose());
    Ok(gram.max_abs_diff(&Matrix::identity(mat.rows())) <= eps)
}

fn join_group<S: AsRef<str>>(legs: &[S]) -> String {
    legs.iter()
        .map(|l| l.as_ref())
        .collect::<Vec<_>>()
        .join(GROUP_SEPARATOR)
}
