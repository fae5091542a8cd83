//! Backend dispatch for the dense linear algebra used by HOTRG.
//!
//! The [`NumericBackend`] trait is the single seam between the algorithms and
//! the numeric library. [`FaerBackend`] is the default CPU implementation:
//! SVD goes through mdarray-linalg's FAER binding, Hermitian
//! eigendecomposition through FAER directly.
//!
//! All upstream types are copied into plain row-major buffers so that
//! downstream crates do not see upstream API changes.

use anyhow::Result;
use faer::{Mat, Side};
use mdarray::{DSlice, DTensor};
use mdarray_linalg::svd::SVD;
use mdarray_linalg_faer::Faer;
use num_complex::ComplexFloat;

use crate::storage::DenseScalar;

/// Result of a Hermitian eigendecomposition.
///
/// For an n×n matrix A the decomposition satisfies `A = V diag(λ) V^H`.
#[derive(Debug, Clone)]
pub struct EighResult<T> {
    /// Eigenvalues in ascending order.
    pub eigenvalues: Vec<f64>,
    /// Eigenvectors as an n×n row-major matrix; column `j` belongs to
    /// `eigenvalues[j]`.
    pub eigenvectors: Vec<T>,
    /// Matrix size n.
    pub n: usize,
}

/// Result of a thin SVD decomposition.
///
/// For an m×n matrix A with `k = min(m, n)`:
/// - `u`: m×k row-major, orthonormal columns
/// - `s`: k singular values in descending order
/// - `vt`: k×n row-major, orthonormal rows, V^H
///
/// The decomposition satisfies: A = U × diag(S) × Vt
#[derive(Debug, Clone)]
pub struct SvdResult<T> {
    /// Left singular vectors (m×k).
    pub u: Vec<T>,
    /// Singular values (length k).
    pub s: Vec<f64>,
    /// Right singular vectors, conjugate-transposed (k×n).
    pub vt: Vec<T>,
    /// Number of rows m.
    pub m: usize,
    /// Number of columns n.
    pub n: usize,
}

impl<T> SvdResult<T> {
    /// Number of singular triplets, `min(m, n)`.
    pub fn rank(&self) -> usize {
        self.s.len()
    }
}

/// Numeric capabilities required by the spectral projector and the
/// factorizer.
///
/// Matrices are passed as row-major slices. Implementations must not keep
/// references to the inputs.
pub trait NumericBackend {
    /// Hermitian eigendecomposition of an n×n matrix.
    ///
    /// Only the lower triangle is guaranteed to be read.
    fn eigh<T: DenseScalar>(&self, a: &[T], n: usize) -> Result<EighResult<T>>;

    /// Thin singular value decomposition of an m×n matrix.
    fn svd<T: DenseScalar>(&self, a: &[T], m: usize, n: usize) -> Result<SvdResult<T>>;
}

/// CPU backend built on FAER.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaerBackend;

impl NumericBackend for FaerBackend {
    fn eigh<T: DenseScalar>(&self, a: &[T], n: usize) -> Result<EighResult<T>> {
        anyhow::ensure!(
            a.len() == n * n,
            "Matrix buffer has length {}, expected {}x{}",
            a.len(),
            n,
            n
        );
        if n == 0 {
            return Ok(EighResult {
                eigenvalues: Vec::new(),
                eigenvectors: Vec::new(),
                n,
            });
        }

        let mat = Mat::<T>::from_fn(n, n, |i, j| a[i * n + j]);
        let evd = mat
            .self_adjoint_eigen(Side::Lower)
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        let s = evd.S();
        let values = s.column_vector();
        let vectors = evd.U();

        // Eigenvalues of a Hermitian matrix are real; the imaginary part is
        // dropped for complex scalars.
        let raw: Vec<f64> = (0..n).map(|i| ComplexFloat::re(values[i])).collect();

        // Sort ascending explicitly so that callers never rely on the
        // backend's ordering convention.
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&x, &y| raw[x].total_cmp(&raw[y]));

        let eigenvalues: Vec<f64> = order.iter().map(|&i| raw[i]).collect();
        let mut eigenvectors = Vec::with_capacity(n * n);
        for row in 0..n {
            for &col in &order {
                eigenvectors.push(vectors[(row, col)]);
            }
        }

        Ok(EighResult {
            eigenvalues,
            eigenvectors,
            n,
        })
    }

    fn svd<T: DenseScalar>(&self, a: &[T], m: usize, n: usize) -> Result<SvdResult<T>> {
        anyhow::ensure!(
            a.len() == m * n,
            "Matrix buffer has length {}, expected {}x{}",
            a.len(),
            m,
            n
        );
        let k = m.min(n);
        if k == 0 {
            return Ok(SvdResult {
                u: Vec::new(),
                s: Vec::new(),
                vt: Vec::new(),
                m,
                n,
            });
        }

        // SVD destroys the input, so the data is copied into a fresh tensor
        let mut a_tensor = DTensor::<T, 2>::from_fn([m, n], |idx| a[idx[0] * n + idx[1]]);
        let a_slice: &mut DSlice<T, 2> = a_tensor.as_mut();
        let decomp = Faer
            .svd(a_slice)
            .map_err(|e| anyhow::anyhow!("{}", e))?;

        // NOTE:
        // `mdarray-linalg-faer` writes singular values into the first row of
        // `s` (LAPACK-style convention), so they live at `s[0, i]`.
        let mut s_vec = Vec::with_capacity(k);
        for i in 0..k {
            s_vec.push(ComplexFloat::re(decomp.s[[0, i]]));
        }

        // U is m×m; keep the first k columns
        let mut u_vec = Vec::with_capacity(m * k);
        for i in 0..m {
            for j in 0..k {
                u_vec.push(decomp.u[[i, j]]);
            }
        }

        // The binding returns V^T (n×n, unconjugated); keep the first k rows
        // and conjugate so that `vt` is V^H
        let mut vt_vec = Vec::with_capacity(k * n);
        for i in 0..k {
            for j in 0..n {
                vt_vec.push(ComplexFloat::conj(decomp.vt[[i, j]]));
            }
        }

        Ok(SvdResult {
            u: u_vec,
            s: s_vec,
            vt: vt_vec,
            m,
            n,
        })
    }
}
