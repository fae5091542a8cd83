//! Dense row-major matrices.
//!
//! Used for environment matrices, projectors and the matrix views of tensors.

use hotrg_tensorbackend::{gemm, DenseScalar};
use num_complex::ComplexFloat;

/// A dense row-major matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: DenseScalar> Matrix<T> {
    /// Create a matrix from row-major data.
    ///
    /// # Panics
    /// Panics if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Self {
        assert_eq!(
            data.len(),
            rows * cols,
            "Matrix data length {} doesn't match shape {}x{}",
            data.len(),
            rows,
            cols
        );
        Self { rows, cols, data }
    }

    /// Create a matrix from a function of `(row, col)`.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    /// Zero matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![T::zero(); rows * cols],
        }
    }

    /// Identity matrix.
    pub fn identity(n: usize) -> Self {
        Self::from_fn(n, n, |i, j| if i == j { T::one() } else { T::zero() })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Row-major data.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Element at `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> T {
        self.data[i * self.cols + j]
    }

    /// Column `j` as a vector.
    pub fn column(&self, j: usize) -> Vec<T> {
        (0..self.rows).map(|i| self.get(i, j)).collect()
    }

    /// Conjugate transpose.
    pub fn conj_transpose(&self) -> Self {
        Self::from_fn(self.cols, self.rows, |i, j| ComplexFloat::conj(self.get(j, i)))
    }

    /// Matrix product `self @ other`.
    ///
    /// # Panics
    /// Panics if the inner dimensions differ.
    pub fn matmul(&self, other: &Self) -> Self {
        assert_eq!(
            self.cols, other.rows,
            "Inner dimensions must match: {}x{} @ {}x{}",
            self.rows, self.cols, other.rows, other.cols
        );
        let data = gemm(&self.data, &other.data, self.rows, self.cols, other.cols);
        Self {
            rows: self.rows,
            cols: other.cols,
            data,
        }
    }

    /// Largest elementwise deviation from `other`.
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        assert_eq!(self.shape(), other.shape(), "Shapes must match");
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| ComplexFloat::abs(a - b))
            .fold(0.0, f64::max)
    }

    /// Whether the matrix is Hermitian within `eps`.
    pub fn is_hermitian(&self, eps: f64) -> bool {
        self.is_square() && self.max_abs_diff(&self.conj_transpose()) <= eps
    }

    /// Whether the columns are orthonormal (`M^H M = I`) within `eps`.
    pub fn has_orthonormal_columns(&self, eps: f64) -> bool {
        let gram = self.conj_transpose().matmul(self);
        gram.max_abs_diff(&Self::identity(self.cols)) <= eps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn test_from_fn_and_get() {
        let m = Matrix::<f64>::from_fn(2, 3, |i, j| (10 * i + j) as f64);
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.get(1, 2), 12.0);
        assert_eq!(m.column(1), vec![1.0, 11.0]);
    }

    #[test]
    fn test_conj_transpose_complex() {
        let m = Matrix::from_vec(
            1,
            2,
            vec![Complex64::new(1.0, 2.0), Complex64::new(3.0, -4.0)],
        );
        let h = m.conj_transpose();
        assert_eq!(h.shape(), (2, 1));
        assert_eq!(h.get(0, 0), Complex64::new(1.0, -2.0));
        assert_eq!(h.get(1, 0), Complex64::new(3.0, 4.0));
    }

    #[test]
    fn test_matmul_identity() {
        let m = Matrix::<f64>::from_fn(3, 2, |i, j| (i + 2 * j) as f64);
        let p = m.matmul(&Matrix::identity(2));
        assert_eq!(p, m);
    }

    #[test]
    fn test_orthonormal_columns() {
        let s = 1.0 / 2.0_f64.sqrt();
        let q = Matrix::from_vec(2, 2, vec![s, s, s, -s]);
        assert!(q.has_orthonormal_columns(1e-12));
        let not_q = Matrix::from_vec(2, 1, vec![1.0, 1.0]);
        assert!(!not_q.has_orthonormal_columns(1e-12));
    }

    #[test]
    fn test_is_hermitian() {
        let h = Matrix::from_vec(2, 2, vec![1.0, 2.0, 2.0, 3.0]);
        assert!(h.is_hermitian(0.0));
        let n = Matrix::from_vec(2, 2, vec![1.0, 2.0, 0.0, 3.0]);
        assert!(!n.is_hermitian(1e-12));
    }
}
