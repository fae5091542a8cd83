//! Dense tensors with labeled legs.
//!
//! A [`DenseTensor`] pairs a [`DenseStorage`] (row-major, in the order of its
//! legs) with one string label per leg. Legs are addressed by label, never by
//! position, so permuting a tensor does not change its meaning.

use hotrg_tensorbackend::{DenseScalar, DenseStorage};
use num_complex::ComplexFloat;
use std::collections::HashSet;
use thiserror::Error;

use crate::matrix::Matrix;

/// Error type for tensor construction, reshaping and contraction.
#[derive(Debug, Error)]
pub enum TensorError {
    #[error("Data length {got} does not match dims {dims:?} (expected {expected})")]
    DataLength {
        dims: Vec<usize>,
        expected: usize,
        got: usize,
    },

    #[error("Got {labels} labels for a rank-{rank} tensor")]
    LabelCount { labels: usize, rank: usize },

    #[error("Duplicate leg label {0:?}")]
    DuplicateLabel(String),

    #[error("Leg label {label:?} not found in {labels:?}")]
    LabelNotFound { label: String, labels: Vec<String> },

    #[error("Invalid leg split: {0}")]
    InvalidSplit(String),

    #[error("Invalid contraction plan: {0}")]
    InvalidPlan(String),

    #[error("Tensor contraction failed: {0}")]
    ContractionError(#[from] anyhow::Error),
}

/// A dense tensor with labeled legs.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseTensor<T> {
    labels: Vec<String>,
    dims: Vec<usize>,
    storage: DenseStorage<T>,
}

impl<T: DenseScalar> DenseTensor<T> {
    /// Create a tensor from labels, dimensions and row-major data.
    ///
    /// # Errors
    /// Returns `TensorError` if the label count differs from the rank, labels
    /// repeat, or the data length does not match the dimensions.
    pub fn new<S: AsRef<str>>(labels: &[S], dims: &[usize], data: Vec<T>) -> Result<Self, TensorError> {
        if labels.len() != dims.len() {
            return Err(TensorError::LabelCount {
                labels: labels.len(),
                rank: dims.len(),
            });
        }
        let expected: usize = dims.iter().product();
        if data.len() != expected {
            return Err(TensorError::DataLength {
                dims: dims.to_vec(),
                expected,
                got: data.len(),
            });
        }
        let labels: Vec<String> = labels.iter().map(|l| l.as_ref().to_string()).collect();
        let mut seen = HashSet::new();
        for label in &labels {
            if !seen.insert(label.as_str()) {
                return Err(TensorError::DuplicateLabel(label.clone()));
            }
        }
        Ok(Self {
            labels,
            dims: dims.to_vec(),
            storage: DenseStorage::from_vec_with_shape(data, dims),
        })
    }

    /// Wrap an existing storage, one label per axis.
    pub fn from_storage<S: AsRef<str>>(labels: &[S], storage: DenseStorage<T>) -> Result<Self, TensorError> {
        let dims = storage.dims();
        Self::new(labels, &dims, storage.into_vec())
    }

    /// Create a tensor from a function of the multi-index.
    pub fn from_fn<S: AsRef<str>>(
        labels: &[S],
        dims: &[usize],
        mut f: impl FnMut(&[usize]) -> T,
    ) -> Result<Self, TensorError> {
        let total: usize = dims.iter().product();
        let mut data = Vec::with_capacity(total);
        let mut idx = vec![0usize; dims.len()];
        for _ in 0..total {
            data.push(f(&idx));
            for axis in (0..dims.len()).rev() {
                idx[axis] += 1;
                if idx[axis] < dims[axis] {
                    break;
                }
                idx[axis] = 0;
            }
        }
        Self::new(labels, dims, data)
    }

    /// Create a matrix-shaped tensor with the given row and column labels.
    pub fn from_matrix(matrix: &Matrix<T>, row_label: &str, col_label: &str) -> Result<Self, TensorError> {
        Self::new(
            &[row_label, col_label],
            &[matrix.rows(), matrix.cols()],
            matrix.as_slice().to_vec(),
        )
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn storage(&self) -> &DenseStorage<T> {
        &self.storage
    }

    /// Row-major data in leg order.
    pub fn as_slice(&self) -> &[T] {
        self.storage.as_slice()
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.storage.as_mut_slice()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.storage.into_vec()
    }

    /// Position of a leg.
    pub fn position(&self, label: &str) -> Result<usize, TensorError> {
        self.labels
            .iter()
            .position(|l| l == label)
            .ok_or_else(|| TensorError::LabelNotFound {
                label: label.to_string(),
                labels: self.labels.clone(),
            })
    }

    /// Whether every label in `labels` is a leg of this tensor.
    pub fn has_labels<S: AsRef<str>>(&self, labels: &[S]) -> bool {
        labels
            .iter()
            .all(|l| self.labels.iter().any(|own| own == l.as_ref()))
    }

    /// Dimension of a leg.
    pub fn dim_of(&self, label: &str) -> Result<usize, TensorError> {
        Ok(self.dims[self.position(label)?])
    }

    /// Element at a multi-index given in leg order.
    pub fn get(&self, idx: &[usize]) -> T {
        assert_eq!(idx.len(), self.rank(), "Index rank mismatch");
        let mut offset = 0;
        for (i, &d) in idx.iter().zip(self.dims.iter()) {
            offset = offset * d + i;
        }
        self.storage.as_slice()[offset]
    }

    /// Rename a leg.
    pub fn relabel(mut self, from: &str, to: &str) -> Result<Self, TensorError> {
        let pos = self.position(from)?;
        if from != to && self.labels.iter().any(|l| l == to) {
            return Err(TensorError::DuplicateLabel(to.to_string()));
        }
        self.labels[pos] = to.to_string();
        Ok(self)
    }

    /// Reorder the legs to `order`, which must be a permutation of the labels.
    pub fn permute<S: AsRef<str>>(&self, order: &[S]) -> Result<Self, TensorError> {
        if order.len() != self.rank() {
            return Err(TensorError::LabelCount {
                labels: order.len(),
                rank: self.rank(),
            });
        }
        let mut perm = Vec::with_capacity(order.len());
        let mut seen = HashSet::new();
        for label in order {
            let label = label.as_ref();
            if !seen.insert(label) {
                return Err(TensorError::DuplicateLabel(label.to_string()));
            }
            perm.push(self.position(label)?);
        }
        let storage = self.storage.permute(&perm);
        Ok(Self {
            labels: order.iter().map(|l| l.as_ref().to_string()).collect(),
            dims: storage.dims(),
            storage,
        })
    }

    /// Matrix view with `rows` legs combined into the row index and `cols`
    /// legs into the column index.
    ///
    /// Both groups are combined C-order in the order given, so the last leg
    /// of each group varies fastest. `rows` and `cols` must partition the
    /// legs; either may be empty (giving a dimension of 1).
    pub fn to_matrix<S: AsRef<str>>(&self, rows: &[S], cols: &[S]) -> Result<Matrix<T>, TensorError> {
        if rows.len() + cols.len() != self.rank() {
            return Err(TensorError::InvalidSplit(format!(
                "{} row legs and {} column legs do not cover a rank-{} tensor",
                rows.len(),
                cols.len(),
                self.rank()
            )));
        }
        let order: Vec<&str> = rows
            .iter()
            .chain(cols.iter())
            .map(|l| l.as_ref())
            .collect();
        let permuted = self.permute(&order)?;
        let m: usize = permuted.dims[..rows.len()].iter().product();
        let n: usize = permuted.dims[rows.len()..].iter().product();
        Ok(Matrix::from_vec(m, n, permuted.into_vec()))
    }

    /// Frobenius norm.
    pub fn norm(&self) -> f64 {
        self.storage.norm()
    }

    /// Multiply every element by `factor` in place.
    pub fn scale_in_place(&mut self, factor: T) {
        for x in self.storage.as_mut_slice() {
            *x = *x * factor;
        }
    }

    /// Elementwise complex conjugate.
    pub fn conj(&self) -> Self {
        Self {
            labels: self.labels.clone(),
            dims: self.dims.clone(),
            storage: self.storage.conj(),
        }
    }

    /// Largest elementwise deviation from `other` after aligning leg order.
    pub fn max_abs_diff(&self, other: &Self) -> Result<f64, TensorError> {
        let aligned = other.permute(&self.labels)?;
        if aligned.dims != self.dims {
            return Err(TensorError::InvalidSplit(format!(
                "dims {:?} and {:?} differ",
                self.dims, aligned.dims
            )));
        }
        Ok(self
            .as_slice()
            .iter()
            .zip(aligned.as_slice().iter())
            .map(|(&a, &b)| ComplexFloat::abs(a - b))
            .fold(0.0, f64::max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rank3() -> DenseTensor<f64> {
        // t[a, b, c] = 100 a + 10 b + c
        DenseTensor::from_fn(&["a", "b", "c"], &[2, 3, 4], |idx| {
            (100 * idx[0] + 10 * idx[1] + idx[2]) as f64
        })
        .unwrap()
    }

    #[test]
    fn test_new_validates() {
        assert!(matches!(
            DenseTensor::<f64>::new(&["a"], &[2, 2], vec![0.0; 4]),
            Err(TensorError::LabelCount { .. })
        ));
        assert!(matches!(
            DenseTensor::<f64>::new(&["a", "b"], &[2, 2], vec![0.0; 3]),
            Err(TensorError::DataLength { expected: 4, got: 3, .. })
        ));
        assert!(matches!(
            DenseTensor::<f64>::new(&["a", "a"], &[2, 2], vec![0.0; 4]),
            Err(TensorError::DuplicateLabel(_))
        ));
    }

    #[test]
    fn test_get_and_dim_of() {
        let t = rank3();
        assert_eq!(t.get(&[1, 2, 3]), 123.0);
        assert_eq!(t.dim_of("b").unwrap(), 3);
        assert!(t.dim_of("z").is_err());
    }

    #[test]
    fn test_permute_keeps_meaning() {
        let t = rank3();
        let p = t.permute(&["c", "a", "b"]).unwrap();
        assert_eq!(p.dims(), &[4, 2, 3]);
        assert_eq!(p.get(&[3, 1, 2]), 123.0);
        assert_eq!(t.max_abs_diff(&p).unwrap(), 0.0);
    }

    #[test]
    fn test_to_matrix_groups_legs() {
        let t = rank3();
        let m = t.to_matrix(&["c"], &["a", "b"]).unwrap();
        assert_eq!(m.shape(), (4, 6));
        // row c = 3, col (a = 1, b = 2) -> 1 * 3 + 2
        assert_eq!(m.get(3, 5), 123.0);
        assert!(t.to_matrix(&["c"], &["a"]).is_err());
    }

    #[test]
    fn test_norm_and_scale() {
        let mut t = DenseTensor::new(&["x", "y"], &[1, 2], vec![3.0, 4.0]).unwrap();
        assert_eq!(t.norm(), 5.0);
        t.scale_in_place(0.2);
        assert!((t.norm() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_relabel() {
        let t = rank3().relabel("a", "z").unwrap();
        assert_eq!(t.labels(), &["z", "b", "c"]);
        assert!(rank3().relabel("a", "b").is_err());
    }
}
