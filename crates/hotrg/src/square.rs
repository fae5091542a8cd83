//! Rank-4 square-lattice tensors.

use hotrg_core::{DenseScalar, DenseTensor};

use crate::error::{HotrgError, Result};

/// Canonical leg order of a [`SquareTensor`].
pub const SQUARE_LEGS: [&str; 4] = ["u", "d", "l", "r"];

/// A rank-4 tensor with legs `u, d, l, r` and the number of lattice sites
/// it represents.
///
/// Opposite legs always have equal dimensions, so the tensor can be traced
/// and stacked with a copy of itself in either direction.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareTensor<T> {
    tensor: DenseTensor<T>,
    degree_of_freedom: u64,
}

impl<T: DenseScalar> SquareTensor<T> {
    /// Wrap a labeled tensor.
    ///
    /// The legs are permuted into `u, d, l, r` order.
    ///
    /// # Errors
    /// Returns `HotrgError::InvalidTensor` if the legs are not exactly
    /// `u, d, l, r`, opposite legs differ in dimension, or
    /// `degree_of_freedom` is zero.
    pub fn new(tensor: DenseTensor<T>, degree_of_freedom: u64) -> Result<Self> {
        if tensor.rank() != 4 || !tensor.has_labels(&SQUARE_LEGS) {
            return Err(HotrgError::InvalidTensor {
                message: format!("expected legs {:?}, got {:?}", SQUARE_LEGS, tensor.labels()),
            });
        }
        if degree_of_freedom == 0 {
            return Err(HotrgError::InvalidTensor {
                message: "degree of freedom must be positive".to_string(),
            });
        }
        let tensor = if tensor.labels().iter().eq(SQUARE_LEGS.iter()) {
            tensor
        } else {
            tensor.permute(&SQUARE_LEGS)?
        };
        let dims = tensor.dims();
        if dims[0] != dims[1] || dims[2] != dims[3] {
            return Err(HotrgError::InvalidTensor {
                message: format!("opposite legs must have equal dimensions, got {:?}", dims),
            });
        }
        Ok(Self {
            tensor,
            degree_of_freedom,
        })
    }

    /// Tensor of dimension `dim` on every leg from row-major `u, d, l, r`
    /// data, representing a single site.
    pub fn from_array(data: Vec<T>, dim: usize) -> Result<Self> {
        let tensor = DenseTensor::new(&SQUARE_LEGS, &[dim; 4], data)?;
        Self::new(tensor, 1)
    }

    /// Tensor with explicit `[u, d, l, r]` dimensions.
    pub fn from_dims(data: Vec<T>, dims: [usize; 4], degree_of_freedom: u64) -> Result<Self> {
        let tensor = DenseTensor::new(&SQUARE_LEGS, &dims, data)?;
        Self::new(tensor, degree_of_freedom)
    }

    pub fn tensor(&self) -> &DenseTensor<T> {
        &self.tensor
    }

    pub fn into_tensor(self) -> DenseTensor<T> {
        self.tensor
    }

    /// `[u, d, l, r]` dimensions.
    pub fn dims(&self) -> [usize; 4] {
        let d = self.tensor.dims();
        [d[0], d[1], d[2], d[3]]
    }

    /// Dimension of the `u`/`d` legs.
    pub fn vertical_dim(&self) -> usize {
        self.tensor.dims()[0]
    }

    /// Dimension of the `l`/`r` legs.
    pub fn horizontal_dim(&self) -> usize {
        self.tensor.dims()[2]
    }

    /// Number of original lattice sites represented.
    pub fn degree_of_freedom(&self) -> u64 {
        self.degree_of_freedom
    }

    pub fn norm(&self) -> f64 {
        self.tensor.norm()
    }

    /// Periodic trace: contract `u` with `d` and `l` with `r`.
    pub fn trace(&self) -> T {
        let [du, dd, dl, dr] = self.dims();
        let data = self.tensor.as_slice();
        let mut acc = T::zero();
        for i in 0..du {
            for j in 0..dl {
                acc += data[((i * dd + i) * dl + j) * dr + j];
            }
        }
        acc
    }

    /// Divide by the Frobenius norm in place and return the norm.
    ///
    /// A zero tensor is left unchanged.
    pub fn normalize(&mut self) -> f64 {
        let norm = self.tensor.norm();
        if norm > 0.0 {
            self.tensor.scale_in_place(<T as From<f64>>::from(1.0 / norm));
        }
        norm
    }
}
