use faer::linalg::matmul::matmul as faer_matmul;
use faer::{Accum, Par};
use faer_traits::ComplexField;
use mdarray::{DynRank, Shape, Tensor};
use num_complex::{Complex64, ComplexFloat};
use num_traits::{One, Zero};
use std::fmt::Debug;
use std::ops::AddAssign;

/// Trait for scalar types that can be used in dense row-major buffers.
///
/// Implemented for `f64` and `Complex64`. The real type of every scalar is
/// `f64`, so norms, eigenvalues and singular values are always plain `f64`.
pub trait DenseScalar:
    Copy
    + Debug
    + Default
    + Zero
    + One
    + AddAssign
    + ComplexFloat<Real = f64>
    + ComplexField
    + From<f64>
    + Send
    + Sync
    + 'static
{
}

impl DenseScalar for f64 {}
impl DenseScalar for Complex64 {}

/// Dense storage for tensor elements, wrapping mdarray's `Tensor` with
/// dynamic rank.
///
/// Elements are row-major; the shape lives inside the tensor, so `permute`
/// and `contract` need no separate dimension arguments.
#[derive(Debug, Clone)]
pub struct DenseStorage<T>(Tensor<T, DynRank>);

impl<T> DenseStorage<T> {
    /// Create storage from row-major data with an explicit shape.
    ///
    /// # Panics
    /// Panics if the product of `dims` doesn't match `vec.len()`.
    pub fn from_vec_with_shape(vec: Vec<T>, dims: &[usize]) -> Self {
        let expected_len: usize = dims.iter().product();
        assert_eq!(
            vec.len(),
            expected_len,
            "Vec length {} doesn't match shape {:?} (product {})",
            vec.len(),
            dims,
            expected_len
        );
        Self(Tensor::from(vec).into_shape(DynRank::from_dims(dims)))
    }

    pub fn dims(&self) -> Vec<usize> {
        self.0.shape().with_dims(|d| d.to_vec())
    }

    pub fn rank(&self) -> usize {
        self.0.rank()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0[..]
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.0[..]
    }

    pub fn into_vec(self) -> Vec<T> {
        self.0.into_vec()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The underlying mdarray tensor.
    pub fn tensor(&self) -> &Tensor<T, DynRank> {
        &self.0
    }
}

impl<T: PartialEq> PartialEq for DenseStorage<T> {
    fn eq(&self, other: &Self) -> bool {
        self.dims() == other.dims() && self.as_slice() == other.as_slice()
    }
}

impl<T: DenseScalar> DenseStorage<T> {
    /// Permute the axes: axis `i` of the result is axis `perm[i]` of `self`.
    pub fn permute(&self, perm: &[usize]) -> Self {
        assert_eq!(
            perm.len(),
            self.rank(),
            "permutation length {} must match rank {}",
            perm.len(),
            self.rank()
        );
        if perm.iter().enumerate().all(|(i, &p)| i == p) {
            return self.clone();
        }
        Self(self.0.permute(perm).to_tensor())
    }

    /// Elementwise complex conjugate.
    pub fn conj(&self) -> Self {
        let data = self.as_slice().iter().map(|&x| ComplexFloat::conj(x)).collect();
        Self::from_vec_with_shape(data, &self.dims())
    }

    /// Contract with `other` over the given axis pairs.
    ///
    /// ```text
    /// A[free_a..., k...] @ B[k..., free_b...] = C[free_a..., free_b...]
    /// ```
    ///
    /// `axes[i]` of `self` is contracted with `other_axes[i]` of `other`. The
    /// result keeps the free axes of `self` in order, followed by the free
    /// axes of `other` in order. Contracted axes need not be contiguous.
    pub fn contract(&self, axes: &[usize], other: &Self, other_axes: &[usize]) -> Self {
        let dims = self.dims();
        let other_dims = other.dims();
        assert_eq!(
            axes.len(),
            other_axes.len(),
            "Number of contracted axes must match"
        );
        for (&ia, &ib) in axes.iter().zip(other_axes.iter()) {
            assert_eq!(
                dims[ia], other_dims[ib],
                "Contracted dimension sizes must match: {} vs {}",
                dims[ia], other_dims[ib]
            );
        }

        let lhs = self.permute(&contraction_permutation(dims.len(), axes, false));
        let rhs = other.permute(&contraction_permutation(other_dims.len(), other_axes, true));
        let lhs_dims = lhs.dims();
        let rhs_dims = rhs.dims();

        let naxes = axes.len();
        let free_a = &lhs_dims[..lhs_dims.len() - naxes];
        let free_b = &rhs_dims[naxes..];
        let m: usize = free_a.iter().product();
        let k: usize = lhs_dims[lhs_dims.len() - naxes..].iter().product();
        let n: usize = free_b.iter().product();

        let data = gemm(lhs.as_slice(), rhs.as_slice(), m, k, n);
        let mut result_dims = free_a.to_vec();
        result_dims.extend_from_slice(free_b);
        Self::from_vec_with_shape(data, &result_dims)
    }

    /// Frobenius norm.
    pub fn norm(&self) -> f64 {
        frobenius_norm(self.as_slice())
    }
}

/// Dense matrix product `C[m, n] = A[m, k] @ B[k, n]` on row-major buffers.
pub fn gemm<T: DenseScalar>(a: &[T], b: &[T], m: usize, k: usize, n: usize) -> Vec<T> {
    assert_eq!(a.len(), m * k, "Left operand length must be m * k");
    assert_eq!(b.len(), k * n, "Right operand length must be k * n");

    let mut c = vec![T::zero(); m * n];
    if m == 0 || n == 0 || k == 0 {
        return c;
    }

    // Row-major views: row_stride = number of columns, col_stride = 1
    let a_mat = unsafe { faer::MatRef::from_raw_parts(a.as_ptr(), m, k, k as isize, 1) };
    let b_mat = unsafe { faer::MatRef::from_raw_parts(b.as_ptr(), k, n, n as isize, 1) };
    let mut c_mat =
        unsafe { faer::MatMut::from_raw_parts_mut(c.as_mut_ptr(), m, n, n as isize, 1) };

    faer_matmul(&mut c_mat, Accum::Replace, a_mat, b_mat, T::one(), Par::Seq);

    c
}

/// Permutation that makes the contracted axes contiguous.
///
/// If `axes_at_front` is true the contracted axes go first (in the order
/// given), otherwise they go last. Free axes keep their original order.
fn contraction_permutation(ndim: usize, axes: &[usize], axes_at_front: bool) -> Vec<usize> {
    let non_contracted: Vec<usize> = (0..ndim).filter(|i| !axes.contains(i)).collect();
    if axes_at_front {
        axes.iter().chain(non_contracted.iter()).copied().collect()
    } else {
        non_contracted.iter().chain(axes.iter()).copied().collect()
    }
}

/// Frobenius norm of a dense buffer.
pub fn frobenius_norm<T: DenseScalar>(data: &[T]) -> f64 {
    data.iter()
        .map(|&x| {
            let a = ComplexFloat::abs(x);
            a * a
        })
        .sum::<f64>()
        .sqrt()
}
