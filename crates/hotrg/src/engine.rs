//! The HOTRG coarse-graining engine.
//!
//! [`Hotrg`] owns the renormalization state of a square-lattice tensor
//! network. Each [`iterate`](Hotrg::iterate) merges two copies of the current
//! tensor along the direction with the smallest truncation error, normalizes
//! the result and records the step. The recorded norms and degrees of
//! freedom give the free-energy density through
//! [`log_z_density`](Hotrg::log_z_density).
//!
//! # Example
//!
//! ```
//! use hotrg::{Hotrg, HotrgOptions};
//!
//! let mut engine = Hotrg::from_array(vec![1.0_f64; 16], 2, HotrgOptions::new().with_chi(2)).unwrap();
//! engine.iterate().unwrap();
//! assert_eq!(engine.iterations(), 1);
//! assert_eq!(engine.current().degree_of_freedom(), 2);
//! let f = engine.log_z_density();
//! assert!((f[1] - 4.0_f64.ln()).abs() < 1e-12);
//! ```

use hotrg_core::{
    solve_environment, validate_tolerance, DenseScalar, FaerBackend, Matrix, NumericBackend,
    SpectralProjection, TruncationParams,
};
use num_complex::ComplexFloat;

use crate::direction::{Axis, Direction};
use crate::error::{HotrgError, Result};
use crate::square::SquareTensor;
use crate::templates::DirectionalTemplates;

/// Bond dimension used when none is configured.
pub const DEFAULT_CHI: usize = 16;

/// Number of tensors merged by one impurity step.
pub const IMPURITY_PARTS: usize = 2;

/// Options for [`Hotrg`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HotrgOptions {
    /// Bond dimension of horizontal steps (`l`, `r`).
    pub chi_h: usize,
    /// Bond dimension of vertical steps (`u`, `d`). Defaults to `chi_h`.
    pub chi_v: Option<usize>,
    /// Eigenvalue threshold of the spectral projector.
    ///
    /// If `None`, uses [`default_eigen_threshold`](hotrg_core::default_eigen_threshold).
    pub threshold: Option<f64>,
}

impl Default for HotrgOptions {
    fn default() -> Self {
        Self {
            chi_h: DEFAULT_CHI,
            chi_v: None,
            threshold: None,
        }
    }
}

impl HotrgOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set both bond dimensions.
    #[must_use]
    pub fn with_chi(mut self, chi: usize) -> Self {
        self.chi_h = chi;
        self.chi_v = Some(chi);
        self
    }

    #[must_use]
    pub fn with_chi_h(mut self, chi: usize) -> Self {
        self.chi_h = chi;
        self
    }

    #[must_use]
    pub fn with_chi_v(mut self, chi: usize) -> Self {
        self.chi_v = Some(chi);
        self
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Bond dimension for an axis.
    pub fn chi(&self, axis: Axis) -> usize {
        match axis {
            Axis::Horizontal => self.chi_h,
            Axis::Vertical => self.chi_v.unwrap_or(self.chi_h),
        }
    }

    /// Truncation parameters of the spectral projector for an axis.
    pub fn truncation(&self, axis: Axis) -> TruncationParams {
        TruncationParams {
            max_rank: Some(self.chi(axis)),
            threshold: self.threshold,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.chi(Axis::Horizontal) == 0 || self.chi(Axis::Vertical) == 0 {
            return Err(HotrgError::InvalidOptions {
                message: format!(
                    "bond dimensions must be positive, got chi_h = {}, chi_v = {}",
                    self.chi(Axis::Horizontal),
                    self.chi(Axis::Vertical)
                ),
            });
        }
        if let Some(threshold) = self.threshold {
            validate_tolerance(threshold)?;
        }
        Ok(())
    }
}

/// One coarse-graining step.
#[derive(Debug, Clone)]
pub struct StepRecord<T> {
    /// Normalized tensor after the step.
    pub tensor: SquareTensor<T>,
    /// Norm removed by normalization.
    pub norm: f64,
    /// Truncation error of the chosen direction.
    pub error: f64,
    /// Chosen direction.
    pub direction: Direction,
    /// Applied projector.
    pub projector: Matrix<T>,
}

/// Append-only record of the renormalization.
///
/// Entry 0 of the archive is the normalized initial tensor; entry `k + 1` is
/// the tensor after step `k`.
#[derive(Debug, Clone)]
pub struct History<T> {
    initial: SquareTensor<T>,
    initial_norm: f64,
    steps: Vec<StepRecord<T>>,
}

impl<T: DenseScalar> History<T> {
    fn new(initial: SquareTensor<T>, initial_norm: f64) -> Self {
        Self {
            initial,
            initial_norm,
            steps: Vec::new(),
        }
    }

    /// Number of archived tensors (`steps + 1`).
    pub fn len(&self) -> usize {
        self.steps.len() + 1
    }

    /// Always false: the initial tensor is archived on construction.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn steps(&self) -> &[StepRecord<T>] {
        &self.steps
    }

    /// Archived tensor `idx`.
    pub fn tensor(&self, idx: usize) -> Option<&SquareTensor<T>> {
        match idx {
            0 => Some(&self.initial),
            _ => self.steps.get(idx - 1).map(|s| &s.tensor),
        }
    }

    /// Removed norm of archive entry `idx`.
    pub fn norm(&self, idx: usize) -> Option<f64> {
        match idx {
            0 => Some(self.initial_norm),
            _ => self.steps.get(idx - 1).map(|s| s.norm),
        }
    }

    /// Most recent tensor.
    pub fn last(&self) -> &SquareTensor<T> {
        self.steps.last().map_or(&self.initial, |s| &s.tensor)
    }
}

/// HOTRG engine over scalar `T` with numeric backend `B`.
#[derive(Debug, Clone)]
pub struct Hotrg<T, B = FaerBackend> {
    backend: B,
    options: HotrgOptions,
    templates: DirectionalTemplates,
    history: History<T>,
}

impl<T: DenseScalar> Hotrg<T, FaerBackend> {
    /// Start from `tensor` with the default backend.
    ///
    /// # Errors
    /// Returns `HotrgError` if the tensor is empty, zero or non-finite, or
    /// the options are invalid.
    pub fn new(tensor: SquareTensor<T>, options: HotrgOptions) -> Result<Self> {
        Self::with_backend(FaerBackend, tensor, options)
    }

    /// Start from row-major `u, d, l, r` data of dimension `dim` per leg,
    /// representing a single site.
    pub fn from_array(data: Vec<T>, dim: usize, options: HotrgOptions) -> Result<Self> {
        Self::new(SquareTensor::from_array(data, dim)?, options)
    }
}

impl<T: DenseScalar, B: NumericBackend> Hotrg<T, B> {
    /// Start from `tensor` with an explicit backend.
    pub fn with_backend(backend: B, mut tensor: SquareTensor<T>, options: HotrgOptions) -> Result<Self> {
        options.validate()?;
        if tensor.tensor().is_empty() {
            return Err(HotrgError::EmptyTensor);
        }
        let norm = tensor.normalize();
        if !norm.is_finite() {
            return Err(HotrgError::NonFiniteTensor(norm));
        }
        if norm == 0.0 {
            return Err(HotrgError::ZeroTensor);
        }
        tracing::debug!(
            dims = ?tensor.dims(),
            norm,
            chi_h = options.chi(Axis::Horizontal),
            chi_v = options.chi(Axis::Vertical),
            "initialized HOTRG"
        );
        Ok(Self {
            backend,
            options,
            templates: DirectionalTemplates::new()?,
            history: History::new(tensor, norm),
        })
    }

    pub fn options(&self) -> &HotrgOptions {
        &self.options
    }

    pub fn history(&self) -> &History<T> {
        &self.history
    }

    /// Current (most recent, normalized) tensor.
    pub fn current(&self) -> &SquareTensor<T> {
        self.history.last()
    }

    /// Number of steps performed.
    pub fn iterations(&self) -> usize {
        self.history.steps.len()
    }

    /// Environment and truncated projector of the current tensor for one
    /// direction.
    pub fn direction_trial(&self, direction: Direction) -> Result<SpectralProjection<T>> {
        let env = self.templates.build_environment(direction, self.current())?;
        let params = self.options.truncation(direction.axis());
        let trial = solve_environment(&self.backend, &env, &params)?;
        tracing::trace!(
            %direction,
            error = trial.error,
            rank = trial.rank(),
            kept = trial.kept,
            "direction trial"
        );
        Ok(trial)
    }

    /// Perform one coarse-graining step.
    ///
    /// Directions are tried in the order `up, down, left, right`; a later
    /// direction wins only with a strictly smaller error. Nothing is recorded
    /// unless the whole step succeeds.
    pub fn iterate(&mut self) -> Result<&StepRecord<T>> {
        let mut best_direction = Direction::ALL[0];
        let mut best = self.direction_trial(best_direction)?;
        for &direction in &Direction::ALL[1..] {
            let trial = self.direction_trial(direction)?;
            if trial.error < best.error {
                best_direction = direction;
                best = trial;
            }
        }

        let current = self.current();
        let dof = current
            .degree_of_freedom()
            .checked_mul(2)
            .ok_or(HotrgError::DegreeOfFreedomOverflow(current.degree_of_freedom()))?;
        let merged = self
            .templates
            .apply_projector(best_direction, &best.projector, current, current)?;
        let mut next = SquareTensor::new(merged, dof)?;
        let norm = next.normalize();

        tracing::debug!(
            iteration = self.history.steps.len(),
            direction = %best_direction,
            error = best.error,
            norm,
            dims = ?next.dims(),
            "HOTRG step"
        );

        self.history.steps.push(StepRecord {
            tensor: next,
            norm,
            error: best.error,
            direction: best_direction,
            projector: best.projector,
        });
        let index = self.history.steps.len() - 1;
        Ok(&self.history.steps[index])
    }

    /// Replay step `step` on a pair of tensors.
    ///
    /// `tensors[0]` takes the place of the first copy (above for horizontal
    /// steps, left for vertical steps) and `tensors[1]` of the second. Both
    /// must have the dimensions of archive entry `step`. The result is not
    /// normalized; its degree of freedom is the sum of the inputs'. The
    /// history is not modified.
    pub fn impurity_iterate(&self, tensors: &[SquareTensor<T>], step: usize) -> Result<SquareTensor<T>> {
        if tensors.len() != IMPURITY_PARTS {
            return Err(HotrgError::ImpurityArity {
                expected: IMPURITY_PARTS,
                got: tensors.len(),
            });
        }
        let iterations = self.iterations();
        let record = self
            .history
            .steps
            .get(step)
            .ok_or(HotrgError::StepOutOfRange { step, iterations })?;
        let expected = self
            .history
            .tensor(step)
            .ok_or(HotrgError::StepOutOfRange { step, iterations })?
            .dims();
        for t in tensors {
            if t.dims() != expected {
                return Err(HotrgError::DimensionMismatch {
                    expected: expected.to_vec(),
                    got: t.dims().to_vec(),
                });
            }
        }

        let (a, b) = (&tensors[0], &tensors[1]);
        let dof = a
            .degree_of_freedom()
            .checked_add(b.degree_of_freedom())
            .ok_or(HotrgError::DegreeOfFreedomOverflow(a.degree_of_freedom()))?;
        let merged = self
            .templates
            .apply_projector(record.direction, &record.projector, a, b)?;
        SquareTensor::new(merged, dof)
    }

    /// Removed norm of archive entry `idx`.
    pub fn norm(&self, idx: usize) -> Result<f64> {
        self.history.norm(idx).ok_or(HotrgError::IndexOutOfRange {
            index: idx,
            len: self.history.len(),
        })
    }

    /// Trace of archive entry `idx`.
    pub fn pure_tensor_trace(&self, idx: usize) -> Result<T> {
        self.history
            .tensor(idx)
            .map(SquareTensor::trace)
            .ok_or(HotrgError::IndexOutOfRange {
                index: idx,
                len: self.history.len(),
            })
    }

    /// Trace of an arbitrary square tensor (`u` with `d`, `l` with `r`).
    pub fn tensor_trace(&self, tensor: &SquareTensor<T>) -> T {
        tensor.trace()
    }

    /// Log partition function per site, one value per archive entry.
    ///
    /// Entry `i` is `Σ_{j ≤ i} ln(norm_j) / dof_j + ln(trace_i) / dof_i`,
    /// using the real part of the trace.
    pub fn log_z_density(&self) -> Vec<f64> {
        let mut acc = 0.0;
        (0..self.history.len())
            .filter_map(|i| {
                let tensor = self.history.tensor(i)?;
                let norm = self.history.norm(i)?;
                let dof = tensor.degree_of_freedom() as f64;
                acc += norm.ln() / dof;
                Some(acc + ComplexFloat::re(tensor.trace()).ln() / dof)
            })
            .collect()
    }

    /// Normalized tensors, initial first.
    pub fn archive(&self) -> Vec<&SquareTensor<T>> {
        (0..self.history.len())
            .filter_map(|i| self.history.tensor(i))
            .collect()
    }

    /// Removed norms, one per archive entry.
    pub fn norms(&self) -> Vec<f64> {
        (0..self.history.len())
            .filter_map(|i| self.history.norm(i))
            .collect()
    }

    /// Truncation errors, one per step.
    pub fn errors(&self) -> Vec<f64> {
        self.history.steps.iter().map(|s| s.error).collect()
    }

    /// Chosen directions, one per step.
    pub fn directions(&self) -> Vec<Direction> {
        self.history.steps.iter().map(|s| s.direction).collect()
    }

    /// Applied projectors, one per step.
    pub fn projectors(&self) -> Vec<&Matrix<T>> {
        self.history.steps.iter().map(|s| &s.projector).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults() {
        let opts = HotrgOptions::new();
        assert_eq!(opts.chi(Axis::Horizontal), DEFAULT_CHI);
        assert_eq!(opts.chi(Axis::Vertical), DEFAULT_CHI);

        let opts = opts.with_chi_h(4).with_chi_v(6).with_threshold(1e-8);
        assert_eq!(opts.truncation(Axis::Horizontal).max_rank, Some(4));
        assert_eq!(opts.truncation(Axis::Vertical).max_rank, Some(6));
        assert_eq!(opts.truncation(Axis::Vertical).threshold, Some(1e-8));
    }

    #[test]
    fn test_rejects_invalid_options() {
        let data = vec![1.0_f64; 16];
        assert!(matches!(
            Hotrg::from_array(data.clone(), 2, HotrgOptions::new().with_chi(0)),
            Err(HotrgError::InvalidOptions { .. })
        ));
        assert!(matches!(
            Hotrg::from_array(data, 2, HotrgOptions::new().with_threshold(-1.0)),
            Err(HotrgError::InvalidTolerance(_))
        ));
    }

    #[test]
    fn test_rejects_empty_and_zero_tensors() {
        assert!(matches!(
            Hotrg::<f64>::from_array(vec![], 0, HotrgOptions::new()),
            Err(HotrgError::EmptyTensor)
        ));
        assert!(matches!(
            Hotrg::<f64>::from_array(vec![0.0; 16], 2, HotrgOptions::new()),
            Err(HotrgError::ZeroTensor)
        ));
    }

    #[test]
    fn test_rejects_non_finite_tensor() {
        let mut data = vec![1.0_f64; 16];
        data[5] = f64::NAN;
        assert!(matches!(
            Hotrg::from_array(data, 2, HotrgOptions::new()),
            Err(HotrgError::NonFiniteTensor(n)) if n.is_nan()
        ));

        let mut data = vec![1.0_f64; 16];
        data[0] = f64::INFINITY;
        assert!(matches!(
            Hotrg::from_array(data, 2, HotrgOptions::new()),
            Err(HotrgError::NonFiniteTensor(_))
        ));
    }

    #[test]
    fn test_norm_index_checked() {
        let engine = Hotrg::from_array(vec![1.0_f64; 16], 2, HotrgOptions::new()).unwrap();
        assert_eq!(engine.norm(0).unwrap(), 4.0);
        assert!(matches!(
            engine.norm(1),
            Err(HotrgError::IndexOutOfRange { index: 1, len: 1 })
        ));
        assert!(engine.pure_tensor_trace(1).is_err());
    }

    #[test]
    fn test_history_accessors_lengths() {
        let mut engine = Hotrg::from_array(vec![1.0_f64; 16], 2, HotrgOptions::new().with_chi(2)).unwrap();
        for _ in 0..3 {
            engine.iterate().unwrap();
        }
        assert_eq!(engine.archive().len(), 4);
        assert_eq!(engine.norms().len(), 4);
        assert_eq!(engine.errors().len(), 3);
        assert_eq!(engine.directions().len(), 3);
        assert_eq!(engine.projectors().len(), 3);
        assert_eq!(engine.log_z_density().len(), 4);
        assert_eq!(engine.history().len(), 4);
        assert_eq!(engine.current().degree_of_freedom(), 8);
    }
}
