//! Bond-dimension and threshold options shared by the spectral projector
//! and the factorizer.

use crate::global_default::{validate_tolerance, GlobalDefault, InvalidToleranceError};

// Eigenvalues at or below this value are treated as numerically zero.
static DEFAULT_EIGEN_THRESHOLD: GlobalDefault = GlobalDefault::new(1e-10);

/// Get the global default eigenvalue threshold.
///
/// The default value is 1e-10.
pub fn default_eigen_threshold() -> f64 {
    DEFAULT_EIGEN_THRESHOLD.get()
}

/// Set the global default eigenvalue threshold.
///
/// # Errors
/// Returns `InvalidToleranceError` if the threshold is not finite or is negative.
pub fn set_default_eigen_threshold(threshold: f64) -> Result<(), InvalidToleranceError> {
    DEFAULT_EIGEN_THRESHOLD.set(threshold)
}

/// Truncation options.
///
/// - `max_rank` caps the number of kept eigen/singular vectors (the bond
///   dimension χ).
/// - `threshold` is an absolute cutoff: eigenvalues `λ ≤ threshold` count as
///   zero and are never kept.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TruncationParams {
    /// Bond dimension χ; `None` keeps everything.
    pub max_rank: Option<usize>,

    /// Absolute eigenvalue cutoff; `None` falls back to
    /// [`default_eigen_threshold`].
    pub threshold: Option<f64>,
}

impl TruncationParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum rank.
    #[must_use]
    pub fn with_max_rank(mut self, max_rank: usize) -> Self {
        self.max_rank = Some(max_rank);
        self
    }

    /// Set the eigenvalue threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Bond dimension, or `usize::MAX` when unset.
    #[must_use]
    pub fn effective_max_rank(&self) -> usize {
        self.max_rank.unwrap_or(usize::MAX)
    }

    /// Get the effective threshold, falling back to the global default.
    ///
    /// # Errors
    /// Returns `InvalidToleranceError` if the configured threshold is invalid.
    pub fn effective_threshold(&self) -> Result<f64, InvalidToleranceError> {
        validate_tolerance(self.threshold.unwrap_or_else(default_eigen_threshold))
    }
}

/// Option structs that embed [`TruncationParams`].
pub trait HasTruncationParams {
    fn truncation_params(&self) -> &TruncationParams;

    fn truncation_params_mut(&mut self) -> &mut TruncationParams;

    fn max_rank(&self) -> Option<usize> {
        self.truncation_params().max_rank
    }

    /// Set the max_rank value (builder pattern).
    fn with_max_rank(mut self, max_rank: usize) -> Self
    where
        Self: Sized,
    {
        self.truncation_params_mut().max_rank = Some(max_rank);
        self
    }

    /// Set the threshold value (builder pattern).
    fn with_threshold(mut self, threshold: f64) -> Self
    where
        Self: Sized,
    {
        self.truncation_params_mut().threshold = Some(threshold);
        self
    }
}

impl HasTruncationParams for TruncationParams {
    fn truncation_params(&self) -> &TruncationParams {
        self
    }

    fn truncation_params_mut(&mut self) -> &mut TruncationParams {
        self
    }
}
