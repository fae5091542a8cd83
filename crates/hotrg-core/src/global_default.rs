//! Global default values with atomic access.
//!
//! Used for process-wide tolerances such as the eigenvalue threshold of the
//! spectral projector.

use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Error for invalid tolerance values.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[error("Invalid tolerance value: {0}. Tolerances must be finite and non-negative.")]
pub struct InvalidToleranceError(pub f64);

/// A global default f64 value with atomic access.
///
/// # Example
///
/// ```
/// use hotrg_core::GlobalDefault;
///
/// static MY_DEFAULT: GlobalDefault = GlobalDefault::new(1e-10);
///
/// assert_eq!(MY_DEFAULT.get(), 1e-10);
/// MY_DEFAULT.set(1e-12).unwrap();
/// assert!(MY_DEFAULT.set(-1.0).is_err());
/// ```
pub struct GlobalDefault {
    value: AtomicU64,
}

impl GlobalDefault {
    /// Create a new global default with the given initial value.
    #[must_use]
    pub const fn new(initial: f64) -> Self {
        Self {
            value: AtomicU64::new(initial.to_bits()),
        }
    }

    /// Get the current default value.
    #[must_use]
    pub fn get(&self) -> f64 {
        f64::from_bits(self.value.load(Ordering::Relaxed))
    }

    /// Set a new default value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToleranceError` if the value is not finite or is negative.
    pub fn set(&self, value: f64) -> Result<(), InvalidToleranceError> {
        validate_tolerance(value)?;
        self.value.store(value.to_bits(), Ordering::Relaxed);
        Ok(())
    }
}

/// Check that a tolerance is finite and non-negative.
pub fn validate_tolerance(value: f64) -> Result<f64, InvalidToleranceError> {
    if !value.is_finite() || value < 0.0 {
        return Err(InvalidToleranceError(value));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_default() {
        static TEST_DEFAULT: GlobalDefault = GlobalDefault::new(1e-10);

        assert!((TEST_DEFAULT.get() - 1e-10).abs() < 1e-20);

        TEST_DEFAULT.set(1e-8).unwrap();
        assert!((TEST_DEFAULT.get() - 1e-8).abs() < 1e-20);
    }

    #[test]
    fn test_invalid_values_keep_previous() {
        static TEST_DEFAULT: GlobalDefault = GlobalDefault::new(1e-10);

        assert!(TEST_DEFAULT.set(f64::NAN).is_err());
        assert!(TEST_DEFAULT.set(f64::INFINITY).is_err());
        assert!(TEST_DEFAULT.set(-1.0).is_err());
        assert_eq!(TEST_DEFAULT.get(), 1e-10);
    }

    #[test]
    fn test_error_display() {
        let err = InvalidToleranceError(-1.0);
        let msg = format!("{}", err);
        assert!(msg.contains("-1"));
        assert!(msg.contains("non-negative"));
    }
}
