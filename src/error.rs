//! Error types for matbench operations.
//!
//! Kernels and constructors report failures through [`MatmulError`] instead of
//! aborting the process, so a benchmark run can skip a configuration and keep
//! going when a buffer cannot be obtained or operands disagree on dimension.

use std::fmt;

/// Errors that can occur while building matrices or running kernels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatmulError {
    /// A dense or CSR buffer could not be allocated.
    AllocationError {
        /// The size in bytes that was requested.
        requested_size: usize,
        /// Human-readable error message.
        message: String,
    },
    /// Operands passed to a kernel do not share the same dimension.
    DimensionMismatch {
        /// Name of the offending operand (`"B"`, `"C"`, `"x"`, ...).
        operand: &'static str,
        /// The dimension every operand must have.
        expected: usize,
        /// The dimension that was found.
        found: usize,
    },
    /// Input validation error.
    ValidationError {
        /// Human-readable error message.
        message: String,
    },
    /// A worker thread could not be started.
    ThreadError {
        /// Human-readable error message.
        message: String,
    },
}

impl fmt::Display for MatmulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatmulError::AllocationError {
                requested_size,
                message,
            } => write!(
                f,
                "Memory allocation failed: {} (requested {} bytes)",
                message, requested_size
            ),
            MatmulError::DimensionMismatch {
                operand,
                expected,
                found,
            } => write!(
                f,
                "Dimension mismatch: operand {} has dimension {} (expected {})",
                operand, found, expected
            ),
            MatmulError::ValidationError { message } => {
                write!(f, "Validation error: {}", message)
            }
            MatmulError::ThreadError { message } => {
                write!(f, "Thread spawn failed: {}", message)
            }
        }
    }
}

impl std::error::Error for MatmulError {}

/// Result type alias for matbench operations.
pub type Result<T> = std::result::Result<T, MatmulError>;

/// Creates an allocation error.
pub fn allocation_error(size: usize, message: impl Into<String>) -> MatmulError {
    MatmulError::AllocationError {
        requested_size: size,
        message: message.into(),
    }
}

/// Creates a dimension mismatch error.
pub fn dimension_error(operand: &'static str, expected: usize, found: usize) -> MatmulError {
    MatmulError::DimensionMismatch {
        operand,
        expected,
        found,
    }
}

/// Creates a validation error.
pub fn validation_error(message: impl Into<String>) -> MatmulError {
    MatmulError::ValidationError {
        message: message.into(),
    }
}

/// Creates a thread error.
pub fn thread_error(message: impl Into<String>) -> MatmulError {
    MatmulError::ThreadError {
        message: message.into(),
    }
}

/// Returns a [`MatmulError::DimensionMismatch`] unless `found == expected`.
#[inline]
pub(crate) fn ensure_dim(operand: &'static str, expected: usize, found: usize) -> Result<()> {
    if found == expected {
        Ok(())
    } else {
        Err(dimension_error(operand, expected, found))
    }
}
