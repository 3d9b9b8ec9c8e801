use thiserror::Error;

use crate::tensor::{DType, TensorError};

/// A contract violation by the caller or by the candidate function.
///
/// These are never used for a numerically wrong gradient; that is reported
/// as [`GradCheckOutcome::Mismatch`](super::GradCheckOutcome::Mismatch).
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum GradCheckError {
    #[error("gradient checking needs a floating-point tensor, got {0}")]
    NonFloatDType(DType),
    #[error("gradient checking needs a non-empty tensor")]
    EmptyInput,
    #[error("functions shouldn't modify input variables (first change at {index:?})")]
    InputMutated { index: Vec<usize> },
    #[error("analytic gradient has shape {actual:?}, input has shape {expected:?}")]
    GradientShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error("step size must be positive and finite, got {0}")]
    InvalidDelta(f64),
    #[error("tolerance must be positive and finite, got {0}")]
    InvalidTolerance(f64),
    #[error("perturbed value {value} at {index:?} is not representable in the tensor's dtype")]
    Unrepresentable { index: Vec<usize>, value: f64 },
    #[error(transparent)]
    Tensor(#[from] TensorError),
}
