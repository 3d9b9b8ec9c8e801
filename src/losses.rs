//! Reference candidates: loss functions paired with their analytic gradients.
//!
//! Each returns `(value, gradient)` with the gradient shaped like the input,
//! which is exactly what the gradient checker consumes.
use num::traits::real::Real;
use thiserror::Error;

use crate::tensor::{Numeric, Tensor};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LossError {
    #[error("expected a 1-d score vector, got shape {0:?}")]
    NotAVector(Vec<usize>),
    #[error("target class {target} is out of range for {classes} classes")]
    TargetOutOfRange { target: usize, classes: usize },
}

/// `(Σx, 1)`
pub fn sum<T: Numeric>(x: &Tensor<T>) -> (T, Tensor<T>) {
    (x.sum(), Tensor::ones_like(x))
}

/// `(Σx², 2x)`
pub fn sum_of_squares<T: Numeric>(x: &Tensor<T>) -> (T, Tensor<T>) {
    let two = T::one() + T::one();
    (x.map(|v| v * v).sum(), x.map(|v| two * v))
}

/// L2 penalty on weights: `(strength·Σw², 2·strength·w)`.
pub fn l2_regularization<T: Numeric>(w: &Tensor<T>, strength: T) -> (T, Tensor<T>) {
    let (loss, grad) = sum_of_squares(w);
    (strength * loss, grad.map(|g| strength * g))
}

/// Class probabilities for a 1-d score vector.
///
/// Scores are shifted by their maximum before exponentiating so large scores
/// don't overflow.
pub fn softmax<T>(predictions: &Tensor<T>) -> Result<Tensor<T>, LossError>
where
    T: Numeric + Real,
{
    if predictions.shape().len() != 1 {
        return Err(LossError::NotAVector(predictions.shape().to_vec()));
    }
    let max = predictions
        .iter()
        .copied()
        .fold(T::min_value(), |acc, v| acc.max(v));
    let exps = predictions.map(|v| (v - max).exp());
    let total = exps.sum();
    Ok(exps.map(|e| e / total))
}

/// Cross-entropy of the softmax of `predictions` against a single target
/// class, with gradient `softmax(x) - onehot(target)`.
///
/// ```
/// # use rust_gradcheck::losses::softmax_with_cross_entropy;
/// # use rust_gradcheck::tensor::Tensor;
/// let scores = Tensor::from([0.0, 0.0]);
/// let (loss, grad) = softmax_with_cross_entropy(&scores, 1).unwrap();
///
/// assert!((loss - 2f64.ln()).abs() < 1e-12);
/// assert_eq!(grad.as_slice(), &[0.5, -0.5]);
/// ```
pub fn softmax_with_cross_entropy<T>(
    predictions: &Tensor<T>,
    target: usize,
) -> Result<(T, Tensor<T>), LossError>
where
    T: Numeric + Real,
{
    let mut probs = softmax(predictions)?;
    let classes = probs.len();
    let p_target = match probs.get_mut(&[target]) {
        Ok(p) => p,
        Err(_) => return Err(LossError::TargetOutOfRange { target, classes }),
    };
    let loss = -p_target.ln();
    *p_target = *p_target - T::one();
    Ok((loss, probs))
}
