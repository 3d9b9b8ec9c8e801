use super::error::GradCheckError;
use super::{as_f64, GradientFn};
use crate::tensor::{NumCast, Numeric, Tensor};

/// Holds one coordinate of a tensor away from its original value.
///
/// The original element is written back when the guard is dropped, so the
/// tensor is restored even if the candidate function panics while perturbed.
pub(super) struct Perturbation<'a, T: Numeric> {
    tensor: &'a mut Tensor<T>,
    index: &'a [usize],
    original: T,
}

impl<'a, T: Numeric> Perturbation<'a, T> {
    pub(super) fn new(
        tensor: &'a mut Tensor<T>,
        index: &'a [usize],
    ) -> Result<Self, GradCheckError> {
        let original = *tensor.get(index)?;
        Ok(Perturbation {
            tensor,
            index,
            original,
        })
    }

    /// Move the coordinate to `original + step`.
    pub(super) fn shift(&mut self, step: f64) -> Result<(), GradCheckError> {
        let original = as_f64(self.original);
        let value = original + step;
        let unrepresentable = || GradCheckError::Unrepresentable {
            index: self.index.to_vec(),
            value,
        };
        let shifted = <T as NumCast>::from(value).ok_or_else(unrepresentable)?;
        // float casts saturate to infinity instead of failing
        if original.is_finite() && !as_f64(shifted).is_finite() {
            return Err(unrepresentable());
        }
        self.tensor.set(self.index, shifted)?;
        Ok(())
    }

    /// Evaluate `f` at the current (perturbed) point, keeping only the value.
    pub(super) fn value_of<F>(&mut self, f: &mut F) -> f64
    where
        F: GradientFn<T>,
    {
        as_f64(f.value_and_grad(self.tensor).0)
    }
}

impl<T: Numeric> Drop for Perturbation<'_, T> {
    fn drop(&mut self) {
        // index was validated in `new`
        if let Ok(slot) = self.tensor.get_mut(self.index) {
            *slot = self.original;
        }
    }
}

/// Two-point estimate of the partial derivative of `f` along `index`.
pub(super) fn central_difference<T, F>(
    f: &mut F,
    x: &mut Tensor<T>,
    index: &[usize],
    delta: f64,
) -> Result<f64, GradCheckError>
where
    T: Numeric,
    F: GradientFn<T>,
{
    let mut perturbation = Perturbation::new(x, index)?;
    perturbation.shift(delta)?;
    let fx_right = perturbation.value_of(f);
    perturbation.shift(-delta)?;
    let fx_left = perturbation.value_of(f);
    drop(perturbation);

    Ok((fx_right - fx_left) / (2.0 * delta))
}
