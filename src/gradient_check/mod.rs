//! Finite-difference checking of hand-written gradients.
//!
//! A candidate function reports `(value, gradient)` at a point. The checker
//! perturbs one coordinate at a time by `±delta`, estimates the partial
//! derivative with the two-point formula and compares it against the
//! reported gradient, stopping at the first coordinate that disagrees.
//!
//! ```
//! # use rust_gradcheck::gradient_check::check_gradient_default;
//! # use rust_gradcheck::tensor::Tensor;
//! let mut x = Tensor::new(vec![1.0, -2.0, 0.5, 3.0], vec![2, 2]).unwrap();
//! let square = |x: &mut Tensor<f64>| (x.map(|v| v * v).sum(), x.map(|v| 2.0 * v));
//!
//! assert_eq!(check_gradient_default(square, &mut x), Ok(true));
//! ```
mod error;
mod perturbation;

use itertools::Itertools;
use std::fmt;

pub use error::GradCheckError;
use perturbation::central_difference;

use crate::tensor::{Numeric, Tensor};

pub const DEFAULT_DELTA: f64 = 1e-5;
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Something that can report its value and analytic gradient at a point.
///
/// The point is handed over mutably so a candidate that writes into its
/// input can be caught; well-behaved candidates only read it.
pub trait GradientFn<T: Numeric> {
    fn value_and_grad(&mut self, x: &mut Tensor<T>) -> (T, Tensor<T>);
}

impl<T, F> GradientFn<T> for F
where
    T: Numeric,
    F: FnMut(&mut Tensor<T>) -> (T, Tensor<T>),
{
    fn value_and_grad(&mut self, x: &mut Tensor<T>) -> (T, Tensor<T>) {
        self(x)
    }
}

/// Result of a check that ran to completion.
#[derive(Debug, Clone, PartialEq)]
pub enum GradCheckOutcome {
    Passed,
    /// First coordinate, in row-major order, where the gradients disagree.
    Mismatch {
        index: Vec<usize>,
        analytic: f64,
        numeric: f64,
    },
}

impl GradCheckOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, GradCheckOutcome::Passed)
    }
}

impl fmt::Display for GradCheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradCheckOutcome::Passed => write!(f, "Gradient check passed!"),
            GradCheckOutcome::Mismatch {
                index,
                analytic,
                numeric,
            } => write!(
                f,
                "Gradients are different at {}. Analytic: {:.5}, Numeric: {:.5}",
                format_index(index),
                analytic,
                numeric
            ),
        }
    }
}

/// A multi-index written as a tuple: `()`, `(3,)`, `(0, 2)`.
fn format_index(index: &[usize]) -> String {
    match index {
        [single] => format!("({single},)"),
        _ => format!("({})", index.iter().join(", ")),
    }
}

/// `|a - b| <= tol * max(1, |b|)`, with `b` as the reference value.
///
/// The tolerance is absolute near zero and relative for large magnitudes.
/// NaN is never close to anything.
pub fn is_close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol * b.abs().max(1.0)
}

pub(crate) fn as_f64<T: Numeric>(value: T) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientChecker {
    delta: f64,
    tol: f64,
    report: bool,
}

impl Default for GradientChecker {
    fn default() -> Self {
        GradientChecker {
            delta: DEFAULT_DELTA,
            tol: DEFAULT_TOLERANCE,
            report: true,
        }
    }
}

impl GradientChecker {
    pub fn new(delta: f64, tol: f64) -> Result<GradientChecker, GradCheckError> {
        GradientChecker::default().with_delta(delta)?.with_tol(tol)
    }

    pub fn with_delta(self, delta: f64) -> Result<GradientChecker, GradCheckError> {
        if !(delta.is_finite() && delta > 0.0) {
            return Err(GradCheckError::InvalidDelta(delta));
        }
        Ok(GradientChecker { delta, ..self })
    }

    pub fn with_tol(self, tol: f64) -> Result<GradientChecker, GradCheckError> {
        if !(tol.is_finite() && tol > 0.0) {
            return Err(GradCheckError::InvalidTolerance(tol));
        }
        Ok(GradientChecker { tol, ..self })
    }

    /// Don't print the pass/fail line.
    pub fn quiet(self) -> GradientChecker {
        GradientChecker {
            report: false,
            ..self
        }
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn tol(&self) -> f64 {
        self.tol
    }

    /// Compare the analytic gradient of `f` at `x` against central differences.
    ///
    /// `x` is perturbed one coordinate at a time and each perturbed coordinate
    /// is put back before this returns, whatever the result. Only that
    /// coordinate is restored: `f` is checked for writing into its input after
    /// the first evaluation only, so writes `f` makes to other coordinates
    /// during a later perturbed evaluation stay in `x`.
    ///
    /// # Errors
    ///
    /// A [`GradCheckError`] when `x` is not floating-point or is empty, when
    /// `f` writes into its input, or when the reported gradient has the wrong
    /// shape, or when `x[i] ± delta` leaves the element type's finite range.
    /// A gradient that is merely wrong gives
    /// `Ok(GradCheckOutcome::Mismatch { .. })`.
    pub fn check<T, F>(
        &self,
        mut f: F,
        x: &mut Tensor<T>,
    ) -> Result<GradCheckOutcome, GradCheckError>
    where
        T: Numeric,
        F: GradientFn<T>,
    {
        if !x.dtype().is_float() {
            return Err(GradCheckError::NonFloatDType(x.dtype()));
        }
        if x.is_empty() {
            return Err(GradCheckError::EmptyInput);
        }

        let orig_x = x.clone();
        let (_fx, analytic_grad) = f.value_and_grad(x);
        self.ensure_unmodified(&orig_x, x)?;

        if !analytic_grad.same_shape(x) {
            return Err(GradCheckError::GradientShapeMismatch {
                expected: x.shape().to_vec(),
                actual: analytic_grad.shape().to_vec(),
            });
        }

        for index in x.iter_indices() {
            let analytic = as_f64(*analytic_grad.get(&index)?);
            let numeric = central_difference(&mut f, x, &index, self.delta)?;

            if !is_close(numeric, analytic, self.tol) {
                let outcome = GradCheckOutcome::Mismatch {
                    index,
                    analytic,
                    numeric,
                };
                self.print(&outcome);
                return Ok(outcome);
            }
        }

        let outcome = GradCheckOutcome::Passed;
        self.print(&outcome);
        Ok(outcome)
    }

    /// The full central-difference gradient of `f` at `x`.
    ///
    /// Unlike [`check`](Self::check) this evaluates every coordinate and
    /// ignores the analytic gradient entirely.
    pub fn numeric_gradient<T, F>(
        &self,
        mut f: F,
        x: &mut Tensor<T>,
    ) -> Result<Tensor<f64>, GradCheckError>
    where
        T: Numeric,
        F: GradientFn<T>,
    {
        if !x.dtype().is_float() {
            return Err(GradCheckError::NonFloatDType(x.dtype()));
        }
        let mut grad = Tensor::new_with_filler(x.shape().to_vec(), 0.0);
        for index in x.iter_indices() {
            let numeric = central_difference(&mut f, x, &index, self.delta)?;
            grad.set(&index, numeric)?;
        }
        Ok(grad)
    }

    // The candidate must leave its input alone. Uses the same `tol` as the
    // gradient comparison.
    fn ensure_unmodified<T: Numeric>(
        &self,
        orig_x: &Tensor<T>,
        x: &mut Tensor<T>,
    ) -> Result<(), GradCheckError> {
        let changed = x
            .iter_indices()
            .zip(orig_x.iter().zip(x.iter()))
            .find(|(_, (before, after))| !is_close(as_f64(**after), as_f64(**before), self.tol))
            .map(|(index, _)| index);

        match changed {
            Some(index) => {
                x.clone_from(orig_x);
                Err(GradCheckError::InputMutated { index })
            }
            None => Ok(()),
        }
    }

    fn print(&self, outcome: &GradCheckOutcome) {
        if self.report {
            println!("{outcome}");
        }
    }
}

/// Check `f`'s gradient at `x` with the given step and tolerance.
///
/// Prints a line describing the outcome and returns whether every coordinate
/// agreed.
pub fn check_gradient<T, F>(
    f: F,
    x: &mut Tensor<T>,
    delta: f64,
    tol: f64,
) -> Result<bool, GradCheckError>
where
    T: Numeric,
    F: GradientFn<T>,
{
    let checker = GradientChecker::new(delta, tol)?;
    checker.check(f, x).map(|outcome| outcome.passed())
}

/// [`check_gradient`] with `delta = 1e-5` and `tol = 1e-4`.
pub fn check_gradient_default<T, F>(f: F, x: &mut Tensor<T>) -> Result<bool, GradCheckError>
where
    T: Numeric,
    F: GradientFn<T>,
{
    check_gradient(f, x, DEFAULT_DELTA, DEFAULT_TOLERANCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadratic(x: &mut Tensor<f64>) -> (f64, Tensor<f64>) {
        (x.map(|v| v * v).sum(), x.map(|v| 2.0 * v))
    }

    fn missing_factor_of_two(x: &mut Tensor<f64>) -> (f64, Tensor<f64>) {
        (x.map(|v| v * v).sum(), x.clone())
    }

    #[test]
    fn test_is_close_scales_with_reference() {
        assert!(is_close(0.0, 5e-5, 1e-4));
        assert!(!is_close(0.0, 5e-4, 1e-4));
        assert!(is_close(1000.05, 1000.0, 1e-4));
        assert!(!is_close(1000.2, 1000.0, 1e-4));
        assert!(!is_close(f64::NAN, 0.0, 1e-4));
        assert!(!is_close(0.0, f64::NAN, 1e-4));
    }

    #[test]
    fn test_checker_validates_parameters() {
        assert_eq!(
            GradientChecker::new(0.0, 1e-4),
            Err(GradCheckError::InvalidDelta(0.0))
        );
        assert_eq!(
            GradientChecker::new(1e-5, -1.0),
            Err(GradCheckError::InvalidTolerance(-1.0))
        );
        assert!(GradientChecker::new(f64::NAN, 1e-4).is_err());
        let checker = GradientChecker::new(1e-3, 1e-2).unwrap();
        assert_eq!(checker.delta(), 1e-3);
        assert_eq!(checker.tol(), 1e-2);
    }

    #[test]
    fn test_default_checker() {
        let checker = GradientChecker::default();
        assert_eq!(checker.delta(), DEFAULT_DELTA);
        assert_eq!(checker.tol(), DEFAULT_TOLERANCE);
    }

    #[test]
    fn test_mismatch_reports_first_coordinate() {
        // 2x - x is within tolerance only where |x| is tiny
        let mut x = Tensor::new(vec![0.0, 0.0, 3.0, -1.0], vec![2, 2]).unwrap();
        let outcome = GradientChecker::default()
            .quiet()
            .check(missing_factor_of_two, &mut x)
            .unwrap();

        match outcome {
            GradCheckOutcome::Mismatch {
                index,
                analytic,
                numeric,
            } => {
                assert_eq!(index, vec![1, 0]);
                assert_eq!(analytic, 3.0);
                assert!((numeric - 6.0).abs() < 1e-6);
            }
            GradCheckOutcome::Passed => panic!("wrong gradient was accepted"),
        }
    }

    #[test]
    fn test_mismatch_stops_scanning() {
        let mut calls = 0;
        let mut x = Tensor::from([5.0, 6.0, 7.0]);
        let counting = |x: &mut Tensor<f64>| {
            calls += 1;
            missing_factor_of_two(x)
        };
        let outcome = GradientChecker::default().quiet().check(counting, &mut x);
        assert!(!outcome.unwrap().passed());
        // one initial evaluation plus two for the first coordinate
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_outcome_display() {
        let outcome = GradCheckOutcome::Mismatch {
            index: vec![0, 2],
            analytic: 1.0,
            numeric: 2.123456,
        };
        assert_eq!(
            outcome.to_string(),
            "Gradients are different at (0, 2). Analytic: 1.00000, Numeric: 2.12346"
        );
        assert_eq!(GradCheckOutcome::Passed.to_string(), "Gradient check passed!");

        let single = GradCheckOutcome::Mismatch {
            index: vec![3],
            analytic: 0.5,
            numeric: 1.0,
        };
        assert_eq!(
            single.to_string(),
            "Gradients are different at (3,). Analytic: 0.50000, Numeric: 1.00000"
        );
        assert_eq!(format_index(&[]), "()");
    }

    #[test]
    fn test_scalar_point() {
        let mut x = Tensor::scalar(1.5);
        let outcome = GradientChecker::default().quiet().check(quadratic, &mut x);
        assert_eq!(outcome, Ok(GradCheckOutcome::Passed));
        assert_eq!(x, Tensor::scalar(1.5));
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let mut x: Tensor<f64> = Tensor::new(vec![], vec![0, 3]).unwrap();
        assert_eq!(
            GradientChecker::default().check(quadratic, &mut x),
            Err(GradCheckError::EmptyInput)
        );
    }

    #[test]
    fn test_mutated_input_is_restored() {
        let mut x = Tensor::from([1.0, 2.0]);
        let scribble = |x: &mut Tensor<f64>| {
            x.set(&[1], 100.0).unwrap();
            quadratic(x)
        };
        assert_eq!(
            GradientChecker::default().check(scribble, &mut x),
            Err(GradCheckError::InputMutated { index: vec![1] })
        );
        assert_eq!(x.as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn test_step_beyond_f32_range() {
        let mut x = Tensor::from([f32::MAX]);
        let linear = |x: &mut Tensor<f32>| (x.sum(), Tensor::ones_like(x));
        let checker = GradientChecker::new(1e38, 1e-4).unwrap().quiet();
        assert!(matches!(
            checker.check(linear, &mut x),
            Err(GradCheckError::Unrepresentable { index, .. }) if index == vec![0]
        ));
        assert_eq!(x.as_slice(), &[f32::MAX]);
    }

    #[test]
    fn test_writes_during_perturbed_calls_are_kept() {
        let mut calls = 0;
        let mut x = Tensor::from([1.0, 2.0]);
        let late_scribble = |x: &mut Tensor<f64>| {
            calls += 1;
            if calls == 2 {
                x.set(&[1], 50.0).unwrap();
            }
            quadratic(x)
        };
        let outcome = GradientChecker::default().quiet().check(late_scribble, &mut x);
        assert!(outcome.is_ok());
        assert_eq!(x.as_slice(), &[1.0, 50.0]);
    }

    #[test]
    fn test_numeric_gradient() {
        let mut x = Tensor::new(vec![1.0, -2.0, 0.5], vec![3, 1]).unwrap();
        let grad = GradientChecker::default()
            .numeric_gradient(quadratic, &mut x)
            .unwrap();
        assert_eq!(grad.shape(), &[3, 1]);
        for (&g, &v) in grad.iter().zip(x.iter()) {
            assert!((g - 2.0 * v).abs() < 1e-6);
        }
    }

    #[test]
    fn test_f32_point() {
        let mut x = Tensor::from([0.5f32, -1.0, 2.0]);
        let linear = |x: &mut Tensor<f32>| (x.sum(), Tensor::ones_like(x));
        let checker = GradientChecker::new(1e-2, 1e-3).unwrap().quiet();
        assert_eq!(checker.check(linear, &mut x), Ok(GradCheckOutcome::Passed));
    }
}
