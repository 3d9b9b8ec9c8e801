pub mod gradient_check;
pub mod losses;
pub mod tensor;

pub use gradient_check::{
    check_gradient, check_gradient_default, GradCheckError, GradCheckOutcome, GradientChecker,
    GradientFn,
};
