use rust_gradcheck::gradient_check::{GradCheckError, GradientChecker};
use rust_gradcheck::losses;
use rust_gradcheck::tensor::Tensor;

use rand::prelude::*;
use rand_distr::Normal;

fn main() -> Result<(), GradCheckError> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let mut sample_tensor = |shape: &[usize]| {
        let array = (0..shape.iter().product::<usize>())
            .map(|_| normal.sample(&mut rng))
            .collect();
        Tensor::new(array, shape.to_vec())
    };

    let checker = GradientChecker::default();

    let mut x = sample_tensor(&[3, 4])?;
    println!("x={x}");

    println!("\nsum:");
    checker.check(|x: &mut Tensor<f64>| losses::sum(x), &mut x)?;

    println!("\nsum of squares:");
    checker.check(|x: &mut Tensor<f64>| losses::sum_of_squares(x), &mut x)?;

    println!("\nl2 regularization:");
    checker.check(
        |x: &mut Tensor<f64>| losses::l2_regularization(x, 0.01),
        &mut x,
    )?;

    println!("\nsoftmax with cross entropy:");
    let mut scores = sample_tensor(&[5])?;
    checker.check(
        |x: &mut Tensor<f64>| losses::softmax_with_cross_entropy(x, 2).unwrap(),
        &mut scores,
    )?;

    println!("\nsum of squares with a gradient missing its factor of two:");
    let wrong = |x: &mut Tensor<f64>| (x.map(|v| v * v).sum(), x.clone());
    checker.check(wrong, &mut x)?;

    Ok(())
}
