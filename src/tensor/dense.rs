use itertools::Itertools;
use std::fmt;
use std::ops::{Index, IndexMut};

use super::error::TensorError;
use super::numeric::*;
use super::utils::{global_index, IndexIterator};

/// The core `struct` in this library: an owned, row-major n-dimensional array.
#[derive(Debug, PartialEq, Clone)]
pub struct Tensor<T>
where
    T: Numeric,
{
    array: Vec<T>,
    shape: Vec<usize>,
}

impl<T> Tensor<T>
where
    T: Numeric,
{
    pub fn new(array: Vec<T>, shape: Vec<usize>) -> Result<Tensor<T>, TensorError> {
        let len = shape.iter().product::<usize>();
        if len != array.len() {
            return Err(TensorError::ShapeMismatch {
                shape,
                expected_len: len,
                actual_len: array.len(),
            });
        }
        Ok(Tensor { array, shape })
    }

    /// Note! An empty shape gives a scalar.
    pub fn new_with_filler(shape: Vec<usize>, filler: T) -> Tensor<T> {
        let total = shape.iter().product::<usize>();
        Tensor {
            array: vec![filler; total],
            shape,
        }
    }

    /// A matrix from equally long rows.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Tensor<T>, TensorError> {
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return Err(TensorError::Ragged);
        }
        let shape = vec![rows.len(), width];
        let array = rows.into_iter().flatten().collect();
        Tensor::new(array, shape)
    }

    pub fn scalar(scalar: T) -> Tensor<T> {
        Tensor {
            array: vec![scalar],
            shape: vec![],
        }
    }

    pub fn zeros_like(other: &Tensor<T>) -> Tensor<T> {
        Tensor::new_with_filler(other.shape.clone(), T::zero())
    }

    pub fn ones_like(other: &Tensor<T>) -> Tensor<T> {
        Tensor::new_with_filler(other.shape.clone(), T::one())
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    pub fn same_shape(&self, other: &Tensor<T>) -> bool {
        self.shape == other.shape
    }

    fn offset(&self, index: &[usize]) -> Result<usize, TensorError> {
        if index.len() != self.shape.len() {
            return Err(TensorError::RankMismatch {
                index: index.to_vec(),
                shape: self.shape.clone(),
            });
        }
        if let Some(axis) = self
            .shape
            .iter()
            .zip(index.iter())
            .position(|(&dim, &idx_dim)| dim <= idx_dim)
        {
            return Err(TensorError::IndexOutOfBounds {
                index: index.to_vec(),
                shape: self.shape.clone(),
                axis,
            });
        }
        Ok(global_index(index, &self.shape))
    }

    /// ```
    /// # use rust_gradcheck::tensor::*;
    /// let matrix = Tensor::new(vec![0, 1, 2, 3, 4, 5], vec![2, 3]).unwrap();
    ///
    /// assert_eq!(matrix.get(&[1, 0]), Ok(&3));
    /// assert!(matrix.get(&[2, 0]).is_err());
    /// assert!(matrix.get(&[1]).is_err());
    /// ```
    pub fn get(&self, index: &[usize]) -> Result<&T, TensorError> {
        let global_idx = self.offset(index)?;
        Ok(&self.array[global_idx])
    }

    pub fn get_mut(&mut self, index: &[usize]) -> Result<&mut T, TensorError> {
        let global_idx = self.offset(index)?;
        Ok(&mut self.array[global_idx])
    }

    pub fn set(&mut self, index: &[usize], value: T) -> Result<(), TensorError> {
        *self.get_mut(index)? = value;
        Ok(())
    }

    /// Elements in row-major order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.array.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.array
    }

    pub fn map<U, F>(&self, f: F) -> Tensor<U>
    where
        U: Numeric,
        F: FnMut(T) -> U,
    {
        Tensor {
            array: self.array.iter().copied().map(f).collect(),
            shape: self.shape.clone(),
        }
    }

    pub fn sum(&self) -> T {
        self.array.iter().fold(T::zero(), |acc, &x| acc + x)
    }

    pub fn iter_indices(&self) -> IndexIterator {
        IndexIterator::new(self.shape.clone())
    }
}

impl<T: Numeric> Index<&[usize]> for Tensor<T> {
    type Output = T;

    fn index(&self, index: &[usize]) -> &Self::Output {
        match self.get(index) {
            Ok(v) => v,
            Err(e) => panic!("{}", e),
        }
    }
}

impl<T: Numeric> IndexMut<&[usize]> for Tensor<T> {
    fn index_mut(&mut self, index: &[usize]) -> &mut Self::Output {
        match self.get_mut(index) {
            Ok(v) => v,
            Err(e) => panic!("{}", e),
        }
    }
}

impl<T: Numeric> From<T> for Tensor<T> {
    fn from(value: T) -> Self {
        Tensor::scalar(value)
    }
}

impl<T: Numeric> From<Vec<T>> for Tensor<T> {
    fn from(value: Vec<T>) -> Self {
        let shape = vec![value.len()];
        Tensor {
            array: value,
            shape,
        }
    }
}

impl<T: Numeric, const N: usize> From<[T; N]> for Tensor<T> {
    fn from(value: [T; N]) -> Self {
        Tensor::from(value.to_vec())
    }
}

impl<T: Numeric> fmt::Display for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tensor(shape={:?}, dtype={}, [{}])",
            self.shape,
            T::DTYPE,
            self.array.iter().join(", ")
        )
    }
}
