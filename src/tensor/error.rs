use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TensorError {
    #[error("array of length {actual_len} does not fit shape {shape:?} (needs {expected_len})")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected_len: usize,
        actual_len: usize,
    },
    #[error("index {index:?} has rank {}, tensor has rank {}", .index.len(), .shape.len())]
    RankMismatch { index: Vec<usize>, shape: Vec<usize> },
    #[error("index {index:?} is out of bounds for shape {shape:?} on axis {axis}")]
    IndexOutOfBounds {
        index: Vec<usize>,
        shape: Vec<usize>,
        axis: usize,
    },
    #[error("nested rows have different shapes")]
    Ragged,
}
