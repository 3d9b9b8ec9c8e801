/// Walks every multi-index of a shape in row-major order, last axis fastest.
///
/// A shape of `[]` has exactly one (empty) index; a shape with a zero-sized
/// axis has none.
pub struct IndexIterator {
    index: Vec<usize>,
    dimensions: Vec<usize>,
    first: bool,
}

impl IndexIterator {
    pub fn new(dimensions: Vec<usize>) -> IndexIterator {
        IndexIterator {
            index: vec![0; dimensions.len()],
            first: !dimensions.contains(&0),
            dimensions,
        }
    }
}

impl Iterator for IndexIterator {
    type Item = Vec<usize>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.first {
            self.first = false;
            return Some(self.index.clone());
        }
        if self.dimensions.contains(&0) {
            return None;
        }
        if increment_index(&mut self.index, &self.dimensions) {
            return Some(self.index.clone());
        }
        None
    }
}

/// Advance `index` to the next position within `shape`.
/// Returns false once the last position has been passed.
pub fn increment_index(index: &mut [usize], shape: &[usize]) -> bool {
    for i in (0..index.len()).rev() {
        if index[i] + 1 < shape[i] {
            index[i] += 1;
            reset_trailing_indices(index, i);
            return true;
        }
    }
    false
}

fn reset_trailing_indices(index: &mut [usize], position: usize) {
    for idx in index.iter_mut().skip(position + 1) {
        *idx = 0;
    }
}

/// Row-major flat offset of `index` into an array of `shape`.
/// Callers check bounds first.
pub(in crate::tensor) fn global_index(index: &[usize], shape: &[usize]) -> usize {
    let mut global_idx = 0;
    let mut multiplier = 1;
    for (&dim, &idx_dim) in shape.iter().zip(index.iter()).rev() {
        global_idx += idx_dim * multiplier;
        multiplier *= dim;
    }
    global_idx
}

#[test]
fn test_increment_index() {
    let mut index = vec![0, 0, 0];
    let dimensions = vec![2, 3, 2];
    let indices = vec![
        [0, 0, 1].to_vec(),
        [0, 1, 0].to_vec(),
        [0, 1, 1].to_vec(),
        [0, 2, 0].to_vec(),
        [0, 2, 1].to_vec(),
        [1, 0, 0].to_vec(),
        [1, 0, 1].to_vec(),
        [1, 1, 0].to_vec(),
        [1, 1, 1].to_vec(),
        [1, 2, 0].to_vec(),
        [1, 2, 1].to_vec(),
    ];
    for expected_idx in indices.into_iter() {
        let valid = increment_index(&mut index, &dimensions);
        assert!(valid);
        assert_eq!(index, expected_idx);
    }
    assert!(!increment_index(&mut index, &dimensions));
}

#[test]
fn test_index_iterator() {
    let index_iter = IndexIterator::new(vec![2, 2, 2]);
    assert_eq!(
        index_iter.collect::<Vec<_>>(),
        vec![
            [0, 0, 0].to_vec(),
            [0, 0, 1].to_vec(),
            [0, 1, 0].to_vec(),
            [0, 1, 1].to_vec(),
            [1, 0, 0].to_vec(),
            [1, 0, 1].to_vec(),
            [1, 1, 0].to_vec(),
            [1, 1, 1].to_vec(),
        ]
    );
}

#[test]
fn test_index_iterator_scalar_and_empty() {
    let scalar: Vec<_> = IndexIterator::new(vec![]).collect();
    assert_eq!(scalar, vec![Vec::<usize>::new()]);

    assert_eq!(IndexIterator::new(vec![3, 0, 2]).count(), 0);
}

#[test]
fn test_global_index_matches_iteration_order() {
    let shape = vec![3, 1, 4];
    for (flat, idx) in IndexIterator::new(shape.clone()).enumerate() {
        assert_eq!(global_index(&idx, &shape), flat);
    }
}
