//! Dense row-major n-dimensional array used for grid variable data.

use serde::{Deserialize, Serialize};

/// A dense, row-major n-dimensional array of `f64` values.
///
/// At most four logical axes (time, depth, latitude, longitude) appear in
/// practice, but the array itself is rank-agnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NdArray {
    shape: Vec<usize>,
    values: Vec<f64>,
}

impl NdArray {
    /// Create a new array from a shape and row-major values.
    ///
    /// # Panics
    /// Panics if `values.len()` disagrees with the element count of `shape`.
    pub fn new(shape: Vec<usize>, values: Vec<f64>) -> Self {
        assert_eq!(
            element_count(&shape),
            values.len(),
            "value count does not match shape"
        );
        Self { shape, values }
    }

    /// Create a rank-1 array from a value slice.
    pub fn vector(values: &[f64]) -> Self {
        Self {
            shape: vec![values.len()],
            values: values.to_vec(),
        }
    }

    /// Create an array filled with a constant value.
    pub fn filled(shape: Vec<usize>, value: f64) -> Self {
        let len = element_count(&shape);
        Self {
            shape,
            values: vec![value; len],
        }
    }

    /// The dimension sizes, outermost first.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// The number of dimensions.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// The total number of elements.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The raw row-major values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Mutable access to the raw row-major values.
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Convert a multi-index to a flat row-major offset.
    ///
    /// Returns `None` when the index rank disagrees with the array rank or
    /// any component is out of range.
    pub fn offset_of(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut offset = 0;
        for (&i, &dim) in index.iter().zip(self.shape.iter()) {
            if i >= dim {
                return None;
            }
            offset = offset * dim + i;
        }
        Some(offset)
    }

    /// Get the value at a multi-index.
    pub fn get(&self, index: &[usize]) -> Option<f64> {
        self.offset_of(index).map(|o| self.values[o])
    }

    /// Set the value at a multi-index.
    ///
    /// Returns `false` when the index is out of range.
    pub fn set(&mut self, index: &[usize], value: f64) -> bool {
        match self.offset_of(index) {
            Some(o) => {
                self.values[o] = value;
                true
            }
            None => false,
        }
    }

    /// Extract a hyper-rectangular slice as a new array.
    ///
    /// Returns `None` when `origin`/`shape` have the wrong rank or the
    /// requested region extends past the array bounds.
    pub fn slice(&self, origin: &[usize], shape: &[usize]) -> Option<NdArray> {
        if origin.len() != self.shape.len() || shape.len() != self.shape.len() {
            return None;
        }
        for ((&o, &s), &dim) in origin.iter().zip(shape.iter()).zip(self.shape.iter()) {
            if o + s > dim {
                return None;
            }
        }

        let len = element_count(shape);
        if len == 0 {
            return Some(NdArray::new(shape.to_vec(), Vec::new()));
        }
        let mut values = Vec::with_capacity(len);
        let mut index = origin.to_vec();
        loop {
            // offset_of cannot fail here: the region was bounds-checked above
            let offset = self.offset_of(&index)?;
            values.push(self.values[offset]);

            // odometer-style advance over the slice region, innermost fastest
            let mut axis = index.len();
            loop {
                if axis == 0 {
                    return Some(NdArray::new(shape.to_vec(), values));
                }
                axis -= 1;
                index[axis] += 1;
                if index[axis] < origin[axis] + shape[axis] {
                    break;
                }
                index[axis] = origin[axis];
            }
        }
    }
}

/// Total element count of a shape.
pub fn element_count(shape: &[usize]) -> usize {
    shape.iter().product()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexing() {
        let arr = NdArray::new(vec![2, 3], (0..6).map(|i| i as f64).collect());
        assert_eq!(arr.rank(), 2);
        assert_eq!(arr.len(), 6);
        assert_eq!(arr.get(&[0, 0]), Some(0.0));
        assert_eq!(arr.get(&[1, 2]), Some(5.0));
        assert_eq!(arr.get(&[2, 0]), None);
        assert_eq!(arr.get(&[0]), None);
    }

    #[test]
    fn test_set() {
        let mut arr = NdArray::filled(vec![2, 2], 0.0);
        assert!(arr.set(&[1, 1], 42.0));
        assert_eq!(arr.get(&[1, 1]), Some(42.0));
        assert!(!arr.set(&[2, 0], 1.0));
    }

    #[test]
    fn test_slice_interior() {
        let arr = NdArray::new(vec![3, 4], (0..12).map(|i| i as f64).collect());
        let sub = arr.slice(&[1, 1], &[2, 2]).unwrap();
        assert_eq!(sub.shape(), &[2, 2]);
        assert_eq!(sub.values(), &[5.0, 6.0, 9.0, 10.0]);
    }

    #[test]
    fn test_slice_single_cell() {
        let arr = NdArray::new(vec![2, 2, 2], (0..8).map(|i| i as f64).collect());
        let cell = arr.slice(&[1, 0, 1], &[1, 1, 1]).unwrap();
        assert_eq!(cell.values(), &[5.0]);
    }

    #[test]
    fn test_slice_out_of_bounds() {
        let arr = NdArray::new(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]);
        assert!(arr.slice(&[1, 1], &[2, 1]).is_none());
        assert!(arr.slice(&[0], &[1]).is_none());
    }

    #[test]
    fn test_element_count() {
        assert_eq!(element_count(&[2, 3, 4]), 24);
        assert_eq!(element_count(&[]), 1);
    }
}
