// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Resolved tensor shapes.

use crate::TensorError;
use std::fmt;

/// Concrete dimensions of a tensor.
///
/// A `Shape` never contains placeholders: descriptor shapes with negative
/// (batch) dimensions must be resolved before they become a `Shape`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a new shape from the given dimensions.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// let s = Shape::new(vec![8, 3, 224, 224]);
    /// assert_eq!(s.rank(), 4);
    /// assert_eq!(s.num_elements(), 8 * 3 * 224 * 224);
    /// ```
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Creates a scalar shape (rank 0).
    pub fn scalar() -> Self {
        Self { dims: vec![] }
    }

    /// Converts signed descriptor dimensions, rejecting any negative entry.
    pub fn from_signed(dims: &[i64]) -> Result<Self, TensorError> {
        let mut out = Vec::with_capacity(dims.len());
        for (index, &d) in dims.iter().enumerate() {
            let d = usize::try_from(d).map_err(|_| TensorError::NegativeDimension {
                dims: dims.to_vec(),
                index,
            })?;
            out.push(d);
        }
        Ok(Self { dims: out })
    }

    /// Returns the number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the total number of elements (1 for a scalar).
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// Returns the dimensions as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the size of a specific dimension, or `None` if out of bounds.
    pub fn dim(&self, index: usize) -> Option<usize> {
        self.dims.get(index).copied()
    }

    /// Returns the dimensions as `i64`, the integer type IR attributes use.
    pub fn to_i64(&self) -> Vec<i64> {
        self.dims.iter().map(|&d| d as i64).collect()
    }

    /// Product of the dimensions in `range`; 1 for an empty range.
    pub fn product_of(&self, range: std::ops::Range<usize>) -> usize {
        self.dims[range].iter().product()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        if self.dims.len() == 1 {
            write!(f, ",")?;
        }
        write!(f, ")")
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims.to_vec())
    }
}
